use crate::consts::{HANDLE_SIZE_CORNER, HANDLE_SIZE_EDGE};
use crate::scene::DVec2;
use crate::transform::ProxyNode;
use crate::types::{Bounds, HandleName};
use crate::viewport::Viewport;
use yew::prelude::*;

/// Props for the manipulation overlay
#[derive(Properties, Clone, PartialEq)]
pub struct OverlayProps {
    /// Oriented proxy the handles attach to
    #[prop_or_default]
    pub proxy: Option<ProxyNode>,

    /// Published union bounds of the selection
    #[prop_or_default]
    pub bounds: Option<Bounds>,

    #[prop_or_default]
    pub viewport: Viewport,

    #[prop_or(800.0)]
    pub width: f64,

    #[prop_or(600.0)]
    pub height: f64,
}

fn points_attr(points: &[DVec2]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// SVG overlay for the proxy outline, resize handles and rotate handle.
/// Drawn in client pixels so handles keep their size at any zoom; hit
/// testing happens in the editor, so nothing here takes pointer events.
#[function_component(TransformOverlay)]
pub fn transform_overlay(props: &OverlayProps) -> Html {
    let viewport = props.viewport;

    let bounds_element = if let Some(bounds) = &props.bounds {
        let min = viewport.stage_to_client(bounds.min());
        let max = viewport.stage_to_client(bounds.max());
        html! {
            <rect
                x={format!("{}", min.x)}
                y={format!("{}", min.y)}
                width={format!("{}", max.x - min.x)}
                height={format!("{}", max.y - min.y)}
                fill="none"
                stroke="#0d99ff"
                stroke-width="1"
                stroke-dasharray="2,2"
                opacity="0.5"
            />
        }
    } else {
        html! {}
    };

    let proxy_elements = if let Some(proxy) = &props.proxy {
        let corners = proxy.corners().map(|c| viewport.stage_to_client(c));
        let top = viewport.stage_to_client(proxy.handle_position(HandleName::Top));
        let grip = viewport.stage_to_client(proxy.rotate_handle_position(viewport.zoom));

        let handles: Html = HandleName::ALL
            .iter()
            .map(|handle| {
                let pos = viewport.stage_to_client(proxy.handle_position(*handle));
                let size = if handle.is_corner() {
                    HANDLE_SIZE_CORNER
                } else {
                    HANDLE_SIZE_EDGE
                };
                let half = size / 2.0;
                html! {
                    <rect
                        key={handle.to_kebab_case()}
                        x={format!("{}", pos.x - half)}
                        y={format!("{}", pos.y - half)}
                        width={format!("{}", size)}
                        height={format!("{}", size)}
                        transform={format!("rotate({} {} {})", proxy.rotation, pos.x, pos.y)}
                        fill="white"
                        stroke="#0d99ff"
                        stroke-width="1"
                    />
                }
            })
            .collect();

        html! {
            <>
                <polygon
                    points={points_attr(&corners)}
                    fill="none"
                    stroke="#0d99ff"
                    stroke-width="1"
                />
                <line
                    x1={format!("{}", top.x)}
                    y1={format!("{}", top.y)}
                    x2={format!("{}", grip.x)}
                    y2={format!("{}", grip.y)}
                    stroke="#0d99ff"
                    stroke-width="1"
                />
                <circle
                    cx={format!("{}", grip.x)}
                    cy={format!("{}", grip.y)}
                    r={format!("{}", HANDLE_SIZE_CORNER / 2.0)}
                    fill="white"
                    stroke="#0d99ff"
                    stroke-width="1"
                />
                {handles}
            </>
        }
    } else {
        html! {}
    };

    html! {
        <svg
            style="position: absolute; top: 0; left: 0; z-index: 10; pointer-events: none;"
            width={format!("{}", props.width)}
            height={format!("{}", props.height)}
            viewBox={format!("0 0 {} {}", props.width, props.height)}
        >
            {bounds_element}
            {proxy_elements}
        </svg>
    }
}
