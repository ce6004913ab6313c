use crate::consts::LINE_HEIGHT;
use crate::scene::{LayerDescriptor, LayerId, RenderPayload, SceneNode, ShapeKind, Stroke, StrokeMode, TextItem};
use crate::viewport::Viewport;
use glam::DAffine2;
use yew::prelude::*;

/// What the stage paints for one mounted node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
    pub id: LayerId,
    /// SVG `matrix(...)` of the node's absolute transform
    pub matrix: String,
    pub payload: RenderPayload,
    pub texts: Vec<TextItem>,
    pub strokes: Vec<Stroke>,
    pub visible: bool,
}

impl NodeView {
    /// Geometry and text come from the live node, paint from the layer
    pub fn new(node: &SceneNode, layer: &LayerDescriptor) -> Self {
        Self {
            id: node.id,
            matrix: svg_matrix(node.absolute_transform()),
            payload: layer.payload.clone(),
            texts: node.texts.clone(),
            strokes: layer.strokes.clone(),
            visible: node.visible,
        }
    }
}

fn svg_matrix(m: DAffine2) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        m.matrix2.x_axis.x, m.matrix2.x_axis.y, m.matrix2.y_axis.x, m.matrix2.y_axis.y, m.translation.x, m.translation.y
    )
}

#[derive(Properties, Clone, PartialEq)]
pub struct StageProps {
    /// Nodes in paint order
    pub nodes: Vec<NodeView>,

    #[prop_or_default]
    pub viewport: Viewport,

    #[prop_or(800.0)]
    pub width: f64,

    #[prop_or(600.0)]
    pub height: f64,

    #[prop_or("default")]
    pub cursor: &'static str,

    #[prop_or_default]
    pub svg_ref: NodeRef,

    #[prop_or_default]
    pub onpointerdown: Callback<PointerEvent>,

    #[prop_or_default]
    pub onpointermove: Callback<PointerEvent>,

    #[prop_or_default]
    pub onpointerup: Callback<PointerEvent>,

    #[prop_or_default]
    pub onpointercancel: Callback<PointerEvent>,
}

fn render_payload(payload: &RenderPayload) -> Html {
    match payload {
        RenderPayload::Shape {
            kind: ShapeKind::Rect,
            width,
            height,
            fill,
        } => html! {
            <rect width={width.to_string()} height={height.to_string()} fill={fill.clone()} />
        },
        RenderPayload::Shape {
            kind: ShapeKind::Ellipse,
            width,
            height,
            fill,
        } => html! {
            <ellipse
                cx={(width / 2.0).to_string()}
                cy={(height / 2.0).to_string()}
                rx={(width / 2.0).to_string()}
                ry={(height / 2.0).to_string()}
                fill={fill.clone()}
            />
        },
        RenderPayload::Image { src, width, height } => html! {
            <image href={src.clone()} width={width.to_string()} height={height.to_string()} />
        },
        RenderPayload::Empty => html! {},
    }
}

fn render_stroke(stroke: &Stroke) -> Html {
    let points = stroke
        .point_pairs()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    let color = match stroke.mode {
        StrokeMode::Erase => "white".to_string(),
        StrokeMode::Draw | StrokeMode::Paint => stroke.color.clone(),
    };
    html! {
        <polyline
            key={stroke.id.to_string()}
            points={points}
            fill="none"
            stroke={color}
            stroke-width={stroke.size.to_string()}
            stroke-opacity={stroke.opacity.to_string()}
            stroke-linecap="round"
            stroke-linejoin="round"
        />
    }
}

fn render_text(item: &TextItem) -> Html {
    let lines: Html = item
        .text
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            html! {
                <tspan x={item.offset.x.to_string()} dy={if i == 0 { "0".to_string() } else { (item.font_size * LINE_HEIGHT).to_string() }}>
                    {line}
                </tspan>
            }
        })
        .collect();
    html! {
        <text
            key={item.id.to_string()}
            x={item.offset.x.to_string()}
            y={item.offset.y.to_string()}
            font-size={item.font_size.to_string()}
            font-family={item.font_family.clone()}
            font-style={item.font_style.clone()}
            font-weight={item.font_weight.clone()}
            fill={item.fill.clone()}
            dominant-baseline="hanging"
            style="user-select: none;"
        >
            {lines}
        </text>
    }
}

/// SVG rendering of the mounted scene. Receives every pointer event on the
/// stage and hands it to the app.
#[function_component(Stage)]
pub fn stage(props: &StageProps) -> Html {
    let viewport = props.viewport;

    let layers: Html = props
        .nodes
        .iter()
        .filter(|node| node.visible)
        .map(|node| {
            let strokes: Html = node.strokes.iter().map(render_stroke).collect();
            let texts: Html = node.texts.iter().map(render_text).collect();
            html! {
                <g key={node.id.to_string()} transform={node.matrix.clone()}>
                    {render_payload(&node.payload)}
                    {strokes}
                    {texts}
                </g>
            }
        })
        .collect();

    html! {
        <svg
            ref={props.svg_ref.clone()}
            style={format!("position: absolute; top: 0; left: 0; background: #ffffff; touch-action: none; cursor: {};", props.cursor)}
            width={format!("{}", props.width)}
            height={format!("{}", props.height)}
            viewBox={format!("0 0 {} {}", props.width, props.height)}
            onpointerdown={props.onpointerdown.clone()}
            onpointermove={props.onpointermove.clone()}
            onpointerup={props.onpointerup.clone()}
            onpointercancel={props.onpointercancel.clone()}
        >
            <g transform={format!("translate({} {}) scale({})", viewport.pan.x, viewport.pan.y, viewport.zoom)}>
                {layers}
            </g>
        </svg>
    }
}
