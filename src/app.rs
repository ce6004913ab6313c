use gloo::events::EventListener;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use web_sys::{Element, KeyboardEvent};
use yew::prelude::*;

use crate::components::{NodeView, RafClock, Stage, TransformOverlay};
use crate::consts::{STAGE_HEIGHT, STAGE_WIDTH};
use crate::demo::demo_document;
use crate::editor::Editor;
use crate::scene::{DVec2, LayerDocument, LayerStore};
use crate::transform::EngineConfig;
use crate::types::{Action, Button, Modifiers, PointerInput, Tool};
use crate::viewport::Viewport;

type SharedEditor = Rc<RefCell<Editor>>;

/// Editor over the demo document, driven by animation frames.
/// `on_change` fires after every frame that ran deferred work.
fn create_editor(on_change: Callback<()>) -> SharedEditor {
    let document = demo_document().unwrap_or_else(|err| {
        log::warn!("demo document failed to load: {err}");
        LayerDocument::new()
    });
    Rc::new_cyclic(|weak: &Weak<RefCell<Editor>>| {
        let weak = weak.clone();
        let clock = RafClock::new(move || {
            let Some(editor) = weak.upgrade() else {
                return;
            };
            if let Ok(mut editor) = editor.try_borrow_mut() {
                editor.on_frame();
            }
            on_change.emit(());
        });
        let config = EngineConfig::default().with_rotate_snap(15.0);
        RefCell::new(Editor::with_clock(document, config, Box::new(clock)))
    })
}

/// Stage-relative pointer input; the stage's top-left is the client origin
fn pointer_input(event: &PointerEvent, svg_ref: &NodeRef) -> PointerInput {
    let origin = svg_ref
        .cast::<Element>()
        .map(|svg| {
            let rect = svg.get_bounding_client_rect();
            DVec2::new(rect.left(), rect.top())
        })
        .unwrap_or(DVec2::ZERO);
    PointerInput {
        pointer_id: event.pointer_id(),
        client: DVec2::new(event.client_x() as f64, event.client_y() as f64) - origin,
        button: Button::from_dom(event.button()),
        modifiers: Modifiers {
            shift: event.shift_key(),
            ctrl: event.ctrl_key(),
            alt: event.alt_key(),
            meta: event.meta_key(),
        },
    }
}

/// Carry out engine actions. Pointer capture is best-effort.
fn perform(actions: Vec<Action>, svg_ref: &NodeRef, cursor: &UseStateHandle<&'static str>, render: &Callback<()>) {
    let mut needs_render = false;
    for action in actions {
        match action {
            Action::CapturePointer(id) => {
                if let Some(svg) = svg_ref.cast::<Element>() {
                    if let Err(err) = svg.set_pointer_capture(id) {
                        log::debug!("pointer capture failed: {err:?}");
                    }
                }
            }
            Action::ReleasePointer(id) => {
                if let Some(svg) = svg_ref.cast::<Element>() {
                    if let Err(err) = svg.release_pointer_capture(id) {
                        log::debug!("pointer release failed: {err:?}");
                    }
                }
            }
            Action::SetCursor(value) => cursor.set(value),
            Action::RenderNeeded => needs_render = true,
        }
    }
    if needs_render {
        render.emit(());
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let force_update = use_force_update();
    let render = Callback::from(move |_: ()| force_update.force_update());
    let editor = {
        let render = render.clone();
        use_state(move || create_editor(render))
    };
    let svg_ref = use_node_ref();
    let cursor = use_state(|| "default");

    // Escape cancels the gesture in progress, Cmd/Ctrl+A selects everything
    {
        let editor = (*editor).clone();
        let render = render.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window().expect("no window");
            let document = window.document().expect("no document");

            let listener = EventListener::new(&document, "keydown", move |event| {
                let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                match keyboard_event.key().as_str() {
                    "Escape" => {
                        editor.borrow_mut().cancel_gesture();
                        render.emit(());
                    }
                    "a" if keyboard_event.meta_key() || keyboard_event.ctrl_key() => {
                        keyboard_event.prevent_default();
                        editor.borrow_mut().select_all();
                        render.emit(());
                    }
                    _ => {}
                }
            });

            move || drop(listener)
        });
    }

    // Everything painted this render is clean
    {
        let editor = (*editor).clone();
        use_effect(move || {
            editor.borrow_mut().clear_dirty();
            || ()
        });
    }

    let pointer_handler = |dispatch: fn(&mut Editor, PointerInput) -> Vec<Action>| {
        let editor = (*editor).clone();
        let svg_ref = svg_ref.clone();
        let cursor = cursor.clone();
        let render = render.clone();
        Callback::from(move |event: PointerEvent| {
            let input = pointer_input(&event, &svg_ref);
            let actions = dispatch(&mut editor.borrow_mut(), input);
            perform(actions, &svg_ref, &cursor, &render);
        })
    };
    let onpointerdown = pointer_handler(Editor::pointer_down);
    let onpointermove = pointer_handler(Editor::pointer_move);
    let onpointerup = pointer_handler(Editor::pointer_up);
    let onpointercancel = pointer_handler(|editor, _| editor.cancel_gesture());

    let tool_button = |tool: Tool, label: &'static str| {
        let editor = (*editor).clone();
        let render = render.clone();
        let active = editor.borrow().engine().tool() == tool;
        let onclick = Callback::from(move |_: MouseEvent| {
            editor.borrow_mut().set_tool(tool);
            render.emit(());
        });
        html! {
            <button class={classes!(active.then_some("active"))} {onclick}>{label}</button>
        }
    };

    let zoom_button = |factor: f64, label: &'static str| {
        let editor = (*editor).clone();
        let render = render.clone();
        let onclick = Callback::from(move |_: MouseEvent| {
            let mut editor = editor.borrow_mut();
            let current = *editor.viewport();
            editor.set_viewport(Viewport::new(current.pan, current.zoom * factor));
            render.emit(());
        });
        html! { <button {onclick}>{label}</button> }
    };

    let ed = editor.borrow();
    let nodes: Vec<NodeView> = ed
        .scene()
        .nodes()
        .iter()
        .filter_map(|node| ed.document().layer(node.id).map(|layer| NodeView::new(node, layer)))
        .collect();
    let proxy = ed.proxy().copied();
    let bounds = ed.bounds();
    let viewport = *ed.viewport();
    let status = match bounds {
        Some(b) => format!(
            "{} selected · {:.0} × {:.0} at ({:.0}, {:.0})",
            ed.selection().len(),
            b.width,
            b.height,
            b.x,
            b.y
        ),
        None => "Nothing selected".to_string(),
    };
    drop(ed);

    html! {
        <div style="font-family: sans-serif; padding: 16px;">
            <div style="display: flex; gap: 8px; margin-bottom: 8px; align-items: center;">
                {tool_button(Tool::Select, "Select")}
                {tool_button(Tool::Pan, "Pan")}
                {zoom_button(0.8, "−")}
                {zoom_button(1.25, "+")}
                <span style="color: #666; font-size: 13px;">{status}</span>
            </div>
            <div style={format!("position: relative; width: {}px; height: {}px; border: 1px solid #ddd;", STAGE_WIDTH, STAGE_HEIGHT)}>
                <Stage
                    nodes={nodes}
                    viewport={viewport}
                    width={STAGE_WIDTH}
                    height={STAGE_HEIGHT}
                    cursor={*cursor}
                    svg_ref={svg_ref.clone()}
                    {onpointerdown}
                    {onpointermove}
                    {onpointerup}
                    {onpointercancel}
                />
                <TransformOverlay
                    proxy={proxy}
                    bounds={bounds}
                    viewport={viewport}
                    width={STAGE_WIDTH}
                    height={STAGE_HEIGHT}
                />
            </div>
        </div>
    }
}
