mod app;
pub mod components;
pub mod consts;
pub mod demo;
pub mod editor;
pub mod scene;
pub mod selection;
pub mod transform;
pub mod types;
pub mod utils;
pub mod viewport;

use app::App;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn run_app() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
