mod graph;
mod layer;
mod node;
mod types;

pub use graph::*;
pub use layer::*;
pub use node::*;
pub use types::*;
