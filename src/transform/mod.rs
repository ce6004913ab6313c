mod bounds;
mod config;
mod engine;
mod gesture;
mod proxy;
mod rotation;
mod scheduler;
mod session;

pub use bounds::*;
pub use config::*;
pub use engine::*;
pub use gesture::*;
pub use proxy::*;
pub use rotation::*;
pub use scheduler::*;
pub use session::*;
