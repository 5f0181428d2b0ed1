//! The controller actor and the state it owns.

mod service;
mod state;

pub use service::PosService;
pub use state::AppState;
