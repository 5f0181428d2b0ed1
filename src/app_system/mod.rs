//! System orchestration, startup, and shutdown logic.

pub mod logging;
pub mod pos_system;

pub use logging::*;
pub use pos_system::*;
