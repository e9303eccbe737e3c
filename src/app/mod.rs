//! Session ownership and the drivers around it

pub mod console;
pub mod runner;
pub mod session;

pub use session::{ConnectionStatus, Selection, Session};
