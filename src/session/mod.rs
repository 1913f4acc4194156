//! Focus sessions — the core entity and its lifecycle controller.

pub mod controller;
pub mod model;

pub use controller::{SessionController, SessionSignal};
pub use model::{JournalReflection, UserSession};
