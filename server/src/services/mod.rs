//! Service layer: pure state operations called by the route handlers.

pub mod cells;
pub mod presence;
