//! Domain layer: pure billing logic with no I/O.

pub mod billing;
pub mod foundation;
