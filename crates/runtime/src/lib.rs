pub mod config;
pub mod controller;
pub mod event_bus;
pub mod surface;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use config::*;
pub use controller::*;
pub use event_bus::*;
pub use surface::*;
pub use sync::*;
