pub mod bridge;
pub mod slices;
pub mod store;

pub use bridge::*;
pub use slices::*;
pub use store::*;
