pub mod building;
pub mod entity;
pub mod label;
pub mod matching;
pub mod units;

pub use building::*;
pub use entity::*;
pub use label::*;
pub use units::*;
