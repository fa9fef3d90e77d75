mod actuator;
mod auth;
mod sensor;
mod setting;
mod system;

pub use actuator::*;
pub use auth::*;
pub use sensor::*;
pub use setting::*;
pub use system::*;

pub type Id = i32;
