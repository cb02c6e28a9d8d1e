#[macro_use]
mod macros;

pub mod angle;
pub mod energy;
pub mod irradiance;
pub mod length;
pub mod power;
pub mod speed;
pub mod temperature;
pub mod time;
mod zero;

pub use self::zero::Zero;
