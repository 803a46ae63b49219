pub mod codec;
pub mod frame;
pub mod model;

pub use codec::{decode, encode, SchemaError};
pub use frame::{WireFrame, SERVO_COUNT};
pub use model::{ConfigModel, PidConfig};
