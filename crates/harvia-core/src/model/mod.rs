// ── Domain model ──

pub mod device;
pub(crate) mod lenient;
pub mod status;
pub mod tree;

pub use device::{DeviceListing, DeviceRecord, SkippedDevice};
pub use status::{DoorState, SaunaStatus, Switch};
