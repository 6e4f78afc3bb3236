// harvia-core: device model and sauna actions between harvia-api and the CLI.

pub mod actions;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod queries;

// ── Primary re-exports ──────────────────────────────────────────────
pub use actions::{Ack, ActionResponse, Actions, Change};
pub use config::{ControllerConfig, ListingPolicy};
pub use controller::Controller;
pub use error::{CoreError, ErrorKind};
pub use model::{DeviceListing, DeviceRecord, DoorState, SaunaStatus, SkippedDevice, Switch};
