//! Ultraviolet sensor HAL plugin
//!
//! Hardware abstraction for an ambient ultraviolet-light sensor inside a
//! larger sensor-daemon framework.
//!
//! # Features
//!
//! - **Node Resolution**: Locates the kernel device node through the input
//!   subsystem (with an IIO fallback), including sensor-hub-controlled setups
//! - **Calibration**: Per-model vendor, range, and raw-to-base unit constants
//!   loaded from the daemon's JSON configuration store
//! - **Event Pipeline**: Assembles bursts of raw input-event records into one
//!   coherent sample, committed at the SYN boundary
//! - **Control Surface**: Enable/disable, polling-interval control, poll-fd
//!   accessor, and calibrated sample fetches for the owning daemon
//!
//! # Module Structure
//!
//! - `node` - device node discovery and control-node writes
//! - `config` - calibration store access
//! - `events` - raw event reading and sample assembly
//! - `device` - the facade the daemon drives
//!
//! # Example
//!
//! ```no_run
//! use uvhal::{SensorConfig, UvDevice};
//!
//! let config = SensorConfig::load_default().unwrap();
//! let mut device = UvDevice::open(&config).unwrap();
//! device.enable(device.describe().id);
//! ```

pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod events;
pub mod node;

pub use config::{CalibrationProfile, ConfigStore, SensorConfig};
pub use device::{Accuracy, Sample, SensorDescriptor, UvDevice};
pub use error::{HalError, Result};
pub use events::{read_burst, RawBurst};
pub use node::{AccessMethod, NodeInfo, NodeQuery, NodeRoots};
