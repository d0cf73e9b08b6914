//! Ultraviolet device facade
//!
//! The aggregate the host daemon talks to: construction resolves and opens
//! the kernel node and loads calibration, after which the daemon drives the
//! device through enable/disable, interval control, readiness reads, and
//! sample fetches. Single-threaded by contract - the daemon serializes all
//! calls into one device instance.

use std::fs::File;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::io::{AsRawFd, RawFd};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{CalibrationProfile, ConfigStore};
use crate::constants::{event_type, uv};
use crate::error::{HalError, Result};
use crate::events;
use crate::node::{self, AccessMethod, NodeInfo, NodeQuery, NodeRoots};

const EVIOCSCLKID: libc::c_ulong = 0x4004_45a0;

/// Reported sample accuracy. This device class always reports `Good`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Undefined,
    Bad,
    Normal,
    Good,
}

/// One calibrated reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Bias-adjusted raw magnitude as held by the device.
    pub raw: i32,
    /// `raw` scaled by the calibration unit.
    pub value: f64,
    /// Hardware clock time of the burst's SYN marker, microseconds.
    pub timestamp_us: u64,
    pub accuracy: Accuracy,
}

/// Static metadata record handed to the daemon.
///
/// Built fresh per call from the device's own calibration state, so several
/// device instances of different sensor classes never alias each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDescriptor {
    pub id: u32,
    pub name: String,
    pub category: u32,
    pub event_type: u32,
    pub model_name: String,
    pub vendor: String,
    pub min_range: f64,
    pub max_range: f64,
    pub resolution: f64,
    pub min_interval_ms: u64,
    pub max_batch_count: u32,
    pub wakeup_supported: bool,
}

/// An open ultraviolet sensor device.
pub struct UvDevice {
    node_handle: File,
    info: NodeInfo,
    calibration: CalibrationProfile,
    polling_interval_ms: u64,
    sensorhub_controlled: bool,
    ultraviolet_raw: i32,
    fired_time_us: u64,
}

impl UvDevice {
    /// Open the UV device on the live system.
    ///
    /// Resolution, calibration load, node open, and clock setup are
    /// all-or-nothing; any failure leaves no partially usable device and is
    /// permanent for the daemon's lifetime.
    pub fn open(config: &dyn ConfigStore) -> Result<UvDevice> {
        Self::open_with(&NodeRoots::default(), config)
    }

    /// Open the UV device against explicit filesystem roots.
    pub fn open_with(roots: &NodeRoots, config: &dyn ConfigStore) -> Result<UvDevice> {
        let sensorhub_controlled =
            node::is_sensorhub_controlled_at(roots, uv::SENSORHUB_POLL_NODE);

        let query = NodeQuery {
            sensorhub_controlled,
            sensor_type: uv::SENSOR_TYPE,
            key: uv::INPUT_KEY,
            iio_enable_node_name: uv::IIO_ENABLE_NODE,
            sensorhub_interval_node_name: uv::SENSORHUB_POLL_NODE,
        };
        let info = node::get_node_info_at(roots, &query)?;

        if info.method != AccessMethod::InputEvent {
            return Err(HalError::UnsupportedMethod {
                method: info.method,
            });
        }

        let calibration = CalibrationProfile::load(config, uv::SENSOR_TYPE, &info.model_id)?;

        let node_handle = File::open(&info.data_node_path).map_err(|e| {
            error!(path = ?info.data_node_path, error = %e, "UV data node open failed");
            HalError::NoSuchDevice {
                sensor_type: uv::SENSOR_TYPE.to_string(),
                key: uv::INPUT_KEY.to_string(),
            }
        })?;

        // The clock ioctl only applies to evdev character devices.
        if node_handle.metadata()?.file_type().is_char_device()
            && !set_monotonic_clock(&node_handle)
        {
            return Err(HalError::ClockModeUnsupported {
                path: info.data_node_path.clone(),
            });
        }

        info!(
            model = %info.model_id,
            sensorhub = sensorhub_controlled,
            "UV device created"
        );

        Ok(UvDevice {
            node_handle,
            info,
            calibration,
            polling_interval_ms: uv::DEFAULT_INTERVAL_MS,
            sensorhub_controlled,
            ultraviolet_raw: 0,
            fired_time_us: 0,
        })
    }

    /// Readable handle for the host's event loop to multiplex on.
    pub fn poll_descriptor(&self) -> RawFd {
        self.node_handle.as_raw_fd()
    }

    /// Metadata record for the daemon, derived from current calibration.
    pub fn describe(&self) -> SensorDescriptor {
        SensorDescriptor {
            id: uv::SENSOR_ID,
            name: uv::SENSOR_NAME.to_string(),
            category: uv::DEVICE_CATEGORY,
            event_type: (uv::DEVICE_CATEGORY << event_type::SENSOR_EVENT_SHIFT)
                | event_type::RAW_DATA_EVENT,
            model_name: self.calibration.chip_name.clone(),
            vendor: self.calibration.vendor.clone(),
            min_range: self.calibration.min_range,
            max_range: self.calibration.max_range,
            resolution: self.calibration.raw_data_unit,
            min_interval_ms: uv::MIN_INTERVAL_MS,
            max_batch_count: 0,
            wakeup_supported: false,
        }
    }

    /// Start sampling. Best-effort: an enable-node write failure is logged
    /// but not surfaced. Applies the current polling interval and resets the
    /// fired time so the next read carries a fresh timestamp.
    pub fn enable(&mut self, id: u32) -> bool {
        if let Err(e) = node::set_enable_node(
            &self.info.enable_node_path,
            self.sensorhub_controlled,
            true,
            uv::SENSORHUB_SLOT,
        ) {
            warn!(error = %e, "Enable node write failed");
        }
        let _ = self.set_interval(id, self.polling_interval_ms);

        self.fired_time_us = 0;
        info!(id, "UV sensor enabled");
        true
    }

    /// Stop sampling. Same best-effort semantics as [`enable`](Self::enable).
    pub fn disable(&mut self, id: u32) -> bool {
        if let Err(e) = node::set_enable_node(
            &self.info.enable_node_path,
            self.sensorhub_controlled,
            false,
            uv::SENSORHUB_SLOT,
        ) {
            warn!(error = %e, "Disable node write failed");
        }

        info!(id, "UV sensor disabled");
        true
    }

    /// Change the polling interval. The node takes nanoseconds; a failed
    /// write leaves the previous interval in effect.
    pub fn set_interval(&mut self, _id: u32, interval_ms: u64) -> Result<()> {
        let interval_ns = interval_ms.saturating_mul(1_000_000);
        node::write_node(&self.info.interval_node_path, interval_ns)?;

        info!(
            from_ms = self.polling_interval_ms,
            to_ms = interval_ms,
            "Polling interval changed"
        );
        self.polling_interval_ms = interval_ms;
        Ok(())
    }

    /// Currently applied polling interval in milliseconds.
    pub fn polling_interval_ms(&self) -> u64 {
        self.polling_interval_ms
    }

    /// Consume one burst from the data node and commit it.
    ///
    /// On failure the held sample state is untouched and the caller should
    /// retry on the next readiness signal. On success the single sensor's id
    /// is reported as the one ready event source.
    pub fn read_ready_ids(&mut self) -> Result<Vec<u32>> {
        let burst = events::read_burst(&mut self.node_handle)?;

        // No magnitude in this burst keeps the previously held value
        if let Some(raw) = burst.magnitude {
            self.ultraviolet_raw = raw;
        }
        self.fired_time_us = burst.fired_time_us;

        debug!(
            raw = self.ultraviolet_raw,
            fired_time_us = self.fired_time_us,
            "UV sample committed"
        );
        Ok(vec![uv::SENSOR_ID])
    }

    /// Build a calibrated sample from the held raw magnitude and fired time.
    pub fn fetch_sample(&self, _id: u32) -> Sample {
        Sample {
            raw: self.ultraviolet_raw,
            value: self.calibration.raw_to_base(self.ultraviolet_raw),
            timestamp_us: self.fired_time_us,
            accuracy: Accuracy::Good,
        }
    }
}

/// Switch the evdev node's event timestamps to the monotonic clock.
fn set_monotonic_clock(node: &File) -> bool {
    let clockid: libc::c_int = libc::CLOCK_MONOTONIC;
    // SAFETY: the fd is owned by `node` and stays open across the call; the
    // ioctl only reads the clock id.
    let rc = unsafe { libc::ioctl(node.as_raw_fd(), EVIOCSCLKID, &clockid) };
    rc == 0
}
