//! Device node resolution
//!
//! Locates the kernel nodes backing the sensor: the readable data node, the
//! writable enable node, and the writable interval node. Resolution walks
//! `/sys/class/input` first (input-event method); if nothing matches there,
//! the IIO bus is scanned as a fallback. All probing is read-only.
//!
//! A device may be *sensor-hub controlled*: its sampling and enable state are
//! mediated by an auxiliary co-processor. In that mode the control nodes live
//! under the hub's sysfs directory rather than next to the input device.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::constants::paths;
use crate::error::{HalError, Result};

/// How raw samples are obtained from the resolved data node.
///
/// Chosen once at construction and stored as a tagged variant; only
/// `InputEvent` has an implemented read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethod {
    /// Fixed-size input-event records from a `/dev/input/eventN` node.
    InputEvent,
    /// IIO buffer access. Resolved for completeness, rejected at open.
    Iio,
}

/// Filesystem roots probed during resolution.
///
/// `Default` points at the live system; tests aim the resolver at a
/// tempfile-backed tree instead.
#[derive(Debug, Clone)]
pub struct NodeRoots {
    pub input_class: PathBuf,
    pub iio_bus: PathBuf,
    pub dev_input: PathBuf,
    pub sensorhub: PathBuf,
}

impl Default for NodeRoots {
    fn default() -> Self {
        NodeRoots {
            input_class: PathBuf::from(paths::INPUT_CLASS_BASE),
            iio_bus: PathBuf::from(paths::IIO_BUS_BASE),
            dev_input: PathBuf::from(paths::DEV_INPUT_BASE),
            sensorhub: PathBuf::from(paths::SENSORHUB_BASE),
        }
    }
}

/// Parameters of one resolution request.
#[derive(Debug, Clone)]
pub struct NodeQuery<'a> {
    pub sensorhub_controlled: bool,
    pub sensor_type: &'a str,
    /// Device name to match against each candidate's `name` attribute.
    pub key: &'a str,
    /// Enable-node name used when the device lacks a plain `enable` attribute.
    pub iio_enable_node_name: &'a str,
    /// Interval node name below the hub directory, for hub-controlled devices.
    pub sensorhub_interval_node_name: &'a str,
}

/// Resolved node paths. Immutable once returned.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub method: AccessMethod,
    /// The device's reported name, used as the calibration model id.
    pub model_id: String,
    pub data_node_path: PathBuf,
    pub enable_node_path: PathBuf,
    pub interval_node_path: PathBuf,
}

/// Whether the sensor sits behind the sensor hub.
///
/// True when the hub's control directory exposes the sensor's interval node.
pub fn is_sensorhub_controlled(interval_node_name: &str) -> bool {
    is_sensorhub_controlled_at(&NodeRoots::default(), interval_node_name)
}

pub fn is_sensorhub_controlled_at(roots: &NodeRoots, interval_node_name: &str) -> bool {
    roots.sensorhub.join(interval_node_name).exists()
}

/// Resolve the node paths for `query` against the live system.
pub fn get_node_info(query: &NodeQuery) -> Result<NodeInfo> {
    get_node_info_at(&NodeRoots::default(), query)
}

/// Resolve the node paths for `query` against explicit roots.
///
/// Fails fast with `NoSuchDevice` when no candidate matches; there is no
/// retry at this layer.
pub fn get_node_info_at(roots: &NodeRoots, query: &NodeQuery) -> Result<NodeInfo> {
    if let Some(info) = find_input_device(roots, query) {
        debug!(
            model = %info.model_id,
            data = ?info.data_node_path,
            enable = ?info.enable_node_path,
            interval = ?info.interval_node_path,
            "Resolved input-event device"
        );
        return Ok(info);
    }

    if let Some(info) = find_iio_device(roots, query) {
        debug!(model = %info.model_id, data = ?info.data_node_path, "Resolved IIO device");
        return Ok(info);
    }

    Err(HalError::NoSuchDevice {
        sensor_type: query.sensor_type.to_string(),
        key: query.key.to_string(),
    })
}

fn find_input_device(roots: &NodeRoots, query: &NodeQuery) -> Option<NodeInfo> {
    let entries = fs::read_dir(&roots.input_class).ok()?;

    for ent in entries.flatten() {
        let dir = ent.path();
        let tag = dir.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if !tag.starts_with("input") || !dir.is_dir() {
            continue;
        }

        let name = match read_trimmed(&dir.join("name")) {
            Ok(n) => n,
            Err(_) => continue,
        };
        trace!(dir = ?dir, name = %name, "Checking input device");
        if name != query.key {
            continue;
        }

        // The matched input device must expose an eventN child for its
        // readable node under /dev/input.
        let Some(event_tag) = find_event_child(&dir) else {
            warn!(dir = ?dir, "Input device matched but has no event node");
            continue;
        };

        let (enable, interval) = if query.sensorhub_controlled {
            (
                roots.sensorhub.join("enable"),
                roots.sensorhub.join(query.sensorhub_interval_node_name),
            )
        } else {
            let plain = dir.join("enable");
            let enable = if plain.exists() {
                plain
            } else {
                dir.join(query.iio_enable_node_name)
            };
            (enable, dir.join(paths::POLL_DELAY_NODE))
        };

        return Some(NodeInfo {
            method: AccessMethod::InputEvent,
            model_id: name,
            data_node_path: roots.dev_input.join(event_tag),
            enable_node_path: enable,
            interval_node_path: interval,
        });
    }

    None
}

fn find_event_child(input_dir: &Path) -> Option<String> {
    let entries = fs::read_dir(input_dir).ok()?;
    for ent in entries.flatten() {
        let tag = ent.file_name();
        let tag = tag.to_string_lossy();
        if tag.starts_with("event") {
            return Some(tag.into_owned());
        }
    }
    None
}

fn find_iio_device(roots: &NodeRoots, query: &NodeQuery) -> Option<NodeInfo> {
    let entries = fs::read_dir(&roots.iio_bus).ok()?;

    for ent in entries.flatten() {
        let dir = ent.path();
        let tag = dir.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if !tag.starts_with("iio:device") {
            continue;
        }

        let name = match read_trimmed(&dir.join("name")) {
            Ok(n) => n,
            Err(_) => continue,
        };
        if name != query.key {
            continue;
        }

        return Some(NodeInfo {
            method: AccessMethod::Iio,
            model_id: name,
            data_node_path: dir.join("buffer"),
            enable_node_path: dir.join(query.iio_enable_node_name),
            interval_node_path: dir.join(paths::IIO_FREQUENCY_NODE),
        });
    }

    None
}

/// Write the enable state, respecting hub vs. direct control.
///
/// Direct mode writes `1`/`0`. Hub mode read-modify-writes the hub's shared
/// enable bitmask, flipping only this sensor's slot bit.
pub fn set_enable_node(
    path: &Path,
    sensorhub_controlled: bool,
    enable: bool,
    slot: u32,
) -> Result<()> {
    if sensorhub_controlled {
        let current = read_trimmed(path)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let mask = 1u64 << slot;
        let next = if enable { current | mask } else { current & !mask };
        write_node(path, next)
    } else {
        write_node(path, u8::from(enable))
    }
}

/// Write a plaintext value to a control node.
pub fn write_node<T: fmt::Display>(path: &Path, value: T) -> Result<()> {
    fs::write(path, value.to_string()).map_err(|e| HalError::NodeWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn read_trimmed(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_roots(base: &Path) -> NodeRoots {
        NodeRoots {
            input_class: base.join("input"),
            iio_bus: base.join("iio"),
            dev_input: base.join("dev"),
            sensorhub: base.join("hub"),
        }
    }

    fn make_input_device(roots: &NodeRoots, tag: &str, name: &str, event: &str) {
        let dir = roots.input_class.join(tag);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), format!("{}\n", name)).unwrap();
        fs::create_dir_all(dir.join(event)).unwrap();
        fs::create_dir_all(&roots.dev_input).unwrap();
        fs::write(roots.dev_input.join(event), b"").unwrap();
    }

    fn test_query(sensorhub_controlled: bool) -> NodeQuery<'static> {
        NodeQuery {
            sensorhub_controlled,
            sensor_type: "ULTRAVIOLET",
            key: "uv_sensor",
            iio_enable_node_name: "uv_enable",
            sensorhub_interval_node_name: "uv_poll_delay",
        }
    }

    #[test]
    fn test_is_sensorhub_controlled() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        assert!(!is_sensorhub_controlled_at(&roots, "uv_poll_delay"));

        fs::create_dir_all(&roots.sensorhub).unwrap();
        fs::write(roots.sensorhub.join("uv_poll_delay"), b"0").unwrap();
        assert!(is_sensorhub_controlled_at(&roots, "uv_poll_delay"));
    }

    #[test]
    fn test_resolve_direct_input_device() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        make_input_device(&roots, "input0", "other_sensor", "event0");
        make_input_device(&roots, "input1", "uv_sensor", "event3");

        let info = get_node_info_at(&roots, &test_query(false)).unwrap();
        assert_eq!(info.method, AccessMethod::InputEvent);
        assert_eq!(info.model_id, "uv_sensor");
        assert_eq!(info.data_node_path, roots.dev_input.join("event3"));
        // No plain `enable` attribute, so the hint applies
        assert_eq!(
            info.enable_node_path,
            roots.input_class.join("input1").join("uv_enable")
        );
        assert_eq!(
            info.interval_node_path,
            roots.input_class.join("input1").join("poll_delay")
        );
    }

    #[test]
    fn test_resolve_prefers_plain_enable_attribute() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        make_input_device(&roots, "input0", "uv_sensor", "event0");
        fs::write(roots.input_class.join("input0").join("enable"), b"0").unwrap();

        let info = get_node_info_at(&roots, &test_query(false)).unwrap();
        assert_eq!(
            info.enable_node_path,
            roots.input_class.join("input0").join("enable")
        );
    }

    #[test]
    fn test_resolve_sensorhub_mode_uses_hub_nodes() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        make_input_device(&roots, "input0", "uv_sensor", "event1");
        fs::create_dir_all(&roots.sensorhub).unwrap();

        let info = get_node_info_at(&roots, &test_query(true)).unwrap();
        assert_eq!(info.enable_node_path, roots.sensorhub.join("enable"));
        assert_eq!(
            info.interval_node_path,
            roots.sensorhub.join("uv_poll_delay")
        );
        // Data still flows through the input-event node
        assert_eq!(info.data_node_path, roots.dev_input.join("event1"));
    }

    #[test]
    fn test_resolve_no_match_is_no_such_device() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        make_input_device(&roots, "input0", "accelerometer", "event0");

        let result = get_node_info_at(&roots, &test_query(false));
        match result {
            Err(HalError::NoSuchDevice { sensor_type, key }) => {
                assert_eq!(sensor_type, "ULTRAVIOLET");
                assert_eq!(key, "uv_sensor");
            }
            other => panic!("expected NoSuchDevice, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_skips_input_device_without_event_node() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        let dir = roots.input_class.join("input0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), "uv_sensor\n").unwrap();

        assert!(matches!(
            get_node_info_at(&roots, &test_query(false)),
            Err(HalError::NoSuchDevice { .. })
        ));
    }

    #[test]
    fn test_resolve_iio_fallback() {
        let tmp = TempDir::new().unwrap();
        let roots = test_roots(tmp.path());
        let dir = roots.iio_bus.join("iio:device0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), "uv_sensor\n").unwrap();

        let info = get_node_info_at(&roots, &test_query(false)).unwrap();
        assert_eq!(info.method, AccessMethod::Iio);
        assert_eq!(info.model_id, "uv_sensor");
        assert_eq!(info.enable_node_path, dir.join("uv_enable"));
        assert_eq!(info.interval_node_path, dir.join("sampling_frequency"));
    }

    #[test]
    fn test_set_enable_node_direct() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enable");
        fs::write(&path, b"0").unwrap();

        set_enable_node(&path, false, true, 12).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1");

        set_enable_node(&path, false, false, 12).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0");
    }

    #[test]
    fn test_set_enable_node_hub_bitmask() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enable");
        fs::write(&path, b"5").unwrap(); // bits 0 and 2 already set

        set_enable_node(&path, true, true, 12).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), (5u64 | (1 << 12)).to_string());

        set_enable_node(&path, true, false, 12).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "5");
    }

    #[test]
    fn test_set_enable_node_hub_unreadable_mask_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enable");

        // No existing mask file: enabling writes just this sensor's bit
        set_enable_node(&path, true, true, 3).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "8");
    }

    #[test]
    fn test_write_node_failure() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing_dir").join("node");
        let result = write_node(&path, 42);
        assert!(matches!(result, Err(HalError::NodeWrite { .. })));
    }
}
