//! Constants for the ultraviolet sensor HAL
//!
//! Centralizes filesystem roots, input-event codes, and the UV sensor's
//! identity values. Never use magic numbers in other files - add them here
//! first.

/// System paths probed by the node resolver.
pub mod paths {
    /// Input-subsystem class directory, one `inputN` entry per device.
    pub const INPUT_CLASS_BASE: &str = "/sys/class/input";

    /// IIO bus directory, scanned as a fallback when no input device matches.
    pub const IIO_BUS_BASE: &str = "/sys/bus/iio/devices";

    /// Readable event nodes corresponding to `inputN/eventM` sysfs entries.
    pub const DEV_INPUT_BASE: &str = "/dev/input";

    /// Sensor-hub control directory. The presence of the sensor's interval
    /// node below this directory marks the device as hub-controlled.
    pub const SENSORHUB_BASE: &str = "/sys/class/sensors/ssp_sensor";

    /// Calibration store consulted once at device construction.
    pub const SENSOR_CONFIG_FILE: &str = "/etc/uvhal/sensors.json";

    /// Interval attribute of a directly-controlled input device.
    pub const POLL_DELAY_NODE: &str = "poll_delay";

    /// IIO sampling-rate attribute, used when a device resolves on the IIO bus.
    pub const IIO_FREQUENCY_NODE: &str = "sampling_frequency";
}

/// Kernel input-event record classification.
pub mod event {
    /// Synchronization marker closing one group of records.
    pub const EV_SYN: u16 = 0x00;

    /// Relative-motion class; the UV magnitude arrives on this class.
    pub const EV_REL: u16 = 0x02;

    /// Miscellaneous relative sub-code carrying the raw UV value.
    pub const REL_MISC: u16 = 0x0a;

    /// Records consumed per read cycle before giving up on SYN.
    pub const INPUT_MAX_BEFORE_SYN: usize = 10;
}

/// Identity and defaults of the ultraviolet sensor class.
pub mod uv {
    /// Identity reported to the daemon for this sensor.
    pub const SENSOR_ID: u32 = 0x1;

    pub const SENSOR_NAME: &str = "ULTRAVIOLET_SENSOR";

    /// Sensor-type tag used for node resolution and calibration lookup.
    pub const SENSOR_TYPE: &str = "ULTRAVIOLET";

    /// Input device name the resolver matches against.
    pub const INPUT_KEY: &str = "uv_sensor";

    /// Enable-node name used when the device lacks a plain `enable` attribute.
    pub const IIO_ENABLE_NODE: &str = "uv_enable";

    /// Interval node name below the sensor-hub control directory.
    pub const SENSORHUB_POLL_NODE: &str = "uv_poll_delay";

    /// Bit position of the UV sensor in the hub's enable bitmask.
    pub const SENSORHUB_SLOT: u32 = 12;

    /// The hardware reports value + 1; the bias is subtracted before storage.
    pub const BIAS: i32 = 1;

    /// Device category tag, composed into the daemon-visible event type.
    pub const DEVICE_CATEGORY: u32 = 0x10;

    pub const DEFAULT_INTERVAL_MS: u64 = 1000;

    pub const MIN_INTERVAL_MS: u64 = 1;
}

/// Daemon-visible event-type composition.
pub mod event_type {
    /// Category tag occupies the bits above this shift.
    pub const SENSOR_EVENT_SHIFT: u32 = 16;

    /// Flag marking raw (uncooked) sensor data events.
    pub const RAW_DATA_EVENT: u32 = 0x0001;
}

/// Element names looked up in the calibration store.
pub mod elements {
    pub const VENDOR: &str = "vendor";
    pub const NAME: &str = "name";
    pub const MIN_RANGE: &str = "min_range";
    pub const MAX_RANGE: &str = "max_range";
    pub const RAW_DATA_UNIT: &str = "raw_data_unit";
}
