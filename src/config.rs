//! Calibration store access
//!
//! The daemon ships one JSON file describing every supported sensor model:
//!
//! ```json
//! {
//!     "ULTRAVIOLET": {
//!         "maru_sensor_uv_1": {
//!             "vendor": "Tizen_SDK",
//!             "name": "maru_sensor_uv_1",
//!             "min_range": 0,
//!             "max_range": 15,
//!             "raw_data_unit": 0.1
//!         }
//!     }
//! }
//! ```
//!
//! Lookups go through the [`ConfigStore`] trait so the device facade never
//! depends on the file format directly. Numeric fields may be stored as JSON
//! numbers or as numeric strings; both coerce to `f64`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::{elements, paths};
use crate::error::{HalError, Result};

/// Query interface of the daemon's configuration store.
///
/// Lookup key is (sensor type, model id, element name); absence of a value
/// is reported as `None` and judged by the caller.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    fn get_string(&self, sensor_type: &str, model_id: &str, element: &str) -> Option<String>;
    fn get_number(&self, sensor_type: &str, model_id: &str, element: &str) -> Option<f64>;
}

/// JSON-backed calibration store.
#[derive(Debug, Default, Deserialize)]
pub struct SensorConfig {
    #[serde(flatten)]
    sections: HashMap<String, HashMap<String, HashMap<String, Value>>>,
}

impl SensorConfig {
    /// Load the store from the well-known system path.
    pub fn load_default() -> Result<Self> {
        Self::from_path(Path::new(paths::SENSOR_CONFIG_FILE))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| HalError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SensorConfig = serde_json::from_str(&data)?;
        debug!(path = ?path, sections = config.sections.len(), "Loaded sensor config");
        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    fn get(&self, sensor_type: &str, model_id: &str, element: &str) -> Option<&Value> {
        self.sections.get(sensor_type)?.get(model_id)?.get(element)
    }
}

impl ConfigStore for SensorConfig {
    fn get_string(&self, sensor_type: &str, model_id: &str, element: &str) -> Option<String> {
        match self.get(sensor_type, model_id, element)? {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn get_number(&self, sensor_type: &str, model_id: &str, element: &str) -> Option<f64> {
        match self.get(sensor_type, model_id, element)? {
            Value::Number(n) => n.as_f64(),
            // Config stores are stringly typed in practice; accept "0.1" too.
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// Per-model calibration constants, loaded once at device construction.
///
/// All five fields are required. A store missing any of them yields a
/// construction failure; no partial or defaulted profile is ever produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationProfile {
    pub model_id: String,
    pub vendor: String,
    pub chip_name: String,
    pub min_range: f64,
    pub max_range: f64,
    pub raw_data_unit: f64,
}

impl CalibrationProfile {
    pub fn load(store: &dyn ConfigStore, sensor_type: &str, model_id: &str) -> Result<Self> {
        let vendor = store
            .get_string(sensor_type, model_id, elements::VENDOR)
            .ok_or_else(|| missing(model_id, elements::VENDOR))?;
        let chip_name = store
            .get_string(sensor_type, model_id, elements::NAME)
            .ok_or_else(|| missing(model_id, elements::NAME))?;
        let min_range = store
            .get_number(sensor_type, model_id, elements::MIN_RANGE)
            .ok_or_else(|| missing(model_id, elements::MIN_RANGE))?;
        let max_range = store
            .get_number(sensor_type, model_id, elements::MAX_RANGE)
            .ok_or_else(|| missing(model_id, elements::MAX_RANGE))?;
        let raw_data_unit = store
            .get_number(sensor_type, model_id, elements::RAW_DATA_UNIT)
            .ok_or_else(|| missing(model_id, elements::RAW_DATA_UNIT))?;

        debug!(
            model = %model_id,
            vendor = %vendor,
            chip = %chip_name,
            unit = raw_data_unit,
            "Loaded calibration profile"
        );

        Ok(CalibrationProfile {
            model_id: model_id.to_string(),
            vendor,
            chip_name,
            min_range,
            max_range,
            raw_data_unit,
        })
    }

    /// Convert a bias-adjusted raw magnitude to the physical UV value.
    ///
    /// Pure IEEE double multiply. The min/max range fields are advisory
    /// metadata; the result is not clamped.
    pub fn raw_to_base(&self, raw: i32) -> f64 {
        raw as f64 * self.raw_data_unit
    }
}

fn missing(model_id: &str, field: &'static str) -> HalError {
    HalError::MissingCalibrationField {
        model: model_id.to_string(),
        field,
    }
}
