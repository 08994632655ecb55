//! Zone model for the geographic areas weather is collected for

use serde::{Deserialize, Serialize};

/// Stable identifier of a registered zone
pub type ZoneId = u64;

/// A registered geographic zone
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Zone {
    /// Unique, stable identifier
    pub id: ZoneId,
    /// Display name (neighborhood, district, ...)
    #[serde(default)]
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Only active zones take part in collection runs
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Zone {
    /// Create a new active zone
    #[must_use]
    pub fn new(id: ZoneId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            active: true,
        }
    }

    /// Same zone with the active flag cleared
    #[must_use]
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Format zone position as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Whether latitude and longitude are inside their valid ranges
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}
