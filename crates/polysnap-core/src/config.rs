//! Static configuration, read once at start.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Layer categories that can act as snap targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerCategory {
    /// Places / landmarks.
    Venues,
    /// Map comments (polygon type).
    MapComments,
    /// Major traffic events.
    MajorTrafficEvents,
    RestrictedDrivingAreas,
    /// Permanent hazards (polygon type).
    PermanentHazards,
    BigJunctions,
}

impl LayerCategory {
    /// All categories, in lookup order.
    pub const ALL: [LayerCategory; 6] = [
        LayerCategory::Venues,
        LayerCategory::MapComments,
        LayerCategory::MajorTrafficEvents,
        LayerCategory::RestrictedDrivingAreas,
        LayerCategory::PermanentHazards,
        LayerCategory::BigJunctions,
    ];

    /// Key used in configuration documents.
    pub fn config_key(self) -> &'static str {
        match self {
            LayerCategory::Venues => "venues",
            LayerCategory::MapComments => "mapComments",
            LayerCategory::MajorTrafficEvents => "majorTrafficEvents",
            LayerCategory::RestrictedDrivingAreas => "restrictedDrivingAreas",
            LayerCategory::PermanentHazards => "permanentHazards",
            LayerCategory::BigJunctions => "bigJunctions",
        }
    }

    /// Property on the editor's map object holding this category's layer.
    pub fn host_property(self) -> &'static str {
        match self {
            LayerCategory::Venues => "venueLayer",
            LayerCategory::MapComments => "commentLayer",
            LayerCategory::MajorTrafficEvents => "mteLayer",
            LayerCategory::RestrictedDrivingAreas => "restrictedDrivingAreaLayer",
            LayerCategory::PermanentHazards => "permanentHazardLayer",
            LayerCategory::BigJunctions => "bigJunctionLayer",
        }
    }

    /// Type tag the editor reports for features of this category.
    pub fn feature_type(self) -> &'static str {
        match self {
            LayerCategory::Venues => "venue",
            LayerCategory::MapComments => "mapComment",
            LayerCategory::MajorTrafficEvents => "mte",
            LayerCategory::RestrictedDrivingAreas => "restrictedDrivingArea",
            LayerCategory::PermanentHazards => "permanentHazard",
            LayerCategory::BigJunctions => "bigJunction",
        }
    }

    /// Find the category whose features carry `tag`.
    pub fn from_feature_type(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.feature_type() == tag)
    }
}

/// Which categories are included in snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerCategoryConfig {
    pub venues: bool,
    pub map_comments: bool,
    pub major_traffic_events: bool,
    pub restricted_driving_areas: bool,
    pub permanent_hazards: bool,
    pub big_junctions: bool,
}

impl Default for LayerCategoryConfig {
    fn default() -> Self {
        Self {
            venues: true,
            map_comments: true,
            major_traffic_events: true,
            restricted_driving_areas: true,
            permanent_hazards: true,
            big_junctions: true,
        }
    }
}

impl LayerCategoryConfig {
    /// Check whether a category is included.
    pub fn includes(&self, category: LayerCategory) -> bool {
        match category {
            LayerCategory::Venues => self.venues,
            LayerCategory::MapComments => self.map_comments,
            LayerCategory::MajorTrafficEvents => self.major_traffic_events,
            LayerCategory::RestrictedDrivingAreas => self.restricted_driving_areas,
            LayerCategory::PermanentHazards => self.permanent_hazards,
            LayerCategory::BigJunctions => self.big_junctions,
        }
    }

    /// Enabled categories in lookup order.
    pub fn enabled(&self) -> impl Iterator<Item = LayerCategory> + '_ {
        LayerCategory::ALL.into_iter().filter(|c| self.includes(*c))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Snapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapConfig {
    /// Snap tolerance in pixels.
    pub tolerance: f64,
    /// How often the editor state is sampled, in milliseconds.
    pub poll_interval_ms: u64,
    /// Settle delay after a host notification, in milliseconds.
    pub debounce_ms: u64,
    pub enabled_by_default: bool,
    pub snap_to_edges: bool,
    pub snap_to_vertices: bool,
    pub snap_to_nodes: bool,
    pub layers: LayerCategoryConfig,
    /// Delay between checks for the editor object model.
    pub bootstrap_retry_ms: u64,
    /// Delay between checks for the map surface once the editor is up.
    pub map_retry_ms: u64,
    pub bootstrap_max_attempts: u32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            tolerance: 12.0,
            poll_interval_ms: 250,
            debounce_ms: 80,
            enabled_by_default: true,
            snap_to_edges: true,
            snap_to_vertices: true,
            snap_to_nodes: true,
            layers: LayerCategoryConfig::default(),
            bootstrap_retry_ms: 800,
            map_retry_ms: 2000,
            bootstrap_max_attempts: 150,
        }
    }
}

impl SnapConfig {
    /// Parse a (possibly partial) configuration document. Missing fields
    /// keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SnapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the scheduler or the snapping behavior cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tolerance",
                reason: "must be a positive number of pixels",
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "pollIntervalMs",
                reason: "must be non-zero",
            });
        }
        if self.bootstrap_retry_ms == 0 || self.map_retry_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "bootstrapRetryMs",
                reason: "retry intervals must be non-zero",
            });
        }
        if self.bootstrap_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "bootstrapMaxAttempts",
                reason: "must allow at least one attempt",
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SnapConfig::default();
        assert_eq!(config.tolerance, 12.0);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.enabled_by_default);
        assert_eq!(config.layers.enabled().count(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{"tolerance": 18, "layers": {"venues": false, "bigJunctions": false}}"#;
        let config = SnapConfig::from_json(json).unwrap();
        assert_eq!(config.tolerance, 18.0);
        assert_eq!(config.poll_interval_ms, 250);
        assert!(!config.layers.includes(LayerCategory::Venues));
        assert!(config.layers.includes(LayerCategory::MapComments));

        let enabled: Vec<_> = config.layers.enabled().collect();
        assert_eq!(
            enabled,
            vec![
                LayerCategory::MapComments,
                LayerCategory::MajorTrafficEvents,
                LayerCategory::RestrictedDrivingAreas,
                LayerCategory::PermanentHazards,
            ]
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = SnapConfig::from_json(r#"{"pollIntervalMs": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid { field: "pollIntervalMs", .. })));

        let result = SnapConfig::from_json(r#"{"tolerance": -1}"#);
        assert!(matches!(result, Err(ConfigError::Invalid { field: "tolerance", .. })));

        let result = SnapConfig::from_json("not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_category_tables() {
        assert_eq!(LayerCategory::Venues.host_property(), "venueLayer");
        assert_eq!(LayerCategory::MapComments.host_property(), "commentLayer");
        assert_eq!(LayerCategory::from_feature_type("mte"), Some(LayerCategory::MajorTrafficEvents));
        assert_eq!(LayerCategory::from_feature_type("segment"), None);
        for category in LayerCategory::ALL {
            assert!(!category.config_key().is_empty());
        }
    }

    #[test]
    fn test_json_keys_match_config_keys() {
        let json = SnapConfig::default().to_json().unwrap();
        for category in LayerCategory::ALL {
            assert!(json.contains(category.config_key()));
        }
    }
}
