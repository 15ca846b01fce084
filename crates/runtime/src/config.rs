use persistence::SliceKeys;
use scene::matching::{BUILDING_LABEL_THRESHOLD, UNIT_LABEL_THRESHOLD};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "map config parse error: {msg}"),
            ConfigError::Invalid(what) => write!(f, "invalid map config: {what}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Diagram markers, store keys and timing for one map instance.
///
/// Every field has a default, so hosts only pass what differs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub keys: SliceKeys,
    pub container_selector: String,
    pub svg_id: String,
    pub content_group_id: String,
    /// Fill classes that mark clickable units.
    pub unit_classes: Vec<String>,
    /// Decorative layers drawn over units; they must not eat clicks.
    pub overlay_classes: Vec<String>,
    pub unit_label_class: String,
    pub building_label_class: String,
    pub building_class: String,
    pub building_attr: String,
    pub unit_label_threshold: f64,
    pub building_label_threshold: f64,
    pub poll_interval_ms: u32,
    pub glow_period_ms: u64,
    /// Minimum and maximum zoom scale.
    pub scale_extent: [f64; 2],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            keys: SliceKeys::default(),
            container_selector: ".map-container".to_string(),
            svg_id: "map".to_string(),
            content_group_id: "map-content".to_string(),
            unit_classes: classes(&["st0", "st2"]),
            overlay_classes: classes(&[
                "st1", "st3", "st4", "st5", "st6", "st7", "st8", "st9", "st11", "st17", "st18",
                "st19", "st20",
            ]),
            unit_label_class: "st16".to_string(),
            building_label_class: "st15".to_string(),
            building_class: "building-circle".to_string(),
            building_attr: "data-building".to_string(),
            unit_label_threshold: UNIT_LABEL_THRESHOLD,
            building_label_threshold: BUILDING_LABEL_THRESHOLD,
            poll_interval_ms: 500,
            glow_period_ms: 2000,
            scale_extent: [1.0, 8.0],
        }
    }
}

impl MapConfig {
    /// Parses a partial JSON config; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        // Derived `default` structs also accept sequences; only objects are configs.
        if !value.is_object() {
            return Err(ConfigError::Parse("config must be a JSON object".to_string()));
        }
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [min, max] = self.scale_extent;
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::Invalid("scaleExtent must be 0 < min <= max"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("pollIntervalMs must be positive"));
        }
        Ok(())
    }

    /// `.st0, .st2`, or `None` when no unit classes are configured.
    pub fn unit_selector(&self) -> Option<String> {
        class_selector(&self.unit_classes)
    }

    pub fn overlay_selector(&self) -> Option<String> {
        class_selector(&self.overlay_classes)
    }

    pub fn unit_label_selector(&self) -> String {
        format!("text.{}", self.unit_label_class)
    }

    pub fn building_label_selector(&self) -> String {
        format!("text.{}", self.building_label_class)
    }

    pub fn building_selector(&self) -> String {
        format!(".{}", self.building_class)
    }
}

fn classes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn class_selector(classes: &[String]) -> Option<String> {
    let parts: Vec<String> = classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!(".{c}"))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MapConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn default_selectors() {
        let c = MapConfig::default();
        assert_eq!(c.unit_selector().as_deref(), Some(".st0, .st2"));
        assert_eq!(c.unit_label_selector(), "text.st16");
        assert_eq!(c.building_label_selector(), "text.st15");
        assert_eq!(c.building_selector(), ".building-circle");
        assert_eq!(c.overlay_classes.len(), 13);
        assert!(c.overlay_selector().unwrap().starts_with(".st1, .st3"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = MapConfig::from_json(r#"{"unitClasses":["unit-a"],"keys":{"values":"v2"}}"#)
            .unwrap();
        assert_eq!(c.unit_selector().as_deref(), Some(".unit-a"));
        assert_eq!(c.keys.values, "v2");
        assert_eq!(c.keys.map_data, "map-data");
        assert_eq!(c.poll_interval_ms, 500);
    }

    #[test]
    fn empty_class_list_has_no_selector() {
        let c = MapConfig {
            unit_classes: vec![" ".to_string()],
            ..MapConfig::default()
        };
        assert_eq!(c.unit_selector(), None);
    }

    #[test]
    fn rejects_bad_scale_extent() {
        let err = MapConfig::from_json(r#"{"scaleExtent":[4,2]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(matches!(
            MapConfig::from_json("[]").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn non_object_configs_are_parse_errors() {
        for raw in ["[]", "[1, 2]", "null", "42", r#""map""#] {
            assert!(
                matches!(MapConfig::from_json(raw), Err(ConfigError::Parse(_))),
                "{raw} accepted"
            );
        }
        assert_eq!(MapConfig::from_json("{}"), Ok(MapConfig::default()));
    }
}
