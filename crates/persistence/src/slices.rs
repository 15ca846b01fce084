use scene::UnitState;
use serde::{Deserialize, Serialize};

/// The three named state slices shared between views.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slice {
    MapData,
    Values,
    Transform,
}

impl Slice {
    /// Poll order.
    pub const ALL: [Slice; 3] = [Slice::MapData, Slice::Values, Slice::Transform];
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slice::MapData => write!(f, "map-data"),
            Slice::Values => write!(f, "values"),
            Slice::Transform => write!(f, "transform"),
        }
    }
}

/// Store keys for each slice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SliceKeys {
    pub map_data: String,
    pub values: String,
    pub transform: String,
}

impl Default for SliceKeys {
    fn default() -> Self {
        Self {
            map_data: "map-data".to_string(),
            values: "values".to_string(),
            transform: "transform".to_string(),
        }
    }
}

impl SliceKeys {
    pub fn key(&self, slice: Slice) -> &str {
        match slice {
            Slice::MapData => &self.map_data,
            Slice::Values => &self.values,
            Slice::Transform => &self.transform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    Malformed(String),
    WrongLength { expected: usize, actual: usize },
    NonFinite(&'static str),
    NonPositiveScale,
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Malformed(msg) => write!(f, "malformed snapshot: {msg}"),
            SnapshotError::WrongLength { expected, actual } => {
                write!(f, "expected {expected} unit states, found {actual}")
            }
            SnapshotError::NonFinite(field) => write!(f, "field `{field}` is not a finite number"),
            SnapshotError::NonPositiveScale => write!(f, "scale `k` must be positive"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Malformed(e.to_string())
    }
}

/// One state per unit, index-aligned with the diagram's unit sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapDataSnapshot(pub Vec<UnitState>);

impl MapDataSnapshot {
    pub fn initial(len: usize) -> Self {
        Self(vec![UnitState::Initial; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn states(&self) -> &[UnitState] {
        &self.0
    }

    pub fn selected_count(&self) -> usize {
        self.0.iter().filter(|s| **s == UnitState::Selected).count()
    }

    /// Parses and checks the length against the diagram's unit count.
    pub fn parse(raw: &str, expected_len: usize) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        if snapshot.len() != expected_len {
            return Err(SnapshotError::WrongLength {
                expected: expected_len,
                actual: snapshot.len(),
            });
        }
        Ok(snapshot)
    }
}

/// Dashboard values. Only `units_count` is owned here; the rest is carried
/// through untouched, including any fields this crate does not know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesSnapshot {
    pub interface: String,
    pub units_count: u64,
    pub madrab_num: f64,
    pub meter_price: f64,
    pub unit_area: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ValuesSnapshot {
    fn default() -> Self {
        Self {
            interface: "north".to_string(),
            units_count: 0,
            madrab_num: 55.0,
            meter_price: 1000.0,
            unit_area: 375.0,
            extra: serde_json::Map::new(),
        }
    }
}

impl ValuesSnapshot {
    /// All five fields must be present and well-typed; no partial merge.
    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_units_count(mut self, units_count: usize) -> Self {
        self.units_count = units_count as u64;
        self
    }
}

/// Pan/zoom state: translate `(x, y)` then scale `k`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for TransformSnapshot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformSnapshot {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        let t: Self = serde_json::from_str(raw)?;
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if !self.x.is_finite() {
            return Err(SnapshotError::NonFinite("x"));
        }
        if !self.y.is_finite() {
            return Err(SnapshotError::NonFinite("y"));
        }
        if !self.k.is_finite() {
            return Err(SnapshotError::NonFinite("k"));
        }
        if self.k <= 0.0 {
            return Err(SnapshotError::NonPositiveScale);
        }
        Ok(())
    }

    /// SVG `transform` attribute value for the content group.
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::{MapDataSnapshot, Slice, SliceKeys, SnapshotError, TransformSnapshot, ValuesSnapshot};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use scene::UnitState;

    #[test]
    fn map_data_round_trips_through_json() {
        let snap = MapDataSnapshot(vec![UnitState::Selected, UnitState::Completed]);
        let raw = serde_json::to_string(&snap).unwrap();
        assert_eq!(raw, r#"["selected","completed"]"#);
        assert_eq!(MapDataSnapshot::parse(&raw, 2), Ok(snap));
    }

    #[test]
    fn map_data_rejects_unknown_state() {
        let err = MapDataSnapshot::parse(r#"["initial","sold"]"#, 2).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn map_data_rejects_non_array() {
        assert!(MapDataSnapshot::parse(r#"{"0":"initial"}"#, 1).is_err());
        assert!(MapDataSnapshot::parse("null", 0).is_err());
        assert!(MapDataSnapshot::parse("not json", 0).is_err());
    }

    proptest! {
        #[test]
        fn map_data_length_must_match(n in 0usize..64, m in 0usize..64) {
            let raw = serde_json::to_string(&MapDataSnapshot::initial(m)).unwrap();
            let parsed = MapDataSnapshot::parse(&raw, n);
            if n == m {
                prop_assert_eq!(parsed, Ok(MapDataSnapshot::initial(n)));
            } else {
                prop_assert_eq!(
                    parsed,
                    Err(SnapshotError::WrongLength { expected: n, actual: m })
                );
            }
        }
    }

    #[test]
    fn values_require_all_fields() {
        let raw = r#"{"interface":"south","unitsCount":2,"meterPrice":1,"unitArea":2}"#;
        assert!(ValuesSnapshot::parse(raw).is_err());
    }

    #[test]
    fn values_reject_wrong_types() {
        let raw = r#"{"interface":"south","unitsCount":2,"madrabNum":"55","meterPrice":1,"unitArea":2}"#;
        assert!(ValuesSnapshot::parse(raw).is_err());
    }

    #[test]
    fn values_keep_unknown_fields() {
        let raw = r#"{"interface":"south","unitsCount":2,"madrabNum":5,"meterPrice":1,"unitArea":2,"theme":"dark"}"#;
        let v = ValuesSnapshot::parse(raw).unwrap().with_units_count(7);
        assert_eq!(v.interface, "south");
        assert_eq!(v.units_count, 7);
        assert_eq!(v.extra.get("theme"), Some(&serde_json::json!("dark")));

        let out: serde_json::Value = serde_json::to_value(&v).unwrap();
        assert_eq!(out["theme"], serde_json::json!("dark"));
        assert_eq!(out["unitsCount"], serde_json::json!(7));
    }

    #[test]
    fn default_values_match_dashboard_defaults() {
        let out = serde_json::to_value(ValuesSnapshot::default()).unwrap();
        assert_eq!(
            out,
            serde_json::json!({
                "interface": "north",
                "unitsCount": 0,
                "madrabNum": 55.0,
                "meterPrice": 1000.0,
                "unitArea": 375.0,
            })
        );
    }

    #[test]
    fn transform_requires_numbers() {
        assert_eq!(
            TransformSnapshot::parse(r#"{"x":10,"y":20,"k":2}"#),
            Ok(TransformSnapshot::new(10.0, 20.0, 2.0))
        );
        assert!(TransformSnapshot::parse(r#"{"x":10,"y":20}"#).is_err());
        assert!(TransformSnapshot::parse(r#"{"x":"10","y":20,"k":1}"#).is_err());
        assert!(TransformSnapshot::parse(r#"{"x":null,"y":20,"k":1}"#).is_err());
    }

    #[test]
    fn transform_rejects_non_finite() {
        let t = TransformSnapshot::new(f64::NAN, 0.0, 1.0);
        assert_eq!(t.validate(), Err(SnapshotError::NonFinite("x")));
        let t = TransformSnapshot::new(0.0, 0.0, f64::INFINITY);
        assert_eq!(t.validate(), Err(SnapshotError::NonFinite("k")));
    }

    #[test]
    fn transform_rejects_degenerate_scale() {
        assert_eq!(
            TransformSnapshot::parse(r#"{"x":0,"y":0,"k":0}"#),
            Err(SnapshotError::NonPositiveScale)
        );
        assert_eq!(
            TransformSnapshot::new(5.0, 5.0, -2.0).validate(),
            Err(SnapshotError::NonPositiveScale)
        );
        assert!(TransformSnapshot::new(0.0, 0.0, 0.5).validate().is_ok());
    }

    #[test]
    fn transform_svg_attribute() {
        assert_eq!(
            TransformSnapshot::new(10.0, -20.5, 2.0).to_svg(),
            "translate(10,-20.5) scale(2)"
        );
    }

    #[test]
    fn keys_default_to_slice_names() {
        let keys = SliceKeys::default();
        for slice in Slice::ALL {
            assert_eq!(keys.key(slice), slice.to_string());
        }
    }
}
