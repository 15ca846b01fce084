use foundation::math::Vec2;

/// External building id, as written in the diagram's `data-building` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildingId(pub String);

impl BuildingId {
    pub fn new(id: impl Into<String>) -> Self {
        BuildingId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BuildingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A building circle read from the diagram. Recomputed on every load.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingMarker {
    /// `None` when the circle carries no id attribute; such markers still
    /// anchor labels but never own units.
    pub id: Option<BuildingId>,
    pub center: Vec2,
}

impl BuildingMarker {
    pub fn new(id: Option<BuildingId>, center: Vec2) -> Self {
        Self { id, center }
    }

    /// Reads a marker from raw `cx`/`cy` attribute text.
    pub fn from_attrs(id: Option<&str>, cx: Option<&str>, cy: Option<&str>) -> Option<Self> {
        let x = cx?.trim().parse::<f64>().ok()?;
        let y = cy?.trim().parse::<f64>().ok()?;
        let center = Vec2::new(x, y);
        if !center.is_finite() {
            return None;
        }
        let id = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(BuildingId::new);
        Some(Self { id, center })
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildingId, BuildingMarker};
    use foundation::math::Vec2;

    #[test]
    fn parses_marker_attributes() {
        let m = BuildingMarker::from_attrs(Some("B7"), Some("120.5"), Some(" 80 ")).unwrap();
        assert_eq!(m.id, Some(BuildingId::new("B7")));
        assert_eq!(m.center, Vec2::new(120.5, 80.0));
    }

    #[test]
    fn rejects_missing_or_garbage_coordinates() {
        assert!(BuildingMarker::from_attrs(Some("B1"), None, Some("1")).is_none());
        assert!(BuildingMarker::from_attrs(Some("B1"), Some("abc"), Some("1")).is_none());
        assert!(BuildingMarker::from_attrs(Some("B1"), Some("NaN"), Some("1")).is_none());
    }

    #[test]
    fn blank_id_is_none() {
        let m = BuildingMarker::from_attrs(Some("  "), Some("1"), Some("2")).unwrap();
        assert_eq!(m.id, None);
    }
}
