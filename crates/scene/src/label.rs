use foundation::math::{Vec2, format_coord};

/// Structured view of a text label's `transform` attribute.
///
/// Only the translate position is interpreted. A rotation directive is
/// carried verbatim so re-anchoring never changes the label's orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTransform {
    pub translate: Vec2,
    /// The full `rotate(...)` directive, if any.
    pub rotation: Option<String>,
}

impl LabelTransform {
    pub fn new(translate: Vec2) -> Self {
        Self {
            translate,
            rotation: None,
        }
    }

    /// Parses `translate(x, y)` or `translate(x y)`, optionally followed by
    /// other directives. Returns `None` when no two-number translate exists.
    pub fn parse(attr: &str) -> Option<Self> {
        let args = directive_args(attr, "translate")?;
        let mut parts = args
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty());
        let x = parts.next()?.parse::<f64>().ok()?;
        let y = parts.next()?.parse::<f64>().ok()?;
        let translate = Vec2::new(x, y);
        if !translate.is_finite() {
            return None;
        }

        let rotation = directive_span(attr, "rotate").map(str::to_string);
        Some(Self {
            translate,
            rotation,
        })
    }

    /// Same orientation, new anchor point.
    pub fn anchored_at(&self, point: Vec2) -> Self {
        Self {
            translate: point,
            rotation: self.rotation.clone(),
        }
    }
}

impl std::fmt::Display for LabelTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "translate({}, {})",
            format_coord(self.translate.x),
            format_coord(self.translate.y)
        )?;
        if let Some(rotation) = &self.rotation {
            write!(f, " {rotation}")?;
        }
        Ok(())
    }
}

/// Text between `name(` and the matching `)`.
fn directive_args<'a>(attr: &'a str, name: &str) -> Option<&'a str> {
    let span = directive_span(attr, name)?;
    let open = span.find('(')?;
    Some(&span[open + 1..span.len() - 1])
}

/// The whole `name(...)` directive, parentheses included.
fn directive_span<'a>(attr: &'a str, name: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(rel) = attr[from..].find(name) {
        let start = from + rel;
        let after = start + name.len();
        // Skip whitespace between the name and the opening paren.
        let open = after + attr[after..].len() - attr[after..].trim_start().len();
        if attr[open..].starts_with('(') {
            let close = attr[open..].find(')')?;
            return Some(&attr[start..open + close + 1]);
        }
        from = after;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::LabelTransform;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_comma_and_space_separators() {
        let a = LabelTransform::parse("translate(100, 200)").unwrap();
        let b = LabelTransform::parse("translate(100 200)").unwrap();
        let c = LabelTransform::parse("translate( 100 ,200 )").unwrap();
        assert_eq!(a.translate, Vec2::new(100.0, 200.0));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.rotation, None);
    }

    #[test]
    fn keeps_rotation_verbatim() {
        let t = LabelTransform::parse("translate(412.3 98.1) rotate(-90)").unwrap();
        assert_eq!(t.translate, Vec2::new(412.3, 98.1));
        assert_eq!(t.rotation.as_deref(), Some("rotate(-90)"));

        let moved = t.anchored_at(Vec2::new(10.0, 20.5));
        assert_eq!(moved.to_string(), "translate(10, 20.5) rotate(-90)");
    }

    #[test]
    fn keeps_rotation_with_center() {
        let t = LabelTransform::parse("translate(1,2)rotate(45 3 4)").unwrap();
        assert_eq!(t.rotation.as_deref(), Some("rotate(45 3 4)"));
    }

    #[test]
    fn rejects_missing_translate() {
        assert!(LabelTransform::parse("").is_none());
        assert!(LabelTransform::parse("rotate(-90)").is_none());
        assert!(LabelTransform::parse("translate(5)").is_none());
        assert!(LabelTransform::parse("translate(a, b)").is_none());
        assert!(LabelTransform::parse("matrix(1 0 0 1 5 5)").is_none());
    }

    #[test]
    fn formats_without_rotation() {
        let t = LabelTransform::new(Vec2::new(-0.0, 7.0));
        assert_eq!(t.to_string(), "translate(0, 7)");
    }
}
