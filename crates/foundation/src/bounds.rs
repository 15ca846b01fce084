use crate::math::Vec2;

/// Axis-aligned bounding box in diagram user units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Aabb2 { min, max }
    }

    /// Builds a box from an SVG-style `(x, y, width, height)` rect.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Aabb2 {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width() / 2.0,
            self.min.y + self.height() / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn center_of_rect() {
        let b = Aabb2::from_rect(90.0, 92.0, 20.0, 20.0);
        assert_eq!(b.center(), Vec2::new(100.0, 102.0));
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.height(), 20.0);
    }
}
