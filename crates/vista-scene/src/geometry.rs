use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w.max(0.0)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h.max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Edge-inclusive intersection. Touching rectangles yield a zero-area rect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Fraction of `self` that lies within `viewport`, in `[0, 1]`.
    ///
    /// Zero-area rectangles report 1.0 when they sit inside the viewport
    /// (edges included) and 0.0 otherwise.
    pub fn intersection_ratio(&self, viewport: &Rect) -> f32 {
        let Some(overlap) = self.intersection(viewport) else {
            return 0.0;
        };
        let area = self.area();
        if area <= 0.0 {
            return 1.0;
        }
        (overlap.area() / area).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_inside() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(region.intersection_ratio(&viewport), 1.0);
    }

    #[test]
    fn test_half_inside() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(0.0, 50.0, 100.0, 100.0);
        assert!((region.intersection_ratio(&viewport) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_outside() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(0.0, 200.0, 100.0, 100.0);
        assert_eq!(region.intersection_ratio(&viewport), 0.0);
        assert!(region.intersection(&viewport).is_none());
    }

    #[test]
    fn test_touching_edge_has_zero_ratio() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(0.0, 100.0, 100.0, 50.0);
        assert_eq!(region.intersection_ratio(&viewport), 0.0);
    }

    #[test]
    fn test_zero_area_region() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(Rect::new(50.0, 50.0, 0.0, 0.0).intersection_ratio(&viewport), 1.0);
        assert_eq!(Rect::new(50.0, 150.0, 0.0, 0.0).intersection_ratio(&viewport), 0.0);
    }
}
