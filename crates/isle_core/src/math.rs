//! Fixed-point helpers for placement scoring.
//!
//! Anchor points and footprint centers are fractional (a 2x2 footprint is
//! centered between cells), so placement distances are computed in
//! fixed-point to keep candidate ordering bit-exact across platforms.

use fixed::types::I32F32;

/// Fixed-point number type for placement math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D point in grid-cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2Fixed {
    /// X coordinate.
    pub x: Fixed,
    /// Y coordinate.
    pub y: Fixed,
}

impl Vec2Fixed {
    /// Create a new fixed-point point.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Point at an integer cell coordinate.
    #[must_use]
    pub fn from_cell(x: u32, y: u32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Center of a `width x height` rectangle whose top-left cell is `(x, y)`.
    ///
    /// The center of a single cell is the cell coordinate itself.
    #[must_use]
    pub fn footprint_center(x: u32, y: u32, width: u32, height: u32) -> Self {
        let half = Fixed::from_num(2);
        Self::new(
            Fixed::from_num(x) + Fixed::from_num(width.saturating_sub(1)) / half,
            Fixed::from_num(y) + Fixed::from_num(height.saturating_sub(1)) / half,
        )
    }

    /// Mean of a set of cell coordinates, or `None` for an empty set.
    #[must_use]
    pub fn centroid<I>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut sum_x: u64 = 0;
        let mut sum_y: u64 = 0;
        let mut count: u64 = 0;
        for (x, y) in cells {
            sum_x += u64::from(x);
            sum_y += u64::from(y);
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = Fixed::from_num(count);
        Some(Self::new(
            Fixed::from_num(sum_x) / n,
            Fixed::from_num(sum_y) / n,
        ))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let d = self - other;
        d.x * d.x + d.y * d.y
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_center_single_cell() {
        let c = Vec2Fixed::footprint_center(3, 4, 1, 1);
        assert_eq!(c, Vec2Fixed::from_cell(3, 4));
    }

    #[test]
    fn test_footprint_center_even_size() {
        let c = Vec2Fixed::footprint_center(2, 2, 2, 3);
        assert_eq!(c.x, Fixed::from_num(2.5));
        assert_eq!(c.y, Fixed::from_num(3));
    }

    #[test]
    fn test_centroid() {
        let c = Vec2Fixed::centroid([(0, 0), (2, 0), (0, 2), (2, 2)]).unwrap();
        assert_eq!(c, Vec2Fixed::from_cell(1, 1));
        assert!(Vec2Fixed::centroid(std::iter::empty()).is_none());
    }

    #[test]
    fn test_distance_squared() {
        let a = Vec2Fixed::from_cell(1, 1);
        let b = Vec2Fixed::from_cell(4, 5);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert_eq!(b - a, Vec2Fixed::from_cell(3, 4));
    }
}
