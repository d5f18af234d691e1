use std::fmt;

/// A point as defined by its x and y coordinates
///
/// Coordinates are relative to the top-left corner of the window they were reported for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point<N> {
    /// horizontal coordinate
    pub x: N,
    /// vertical coordinate
    pub y: N,
}

impl<N> Point<N> {
    /// Create a new point from its coordinates
    #[inline]
    pub const fn new(x: N, y: N) -> Self {
        Point { x, y }
    }
}

impl Point<i32> {
    /// Convert this point to floating point coordinates
    #[inline]
    pub fn to_f64(self) -> Point<f64> {
        Point {
            x: self.x as f64,
            y: self.y as f64,
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for Point<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Point")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<N> From<(N, N)> for Point<N> {
    #[inline]
    fn from((x, y): (N, N)) -> Point<N> {
        Point { x, y }
    }
}

impl<N> From<Point<N>> for (N, N) {
    #[inline]
    fn from(point: Point<N>) -> (N, N) {
        (point.x, point.y)
    }
}

/// A size as defined by its width and height
///
/// Window sizes are always given in physical pixels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<N> {
    /// horizontal extent
    pub w: N,
    /// vertical extent
    pub h: N,
}

impl<N> Size<N> {
    /// Create a new size from its extents
    #[inline]
    pub const fn new(w: N, h: N) -> Self {
        Size { w, h }
    }
}

impl Size<u32> {
    /// Whether one of the extents is zero
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Clamp both extents into the range accepted by 16-bit window systems
    #[inline]
    pub fn to_u16_saturating(self) -> Size<u16> {
        Size {
            w: self.w.min(u16::MAX as u32) as u16,
            h: self.h.min(u16::MAX as u32) as u16,
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for Size<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Size")
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

impl<N> From<(N, N)> for Size<N> {
    #[inline]
    fn from((w, h): (N, N)) -> Size<N> {
        Size { w, h }
    }
}

impl<N> From<Size<N>> for (N, N) {
    #[inline]
    fn from(size: Size<N>) -> (N, N) {
        (size.w, size.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_saturates_into_u16() {
        let size = Size::from((70_000u32, 480u32));
        assert_eq!(size.to_u16_saturating(), Size::new(u16::MAX, 480));
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::new(0u32, 10).is_empty());
        assert!(!Size::new(1u32, 1).is_empty());
    }
}
