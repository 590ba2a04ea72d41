use std::ops::{Add, Mul, Sub};

/// Position in canvas coordinates, relative to the parent's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos<T> {
    pub x: T,
    pub y: T,
}

impl<T> Pos<T> {
    pub fn new(x: T, y: T) -> Self {
        Pos { x, y }
    }
}

impl Pos<f32> {
    pub const ZERO: Self = Pos { x: 0.0, y: 0.0 };

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Pos::new(self.x + dx, self.y + dy)
    }
}

impl<T: Add<Output = T>> Add for Pos<T> {
    type Output = Pos<T>;

    fn add(self, rhs: Pos<T>) -> Self::Output {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Sub<Output = T>> Sub for Pos<T> {
    type Output = Pos<T>;

    fn sub(self, rhs: Pos<T>) -> Self::Output {
        Pos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }
}

impl Size<f32> {
    pub const ZERO: Self = Size {
        width: 0.0,
        height: 0.0,
    };

    /// The "not yet laid out" sentinel used by the refresh protocol.
    pub fn is_zero(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Component-wise maximum of two sizes.
    pub fn max(self, other: Size<f32>) -> Size<f32> {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

impl<T: Add<Output = T>> Add for Size<T> {
    type Output = Size<T>;

    fn add(self, rhs: Size<T>) -> Self::Output {
        Size::new(self.width + rhs.width, self.height + rhs.height)
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

impl Rect<f32> {
    pub fn from_parts(position: Pos<f32>, size: Size<f32>) -> Self {
        Rect::new(position.x, position.y, size.width, size.height)
    }

    pub fn contains(&self, point: Pos<f32>) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn position(&self) -> Pos<f32> {
        Pos::new(self.x, self.y)
    }

    pub fn size(&self) -> Size<f32> {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_arithmetic() {
        let a = Pos::new(1.0, 2.0);
        let b = Pos::new(3.0, 4.0);
        assert_eq!(a + b, Pos::new(4.0, 6.0));
        assert_eq!(b - a, Pos::new(2.0, 2.0));
        assert_eq!(a.translated(0.5, -0.5), Pos::new(1.5, 1.5));
    }

    #[test]
    fn test_size_max() {
        let a = Size::new(10.0, 2.0);
        let b = Size::new(4.0, 8.0);
        assert_eq!(a.max(b), Size::new(10.0, 8.0));
    }

    #[test]
    fn test_size_zero_sentinel() {
        assert!(Size::ZERO.is_zero());
        assert!(!Size::new(0.0, 1.0).is_zero());
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Pos::new(10.0, 10.0)));
        assert!(r.contains(Pos::new(30.0, 30.0)));
        assert!(!r.contains(Pos::new(30.1, 30.0)));
        assert!(!r.contains(Pos::new(9.9, 15.0)));
    }
}
