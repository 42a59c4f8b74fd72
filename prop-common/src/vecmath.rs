use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use crate::coord_ops::{self, Coord};

/// A 2D vector passed by value.
///
/// Converts to and from [`Coord`] for use with the in-place functions in [`coord_ops`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2.
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Creates a zero vector.
    pub fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    /// Runs an in-place coordinate function on a copy and stores the result back.
    fn update<F: FnOnce(&mut Coord)>(&mut self, f: F) {
        let mut c: Coord = (*self).into();
        f(&mut c);
        *self = c.into();
    }

    /// Calculates the squared length (magnitude) of the vector.
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Calculates the length (magnitude) of the vector.
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Calculates the dot product with another vector.
    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Calculates the squared distance to another vector (point).
    pub fn distance_squared(&self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Calculates the distance to another vector (point).
    pub fn distance(&self, other: Vec2) -> f32 {
        coord_ops::dist(&(*self).into(), &other.into())
    }

    /// Adds another vector to this vector.
    pub fn add(&self, other: Vec2) -> Self {
        let mut out = *self;
        out += other;
        out
    }

    /// Subtracts another vector from this vector.
    pub fn sub(&self, other: Vec2) -> Self {
        let mut out = *self;
        out -= other;
        out
    }

    /// Component-wise product.
    pub fn mul(&self, other: Vec2) -> Self {
        let mut out = *self;
        out *= other;
        out
    }

    /// Component-wise quotient. Zero components in `other` give IEEE-754 results.
    pub fn div(&self, other: Vec2) -> Self {
        let mut out = *self;
        out /= other;
        out
    }

    /// Scales the vector by a scalar value.
    pub fn scale(&self, scalar: f32) -> Self {
        let mut out = *self;
        out *= scalar;
        out
    }

    /// Divides both components by a scalar value.
    pub fn div_scalar(&self, scalar: f32) -> Self {
        let mut out = *self;
        out /= scalar;
        out
    }
}

impl From<Coord> for Vec2 {
    fn from(c: Coord) -> Self {
        Vec2::new(c[0], c[1])
    }
}

impl From<Vec2> for Coord {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vec2::new(x, y)
    }
}

impl From<Vec2> for (f32, f32) {
    fn from(v: Vec2) -> Self {
        (v.x, v.y)
    }
}

// Operators delegate to the in-place functions so both surfaces share one implementation
impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.update(|c| coord_ops::add(c, &other.into()));
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, other: Self) {
        self.update(|c| coord_ops::subtract(c, &other.into()));
    }
}

impl MulAssign for Vec2 {
    fn mul_assign(&mut self, other: Self) {
        self.update(|c| coord_ops::multiply(c, &other.into()));
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, scalar: f32) {
        self.update(|c| coord_ops::factor(c, scalar));
    }
}

impl DivAssign for Vec2 {
    fn div_assign(&mut self, other: Self) {
        self.update(|c| coord_ops::divide(c, &other.into()));
    }
}

impl DivAssign<f32> for Vec2 {
    fn div_assign(&mut self, scalar: f32) {
        self.update(|c| coord_ops::divisor(c, scalar));
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Vec2::add(&self, other)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Vec2::sub(&self, other)
    }
}

impl Mul for Vec2 {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Vec2::mul(&self, other)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        self.scale(scalar)
    }
}

impl Div for Vec2 {
    type Output = Self;
    fn div(self, other: Self) -> Self {
        Vec2::div(&self, other)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        self.div_scalar(scalar)
    }
}
