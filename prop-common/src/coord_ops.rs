//! In-place arithmetic on caller-owned `[f32; 2]` coordinates.
//!
//! Every mutating function writes its result into the first argument and
//! returns nothing. None of them allocate or keep a reference past the call.
//! Division follows IEEE-754: dividing by zero yields infinity (or NaN for 0/0)
//! and is not treated as an error.

/// A coordinate as stored in caller memory: `[x, y]`.
pub type Coord = [f32; 2];

/// `coord1 += coord2`, component-wise.
#[inline(always)]
pub fn add(coord1: &mut Coord, coord2: &Coord) {
    coord1[0] += coord2[0];
    coord1[1] += coord2[1];
}

/// `coord1 -= coord2`, component-wise.
#[inline(always)]
pub fn subtract(coord1: &mut Coord, coord2: &Coord) {
    coord1[0] -= coord2[0];
    coord1[1] -= coord2[1];
}

/// `coord1 *= coord2`, component-wise.
#[inline(always)]
pub fn multiply(coord1: &mut Coord, coord2: &Coord) {
    coord1[0] *= coord2[0];
    coord1[1] *= coord2[1];
}

/// Scales both components by `factor`.
#[inline(always)]
pub fn factor(coord: &mut Coord, factor: f32) {
    coord[0] *= factor;
    coord[1] *= factor;
}

/// `coord1 /= coord2`, component-wise.
#[inline(always)]
pub fn divide(coord1: &mut Coord, coord2: &Coord) {
    coord1[0] /= coord2[0];
    coord1[1] /= coord2[1];
}

/// Divides both components by `divisor`.
#[inline(always)]
pub fn divisor(coord: &mut Coord, divisor: f32) {
    coord[0] /= divisor;
    coord[1] /= divisor;
}

/// Euclidean distance between the two points.
#[inline(always)]
pub fn dist(coord1: &Coord, coord2: &Coord) -> f32 {
    let dx = coord2[0] - coord1[0];
    let dy = coord2[1] - coord1[1];
    (dx * dx + dy * dy).sqrt()
}
