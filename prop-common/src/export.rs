//! Raw pointer entry points for a host that owns the coordinate memory.
//!
//! With the `wasm-export` feature these are emitted under their plain names
//! (`add`, `subtract`, ...) so the host can resolve them after dead-code
//! elimination. Without it they are ordinary `extern "C"` functions and behave
//! identically.
//!
//! # Safety
//!
//! Every pointer must be non-null, aligned for `f32` and point at two readable
//! floats (two writable floats for the first argument of a mutating function)
//! for the duration of the call. The host must not mutate the same coordinate
//! from another thread during the call. The first and second arguments may
//! point at the same coordinate.

use crate::coord_ops::{self, Coord};

#[inline(always)]
unsafe fn read(ptr: *const f32) -> Coord {
    [*ptr, *ptr.add(1)]
}

#[inline(always)]
unsafe fn target<'a>(ptr: *mut f32) -> &'a mut Coord {
    &mut *(ptr as *mut Coord)
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn add(coord1: *mut f32, coord2: *const f32) {
    let operand = read(coord2);
    coord_ops::add(target(coord1), &operand);
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn subtract(coord1: *mut f32, coord2: *const f32) {
    let operand = read(coord2);
    coord_ops::subtract(target(coord1), &operand);
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn multiply(coord1: *mut f32, coord2: *const f32) {
    let operand = read(coord2);
    coord_ops::multiply(target(coord1), &operand);
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn factor(coord: *mut f32, factor: f32) {
    coord_ops::factor(target(coord), factor);
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn divide(coord1: *mut f32, coord2: *const f32) {
    let operand = read(coord2);
    coord_ops::divide(target(coord1), &operand);
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn divisor(coord: *mut f32, divisor: f32) {
    coord_ops::divisor(target(coord), divisor);
}

/// # Safety
/// See the module documentation.
#[cfg_attr(feature = "wasm-export", no_mangle)]
pub unsafe extern "C" fn dist(coord1: *const f32, coord2: *const f32) -> f32 {
    coord_ops::dist(&read(coord1), &read(coord2))
}
