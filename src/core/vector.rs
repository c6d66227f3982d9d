//! Minimal 3D vector arithmetic over `[f64; 3]`.

#![warn(missing_docs)]

use crate::core::particle::DIM;

/// A 3-vector of reals.
pub type Vec3 = [f64; DIM];

/// The zero vector.
pub const ZERO: Vec3 = [0.0; DIM];

/// Component-wise `a + b`.
#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    let mut out = ZERO;
    for ((o, x), y) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *o = x + y;
    }
    out
}

/// Component-wise `a - b`.
#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    let mut out = ZERO;
    for ((o, x), y) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *o = x - y;
    }
    out
}

/// `a` times the scalar `s`.
#[inline]
pub fn scale(a: Vec3, s: f64) -> Vec3 {
    a.map(|x| x * s)
}

/// Inner product.
#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean length.
#[inline]
pub fn magnitude(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`.
///
/// The zero vector maps to itself so a degenerate direction never produces NaN.
#[inline]
pub fn norm(a: Vec3) -> Vec3 {
    let m = magnitude(a);
    if m == 0.0 {
        return ZERO;
    }
    scale(a, 1.0 / m)
}

/// True when no component is NaN or infinite.
#[inline]
pub fn is_finite(a: Vec3) -> bool {
    a.iter().all(|x| x.is_finite())
}
