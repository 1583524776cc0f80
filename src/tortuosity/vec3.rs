//! Minimal helpers over `[f64; 3]`. Arrays keep per-axis code indexable by `Axis`.

pub type Vec3 = [f64; 3];

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
	a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
	[
		a[1] * b[2] - a[2] * b[1],
		a[2] * b[0] - a[0] * b[2],
		a[0] * b[1] - a[1] * b[0],
	]
}

#[inline]
pub fn norm(a: Vec3) -> f64 {
	dot(a, a).sqrt()
}

#[inline]
pub fn scale(a: Vec3, s: f64) -> Vec3 {
	[a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
	[a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
	[a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Unit vector along `a`, or `None` when its length is zero or not finite
#[inline]
pub fn normalize(a: Vec3) -> Option<Vec3> {
	let len = norm(a);
	if len > 0.0 && len.is_finite() {
		Some(scale(a, 1.0 / len))
	} else {
		None
	}
}

/// True when any component is exactly zero
#[inline]
pub fn has_zero_component(a: Vec3) -> bool {
	a.iter().any(|&c| c == 0.0)
}
