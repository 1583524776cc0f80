use crate::tortuosity::vec3::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
	X,
	Y,
	Z,
}

impl Axis {
	pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

	#[inline]
	pub fn index(self) -> usize {
		match self {
			Axis::X => 0,
			Axis::Y => 1,
			Axis::Z => 2,
		}
	}
}

/// First face of the current voxel hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeIntersection {
	/// Crossing point, exact on the crossed axis
	pub point: Vec3,
	/// Distance along the (unit) direction, in voxel units
	pub distance: f64,
	pub axis: Axis,
}

/// Next voxel-face crossing of the ray `position + t * direction` leaving `voxel`.
///
/// Axes with a zero direction component never hit a face and are skipped.
/// A slightly negative `t` from round-off (position a hair past a face) is
/// treated as 0, so the face is crossed in place instead of being missed.
/// Equal distances resolve x, then y, then z. Returns `None` only when every
/// direction component is zero.
pub fn next_edge_intersection(position: Vec3, direction: Vec3, voxel: [i64; 3]) -> Option<EdgeIntersection> {
	let mut best: Option<(Axis, f64, f64)> = None;

	for axis in Axis::ALL {
		let a = axis.index();
		let d = direction[a];
		if d == 0.0 || !d.is_finite() {
			continue;
		}
		let face = (if d > 0.0 { voxel[a] + 1 } else { voxel[a] }) as f64;
		let t = ((face - position[a]) / d).max(0.0);
		match best {
			Some((_, best_t, _)) if t >= best_t => {}
			_ => best = Some((axis, t, face)),
		}
	}

	let (axis, distance, face) = best?;
	let mut point = [
		position[0] + distance * direction[0],
		position[1] + distance * direction[1],
		position[2] + distance * direction[2],
	];
	point[axis.index()] = face;

	Some(EdgeIntersection { point, distance, axis })
}
