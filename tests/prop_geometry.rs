//! Property tests for index reflection, the voxel stepper and direction sampling.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use voxel_tortuosity::tortuosity::sampling::{
	sample_exponential, sample_isotropic_direction, sample_lambertian_reflection, surface_normal,
};
use voxel_tortuosity::tortuosity::stepper::{Axis, next_edge_intersection};
use voxel_tortuosity::tortuosity::vec3;
use voxel_tortuosity::voxel_grid::grid::Grid3D;
use voxel_tortuosity::voxel_grid::utils::reflect_index;

/// Exit distance of a ray from the unit box at `voxel` by the slab method
fn brute_force_exit(position: [f64; 3], direction: [f64; 3], voxel: [i64; 3]) -> (f64, usize) {
	let mut best = (f64::INFINITY, 0);
	for a in 0..3 {
		let lo = (voxel[a] as f64 - position[a]) / direction[a];
		let hi = (voxel[a] as f64 + 1.0 - position[a]) / direction[a];
		let t = lo.max(hi);
		if t < best.0 {
			best = (t, a);
		}
	}
	best
}

fn component() -> impl Strategy<Value = f64> {
	prop_oneof![-1.0..-1e-3f64, 1e-3..1.0f64]
}

proptest! {
	#[test]
	fn reflected_index_is_in_range(i in -1_000_000i64..1_000_000, n in 1usize..64) {
		let r = reflect_index(i, n);
		prop_assert!(r < n);
		prop_assert_eq!(reflect_index(r as i64, n), r);
		prop_assert_eq!(reflect_index(i + 2 * n as i64, n), r);
		prop_assert_eq!(reflect_index(-1 - i, n), r);
	}

	#[test]
	fn material_lookup_is_reflection_invariant(
		data in proptest::collection::vec(any::<u8>(), 60),
		i in -50i64..50, j in -50i64..50, k in -50i64..50,
	) {
		let grid = Grid3D::from_data(3, 4, 5, 1.0, data).unwrap();
		let value = grid.material_at(i, j, k);
		let (ri, rj, rk) = (reflect_index(i, 3), reflect_index(j, 4), reflect_index(k, 5));
		prop_assert_eq!(value, grid.get_voxel_ijk(ri, rj, rk));
		prop_assert_eq!(grid.material_at(ri as i64, rj as i64, rk as i64), value);
	}

	#[test]
	fn stepper_matches_slab_intersection(
		voxel in proptest::array::uniform3(-20i64..20),
		frac in proptest::array::uniform3(0.01..0.99f64),
		raw in proptest::array::uniform3(component()),
	) {
		let direction = vec3::normalize(raw).unwrap();
		let position = [voxel[0] as f64 + frac[0], voxel[1] as f64 + frac[1], voxel[2] as f64 + frac[2]];
		let hit = next_edge_intersection(position, direction, voxel).unwrap();
		let (expected, expected_axis) = brute_force_exit(position, direction, voxel);

		prop_assert!((hit.distance - expected).abs() < 1e-9 * expected.max(1.0));
		let a = hit.axis.index();
		// near-ties may pick either face
		if a != expected_axis {
			let lo = (voxel[expected_axis] as f64 - position[expected_axis]) / direction[expected_axis];
			let hi = (voxel[expected_axis] as f64 + 1.0 - position[expected_axis]) / direction[expected_axis];
			prop_assert!((lo.max(hi) - hit.distance).abs() < 1e-9);
		}
		let face = (if direction[a] > 0.0 { voxel[a] + 1 } else { voxel[a] }) as f64;
		prop_assert_eq!(hit.point[a], face);
		for b in 0..3 {
			prop_assert!(hit.point[b] >= voxel[b] as f64 - 1e-9);
			prop_assert!(hit.point[b] <= voxel[b] as f64 + 1.0 + 1e-9);
		}
	}

	#[test]
	fn sampled_directions_are_finite_units(seed in any::<u64>(), axis in 0usize..3, raw in proptest::array::uniform3(component())) {
		let mut rng = StdRng::seed_from_u64(seed);
		let dir = sample_isotropic_direction(&mut rng).unwrap();
		prop_assert!((vec3::norm(dir) - 1.0).abs() < 1e-12);
		prop_assert!(!vec3::has_zero_component(dir));

		let free = sample_exponential(&mut rng, 2.0);
		prop_assert!(free.is_finite() && free >= 0.0);

		let incoming = vec3::normalize(raw).unwrap();
		let normal = surface_normal(Axis::ALL[axis], incoming);
		let out = sample_lambertian_reflection(&mut rng, normal, incoming, 1.0).unwrap();
		prop_assert!((vec3::norm(out) - 1.0).abs() < 1e-12);
		prop_assert!(vec3::dot(out, normal) > 0.0);
		prop_assert!(out.iter().all(|c| c.is_finite() && *c != 0.0));
	}
}
