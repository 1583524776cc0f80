use thiserror::Error;

use crate::tortuosity::error::TortuosityError;
use crate::tortuosity::stepper::next_edge_intersection;
use crate::tortuosity::walker::Walker;
use crate::voxel_grid::void_mask::VoidMask;

/// Physical constants shared by every walker of one population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
	/// World units per voxel edge
	pub voxel_length: f64,
	pub mean_velocity: f64,
	/// Voxel units
	pub mean_free_path: f64,
}

impl WalkParams {
	/// Time needed to cover `distance` voxel units at `velocity`
	#[inline]
	fn time_for(&self, distance: f64, velocity: f64) -> f64 {
		distance * self.voxel_length / velocity
	}

	/// Voxel units covered in `time` at `velocity`
	#[inline]
	fn distance_for(&self, time: f64, velocity: f64) -> f64 {
		time * velocity / self.voxel_length
	}

	/// Physical time budget for a walk of `length` voxel units at the mean velocity
	#[inline]
	pub fn time_budget(&self, length: f64) -> f64 {
		length * self.voxel_length / self.mean_velocity
	}
}

/// Internal faults that end a single walker's trajectory
#[derive(Error, Debug)]
enum WalkFault {
	#[error("no voxel face ahead of direction {0:?}")]
	NoIntersection([f64; 3]),

	#[error("position {position:?} drifted out of voxel {voxel:?}")]
	VoxelDrift { position: [f64; 3], voxel: [i64; 3] },

	#[error(transparent)]
	Resample(#[from] TortuosityError),
}

/// Advance `walker` until its accumulated time reaches the budget of a walk of
/// `target_length` voxel units (cumulative over calls).
///
/// A walker that hits an internal fault is marked `skip` and left where it is.
pub fn random_walk(walker: &mut Walker, mask: &VoidMask, params: &WalkParams, target_length: f64) {
	if walker.skip {
		return;
	}
	let time_budget = params.time_budget(target_length);

	while walker.walk_time < time_budget {
		if let Err(fault) = step_until_wall(walker, mask, params, time_budget) {
			log::warn!("walker skipped: {}", fault);
			walker.skip = true;
			return;
		}
	}

	if !walker.voxel_consistent() {
		log::warn!(
			"walker skipped: {}",
			WalkFault::VoxelDrift { position: walker.position, voxel: walker.voxel }
		);
		walker.skip = true;
	}
}

/// Step face to face until the walker hits a wall or runs out of time
fn step_until_wall(walker: &mut Walker, mask: &VoidMask, params: &WalkParams, time_budget: f64) -> Result<(), WalkFault> {
	loop {
		let hit = next_edge_intersection(walker.position, walker.direction, walker.voxel)
			.ok_or(WalkFault::NoIntersection(walker.direction))?;

		let free_left = (walker.delta_r - walker.delta_rw).max(0.0);
		if hit.distance > free_left {
			// free path runs out before the face: particle-particle collision
			let segment_time = params.time_for(free_left, walker.velocity);
			if walker.walk_time + segment_time > time_budget {
				truncate_at_budget(walker, params, time_budget);
				return Ok(());
			}
			walker.advance(free_left);
			walker.walk_time += segment_time;
			walker.resample_particle_collision(params.mean_free_path, params.mean_velocity)?;
			continue;
		}

		let segment_time = params.time_for(hit.distance, walker.velocity);
		if walker.walk_time + segment_time > time_budget {
			truncate_at_budget(walker, params, time_budget);
			return Ok(());
		}
		walker.position = hit.point;
		walker.delta_rw += hit.distance;
		walker.walk_time += segment_time;

		let a = hit.axis.index();
		let mut next = walker.voxel;
		next[a] += if walker.direction[a] > 0.0 { 1 } else { -1 };
		let crossed = mask.is_void_at(next);
		if crossed {
			walker.voxel = next;
		}
		if !walker.voxel_consistent() {
			return Err(WalkFault::VoxelDrift { position: walker.position, voxel: walker.voxel });
		}
		if crossed {
			continue;
		}

		walker.resample_surface_collision(hit.axis, params.mean_free_path, params.mean_velocity)?;
		walker.collision_count += 1;
		return Ok(());
	}
}

/// Walk exactly the time left in the budget, stopping inside the current voxel
fn truncate_at_budget(walker: &mut Walker, params: &WalkParams, time_budget: f64) {
	let remaining = (time_budget - walker.walk_time).max(0.0);
	walker.advance(params.distance_for(remaining, walker.velocity));
	walker.walk_time = time_budget;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tortuosity::vec3;
	use crate::tortuosity::walker::WalkerStream;
	use crate::voxel_grid::grid::Grid3D;
	use crate::voxel_grid::void_mask::VoidCutoff;

	fn params(mean_free_path: f64) -> WalkParams {
		WalkParams { voxel_length: 0.5, mean_velocity: 2.0, mean_free_path }
	}

	fn walker_at(mask: &VoidMask, position: [f64; 3], direction: [f64; 3], delta_r: f64) -> Walker {
		let mut w = Walker::spawn(0, 1, WalkerStream::Main, mask, 1.0, 2.0);
		w.position = position;
		w.start = position;
		w.voxel = [position[0] as i64, position[1] as i64, position[2] as i64];
		w.direction = vec3::normalize(direction).unwrap();
		w.delta_r = delta_r;
		w.delta_rw = 0.0;
		w
	}

	#[test]
	fn walk_time_stops_exactly_at_the_budget() {
		let grid = Grid3D::new(8, 8, 8, 0.5);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let p = params(1.0);
		let mut w = walker_at(&mask, [4.5, 4.5, 4.5], [0.3, 0.5, 0.7], 1.0);
		random_walk(&mut w, &mask, &p, 37.3);
		assert!(!w.skip);
		assert_eq!(w.walk_time, p.time_budget(37.3));
		random_walk(&mut w, &mask, &p, 80.0);
		assert_eq!(w.walk_time, p.time_budget(80.0));
		assert_eq!(w.collision_count, 0);
		assert!(w.voxel_consistent());
	}

	#[test]
	fn ballistic_flight_ends_inside_a_voxel() {
		let grid = Grid3D::new(8, 8, 8, 0.5);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let p = params(1e9);
		let mut w = walker_at(&mask, [1.5, 1.5, 1.5], [1.0, 1e-9, 1e-9], 1e9);
		random_walk(&mut w, &mask, &p, 2.25);
		// straight line, so displacement equals the walked length
		assert!((w.position[0] - 3.75).abs() < 1e-9);
		assert_eq!(w.voxel[0], 3);
		assert!((w.delta_rw - 2.25).abs() < 1e-9);
	}

	#[test]
	fn walker_leaves_the_grid_into_mirrored_space() {
		let grid = Grid3D::new(4, 4, 4, 0.5);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let p = params(1e9);
		let mut w = walker_at(&mask, [3.5, 1.5, 1.5], [1.0, 1e-9, 1e-9], 1e9);
		random_walk(&mut w, &mask, &p, 10.0);
		assert!((w.position[0] - 13.5).abs() < 1e-9);
		assert_eq!(w.voxel[0], 13);
		assert_eq!(w.collision_count, 0);
	}

	#[test]
	fn solid_neighbour_reflects_the_walker() {
		let mut grid = Grid3D::new(3, 3, 3, 0.5);
		grid.fill(255);
		grid.set_voxel_ijk(1, 1, 1, 0);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let p = params(1e9);
		let mut w = walker_at(&mask, [1.5, 1.5, 1.5], [1.0, 0.01, 0.01], 1e9);
		random_walk(&mut w, &mask, &p, 50.0);
		assert!(!w.skip);
		assert!(w.collision_count > 10);
		assert_eq!(w.voxel, [1, 1, 1]);
		for a in 0..3 {
			assert!(w.position[a] >= 1.0 - 1e-9 && w.position[a] <= 2.0 + 1e-9);
		}
	}

	#[test]
	fn free_path_exhaustion_resamples_direction() {
		let grid = Grid3D::new(8, 8, 8, 0.5);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let p = params(0.05);
		let mut w = walker_at(&mask, [4.5, 4.5, 4.5], [0.3, 0.5, 0.7], 0.1);
		let first = w.direction;
		random_walk(&mut w, &mask, &p, 0.2);
		assert_ne!(w.direction, first);
		assert!(w.delta_rw <= w.delta_r + 1e-12);
	}

	#[test]
	fn drift_is_caught_at_the_first_face() {
		let grid = Grid3D::new(8, 8, 8, 0.5);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let p = params(1e9);
		let mut w = walker_at(&mask, [4.5, 4.5, 4.5], [1.0, 1e-9, 1e-9], 1e9);
		// voxel index disagrees with the position along y
		w.voxel = [4, 7, 4];
		random_walk(&mut w, &mask, &p, 10.0);
		assert!(w.skip);
		assert_eq!(w.voxel, [5, 7, 4]);
		assert!((w.delta_rw - 0.5).abs() < 1e-9);
		assert!(w.walk_time < p.time_budget(10.0));
	}

	#[test]
	fn degenerate_direction_marks_the_walker_skipped() {
		let grid = Grid3D::new(4, 4, 4, 0.5);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let mut w = walker_at(&mask, [1.5, 1.5, 1.5], [1.0, 0.0, 0.0], 10.0);
		w.direction = [0.0; 3];
		random_walk(&mut w, &mask, &params(1.0), 5.0);
		assert!(w.skip);
		assert_eq!(w.walk_time, 0.0);
	}
}
