use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tortuosity::error::SolverResult;
use crate::tortuosity::sampling::{
	sample_exponential, sample_isotropic_direction, sample_lambertian_reflection, surface_normal,
};
use crate::tortuosity::stepper::Axis;
use crate::tortuosity::vec3::{self, Vec3};
use crate::voxel_grid::void_mask::VoidMask;

/// Rejection draws before placement falls back to picking a void voxel directly
const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// How far (voxel units) a position may sit outside its voxel before it counts as drift
const VOXEL_DRIFT_TOLERANCE: f64 = 1e-6;

/// Independent random streams, so two populations never share a trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerStream {
	Calibration = 1,
	Main = 2,
}

/// SplitMix64 finalizer
#[inline]
fn splitmix64(mut z: u64) -> u64 {
	z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
	z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
	z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
	z ^ (z >> 31)
}

/// Seed of one walker's stream; depends only on the run seed, the stream and the walker index
pub fn walker_seed(seed: u64, stream: WalkerStream, index: usize) -> u64 {
	splitmix64(splitmix64(seed ^ ((stream as u64) << 56)) ^ index as u64)
}

/// One random-walk particle
#[derive(Debug, Clone)]
pub struct Walker {
	/// Continuous position in voxel units
	pub position: Vec3,
	/// Voxel containing `position`, updated only on face crossings
	pub voxel: [i64; 3],
	pub direction: Vec3,
	/// Free path drawn at the last collision (voxel units)
	pub delta_r: f64,
	/// Distance walked since the last collision (voxel units)
	pub delta_rw: f64,
	pub velocity: f64,
	/// Accumulated physical time
	pub walk_time: f64,
	/// Wall collisions
	pub collision_count: u64,
	/// Excluded from statistics
	pub skip: bool,
	pub start: Vec3,
	pub rng: StdRng,
}

impl Walker {
	/// Place a walker uniformly inside the void and give it a first direction and free path
	pub fn spawn(
		index: usize,
		seed: u64,
		stream: WalkerStream,
		mask: &VoidMask,
		mean_free_path: f64,
		mean_velocity: f64,
	) -> Self {
		let mut rng = StdRng::seed_from_u64(walker_seed(seed, stream, index));
		let (position, voxel) = match place_in_void(&mut rng, mask) {
			Some(p) => p,
			None => {
				log::warn!("walker {} found no void voxel to start in", index);
				([0.5; 3], [0; 3])
			}
		};

		let mut walker = Self {
			position,
			voxel,
			direction: [1.0, 0.0, 0.0],
			delta_r: 0.0,
			delta_rw: 0.0,
			velocity: mean_velocity,
			walk_time: 0.0,
			collision_count: 0,
			skip: false,
			start: position,
			rng,
		};
		if !mask.is_void_at(voxel) {
			walker.skip = true;
			return walker;
		}
		if let Err(e) = walker.resample_particle_collision(mean_free_path, mean_velocity) {
			log::warn!("walker {} skipped at spawn: {}", index, e);
			walker.skip = true;
		}
		walker
	}

	/// New isotropic direction and free path after a particle-particle collision
	pub fn resample_particle_collision(&mut self, mean_free_path: f64, mean_velocity: f64) -> SolverResult<()> {
		self.direction = sample_isotropic_direction(&mut self.rng)?;
		self.delta_r = sample_exponential(&mut self.rng, mean_free_path);
		self.delta_rw = 0.0;
		self.velocity = mean_velocity;
		Ok(())
	}

	/// Diffuse reflection off the wall crossed on `axis`, plus a new free path
	pub fn resample_surface_collision(&mut self, axis: Axis, mean_free_path: f64, mean_velocity: f64) -> SolverResult<()> {
		let normal = surface_normal(axis, self.direction);
		self.direction = sample_lambertian_reflection(&mut self.rng, normal, self.direction, mean_velocity)?;
		self.delta_r = sample_exponential(&mut self.rng, mean_free_path);
		self.delta_rw = 0.0;
		self.velocity = mean_velocity;
		Ok(())
	}

	/// Move `distance` voxel units along the current direction without crossing a face
	#[inline]
	pub fn advance(&mut self, distance: f64) {
		self.position = vec3::add(self.position, vec3::scale(self.direction, distance));
		self.delta_rw += distance;
	}

	/// Displacement from the start position, voxel units
	pub fn displacement(&self) -> Vec3 {
		vec3::sub(self.position, self.start)
	}

	/// Position still lies inside (or on the faces of) the tracked voxel
	pub fn voxel_consistent(&self) -> bool {
		(0..3).all(|a| {
			let lo = self.voxel[a] as f64 - VOXEL_DRIFT_TOLERANCE;
			let hi = (self.voxel[a] + 1) as f64 + VOXEL_DRIFT_TOLERANCE;
			self.position[a].is_finite() && self.position[a] >= lo && self.position[a] <= hi
		})
	}
}

/// Uniform position inside the void, never exactly on a grid line
fn place_in_void<R: Rng + ?Sized>(rng: &mut R, mask: &VoidMask) -> Option<(Vec3, [i64; 3])> {
	let dims = mask.dims();

	for _ in 0..MAX_PLACEMENT_ATTEMPTS {
		let position = [
			rng.random::<f64>() * dims[0] as f64,
			rng.random::<f64>() * dims[1] as f64,
			rng.random::<f64>() * dims[2] as f64,
		];
		if position.iter().any(|&p| p == p.floor()) {
			continue;
		}
		let voxel = [position[0] as i64, position[1] as i64, position[2] as i64];
		if mask.is_void_at(voxel) {
			return Some((position, voxel));
		}
	}

	// sparse void: pick a void voxel directly, then a point inside it
	let count = mask.count_void();
	if count == 0 {
		return None;
	}
	let index = mask.void_indices().nth(rng.random_range(0..count))?;
	let voxel = mask.index_to_voxel(index);
	let mut position = [0.0; 3];
	for a in 0..3 {
		let mut offset = rng.random::<f64>();
		while offset == 0.0 {
			offset = rng.random::<f64>();
		}
		position[a] = voxel[a] as f64 + offset;
	}
	Some((position, voxel))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_grid::grid::Grid3D;
	use crate::voxel_grid::void_mask::VoidCutoff;

	#[test]
	fn seeds_depend_on_index_and_stream() {
		let a = walker_seed(7, WalkerStream::Main, 0);
		assert_eq!(a, walker_seed(7, WalkerStream::Main, 0));
		assert_ne!(a, walker_seed(7, WalkerStream::Main, 1));
		assert_ne!(a, walker_seed(7, WalkerStream::Calibration, 0));
		assert_ne!(a, walker_seed(8, WalkerStream::Main, 0));
	}

	#[test]
	fn spawned_walkers_start_in_the_void() {
		let mut grid = Grid3D::new(6, 6, 6, 1.0);
		grid.fill(255);
		grid.set_voxel_ijk(2, 3, 4, 0);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		for index in 0..50 {
			let w = Walker::spawn(index, 1, WalkerStream::Main, &mask, 1.0, 1.0);
			assert!(!w.skip);
			assert_eq!(w.voxel, [2, 3, 4]);
			assert!(w.voxel_consistent());
			assert!(w.position.iter().all(|&p| p != p.floor()));
			assert!((vec3::norm(w.direction) - 1.0).abs() < 1e-12);
			assert!(w.delta_r >= 0.0);
			assert_eq!(w.start, w.position);
		}
	}

	#[test]
	fn same_index_same_walker() {
		let grid = Grid3D::new(5, 5, 5, 1.0);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let a = Walker::spawn(42, 9, WalkerStream::Main, &mask, 2.0, 1.0);
		let b = Walker::spawn(42, 9, WalkerStream::Main, &mask, 2.0, 1.0);
		assert_eq!(a.position, b.position);
		assert_eq!(a.direction, b.direction);
		assert_eq!(a.delta_r, b.delta_r);
	}

	#[test]
	fn surface_collision_turns_back_into_the_void() {
		let grid = Grid3D::new(5, 5, 5, 1.0);
		let mask = VoidMask::from_grid(&grid, VoidCutoff::id(0));
		let mut w = Walker::spawn(0, 3, WalkerStream::Main, &mask, 1.0, 1.0);
		w.direction = vec3::normalize([0.2, 0.9, -0.1]).unwrap();
		w.delta_rw = 0.7;
		w.resample_surface_collision(Axis::Y, 1.0, 1.0).unwrap();
		assert!(w.direction[1] < 0.0);
		assert_eq!(w.delta_rw, 0.0);
	}
}
