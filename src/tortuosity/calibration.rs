use rayon::ThreadPool;
use rayon::prelude::*;

use crate::tortuosity::random_walk::{WalkParams, random_walk};
use crate::tortuosity::walker::{Walker, WalkerStream};
use crate::voxel_grid::void_mask::VoidMask;

/// Calibration free path, in multiples of the largest grid dimension
pub const CALIBRATION_FREE_PATH_FACTOR: f64 = 10_000.0;
/// Calibration walk length, in multiples of the largest grid dimension
pub const CALIBRATION_LENGTH_FACTOR: f64 = 100.0;

/// Outcome of the free-molecular pilot run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptEstimate {
	/// Mean distance between wall collisions in world units; `None` if no wall was hit
	pub mean_intercept_length: Option<f64>,
	/// Total distance walked by active walkers, world units
	pub walked_length: f64,
	pub wall_collisions: u64,
	pub active_walkers: usize,
}

/// Estimate the mean pore size by flying nearly ballistic walkers between walls.
///
/// The free path is set far beyond the domain so almost every direction change
/// is a wall collision; the estimate is walked length over collision count.
pub fn compute_mean_intercept_length(
	pool: &ThreadPool,
	mask: &VoidMask,
	voxel_length: f64,
	mean_velocity: f64,
	walkers: usize,
	seed: u64,
) -> InterceptEstimate {
	let max_dim = mask.dims().into_iter().max().unwrap_or(1) as f64;
	let params = WalkParams {
		voxel_length,
		mean_velocity,
		mean_free_path: CALIBRATION_FREE_PATH_FACTOR * max_dim,
	};
	let length = CALIBRATION_LENGTH_FACTOR * max_dim;

	let tallies: Vec<Option<(f64, u64)>> = pool.install(|| {
		(0..walkers)
			.into_par_iter()
			.map(|index| {
				let mut walker = Walker::spawn(index, seed, WalkerStream::Calibration, mask, params.mean_free_path, mean_velocity);
				random_walk(&mut walker, mask, &params, length);
				if walker.skip {
					None
				} else {
					Some((walker.walk_time * mean_velocity, walker.collision_count))
				}
			})
			.collect()
	});

	// summed in walker order so the estimate does not depend on the thread count
	let mut walked_length = 0.0;
	let mut wall_collisions = 0u64;
	let mut active_walkers = 0usize;
	for (walked, collisions) in tallies.into_iter().flatten() {
		walked_length += walked;
		wall_collisions += collisions;
		active_walkers += 1;
	}

	let mean_intercept_length = if wall_collisions > 0 {
		Some(walked_length / wall_collisions as f64)
	} else {
		None
	};

	log::info!(
		"Calibration: {} walkers, {} wall collisions, mean intercept length {}",
		active_walkers,
		wall_collisions,
		mean_intercept_length.map_or("n/a (no walls hit)".to_string(), |l| format!("{:.6e}", l))
	);

	InterceptEstimate {
		mean_intercept_length,
		walked_length,
		wall_collisions,
		active_walkers,
	}
}
