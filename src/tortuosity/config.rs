use std::thread;

use crate::tortuosity::error::{SolverResult, TortuosityError};
use crate::voxel_grid::grid::Grid3D;
use crate::voxel_grid::void_mask::VoidCutoff;

/// Walk lengths at or below this many voxels are replaced by `AUTO_LENGTH_FACTOR * max(X,Y,Z)`
pub const AUTO_LENGTH_THRESHOLD: f64 = 1.0;
pub const AUTO_LENGTH_FACTOR: f64 = 100.0;

/// How the mean free path between particle-particle collisions is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FreePathMode {
	/// Mean free path given directly, in voxel units (cuberille variant)
	Prescribed(f64),
	/// Mean free path = `knudsen * mean intercept length` from the calibration run
	Continuum { knudsen: f64 },
}

impl Default for FreePathMode {
	fn default() -> Self {
		FreePathMode::Prescribed(1.0)
	}
}

/// Inputs of a particle tortuosity run
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleTortuosityConfig {
	pub void_cutoff: VoidCutoff,
	pub particles: usize,
	pub free_path: FreePathMode,
	/// Mean thermal speed in world units per unit time
	pub mean_velocity: f64,
	pub seed: u64,
	/// Walk length per walker in voxel units
	pub total_length: f64,
	/// 0 means one thread per core
	pub threads: usize,
	pub calibration_particles: usize,
	pub show_progress: bool,
}

impl Default for ParticleTortuosityConfig {
	fn default() -> Self {
		Self {
			void_cutoff: VoidCutoff::default(),
			particles: 20_000,
			free_path: FreePathMode::default(),
			mean_velocity: 1.0,
			seed: 1,
			total_length: 0.0,
			threads: 0,
			calibration_particles: 5000,
			show_progress: false,
		}
	}
}

fn positive_finite(value: f64) -> bool {
	value.is_finite() && value > 0.0
}

impl ParticleTortuosityConfig {
	/// Check the configuration against `grid` before any walker is created
	pub fn validate(&self, grid: &Grid3D) -> SolverResult<()> {
		let fail = |msg: String| -> SolverResult<()> { Err(TortuosityError::InvalidConfig(msg)) };

		if grid.is_empty() {
			return fail(format!("grid {}x{}x{} has no voxels", grid.len_i, grid.len_j, grid.len_k));
		}
		if !positive_finite(grid.voxel_length) {
			return fail(format!("voxel length must be positive, got {}", grid.voxel_length));
		}
		if !self.void_cutoff.is_valid() {
			return fail(format!(
				"void cutoff [{}, {}] must satisfy 0 <= low <= high <= 255",
				self.void_cutoff.low, self.void_cutoff.high
			));
		}
		if self.particles == 0 {
			return fail("number of particles must be positive".to_string());
		}
		if self.calibration_particles == 0 {
			return fail("number of calibration particles must be positive".to_string());
		}
		if u32::try_from(self.particles.max(self.calibration_particles)).is_err() {
			return fail(format!("particle count {} is too large", self.particles));
		}
		if !positive_finite(self.mean_velocity) {
			return fail(format!("mean velocity must be positive, got {}", self.mean_velocity));
		}
		match self.free_path {
			FreePathMode::Prescribed(mfp) if !positive_finite(mfp) => {
				return fail(format!("mean free path must be positive, got {}", mfp));
			}
			FreePathMode::Continuum { knudsen } if !positive_finite(knudsen) => {
				return fail(format!("knudsen number must be positive, got {}", knudsen));
			}
			_ => {}
		}
		if !self.total_length.is_finite() || self.total_length < 0.0 {
			return fail(format!("total walk length must be non-negative, got {}", self.total_length));
		}
		Ok(())
	}

	/// Walk length per walker in voxels, with the automatic default applied.
	///
	/// In continuum mode the automatic length is divided by the calibrated
	/// `mean_free_path` (voxels) when that is below one voxel, so walk length
	/// times free path, and with it the spread of the walkers, matches the
	/// unit free path default. An explicit length is always used as given.
	pub fn effective_total_length(&self, grid: &Grid3D, mean_free_path: f64) -> f64 {
		if self.total_length > AUTO_LENGTH_THRESHOLD {
			return self.total_length;
		}
		let base = AUTO_LENGTH_FACTOR * grid.max_dimension() as f64;
		match self.free_path {
			FreePathMode::Continuum { .. } if positive_finite(mean_free_path) => base / mean_free_path.min(1.0),
			_ => base,
		}
	}

	/// Worker threads to use, clamped to the available hardware concurrency
	pub fn effective_threads(&self) -> usize {
		let available = thread::available_parallelism()
			.map(|n| n.get())
			.unwrap_or(1);
		if self.threads == 0 || self.threads > available {
			available
		} else {
			self.threads
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grid() -> Grid3D {
		Grid3D::new(10, 10, 10, 1e-6)
	}

	#[test]
	fn default_config_is_valid() {
		assert_eq!(ParticleTortuosityConfig::default().validate(&grid()), Ok(()));
	}

	#[test]
	fn rejects_bad_values() {
		let g = grid();
		let cases = [
			ParticleTortuosityConfig { particles: 0, ..Default::default() },
			ParticleTortuosityConfig { mean_velocity: 0.0, ..Default::default() },
			ParticleTortuosityConfig { mean_velocity: f64::NAN, ..Default::default() },
			ParticleTortuosityConfig { free_path: FreePathMode::Prescribed(-1.0), ..Default::default() },
			ParticleTortuosityConfig { free_path: FreePathMode::Continuum { knudsen: 0.0 }, ..Default::default() },
			ParticleTortuosityConfig { total_length: -5.0, ..Default::default() },
			ParticleTortuosityConfig { void_cutoff: VoidCutoff::new(200, 100), ..Default::default() },
			ParticleTortuosityConfig { void_cutoff: VoidCutoff::new(0, 300), ..Default::default() },
			ParticleTortuosityConfig { calibration_particles: 0, ..Default::default() },
		];
		for config in cases {
			assert!(
				matches!(config.validate(&g), Err(TortuosityError::InvalidConfig(_))),
				"accepted {:?}",
				config
			);
		}
	}

	#[test]
	fn rejects_degenerate_grids() {
		let config = ParticleTortuosityConfig::default();
		assert!(config.validate(&Grid3D::new(0, 4, 4, 1.0)).is_err());
		assert!(config.validate(&Grid3D::new(4, 4, 4, 0.0)).is_err());
	}

	#[test]
	fn short_walks_use_the_automatic_length() {
		let g = Grid3D::new(10, 20, 5, 1.0);
		let mut config = ParticleTortuosityConfig::default();
		assert_eq!(config.effective_total_length(&g, 1.0), 2000.0);
		config.total_length = 1.0;
		assert_eq!(config.effective_total_length(&g, 0.25), 2000.0);
		config.total_length = 350.0;
		assert_eq!(config.effective_total_length(&g, 1.0), 350.0);
	}

	#[test]
	fn continuum_walks_stretch_with_short_free_paths() {
		let g = Grid3D::new(10, 20, 5, 1.0);
		let mut config = ParticleTortuosityConfig {
			free_path: FreePathMode::Continuum { knudsen: 0.01 },
			..Default::default()
		};
		assert_eq!(config.effective_total_length(&g, 0.25), 8000.0);
		assert_eq!(config.effective_total_length(&g, 4.0), 2000.0);
		config.total_length = 350.0;
		assert_eq!(config.effective_total_length(&g, 0.25), 350.0);
	}

	#[test]
	fn thread_count_is_clamped() {
		let mut config = ParticleTortuosityConfig::default();
		let available = config.effective_threads();
		assert!(available >= 1);
		config.threads = usize::MAX;
		assert_eq!(config.effective_threads(), available);
		config.threads = 1;
		assert_eq!(config.effective_threads(), 1);
	}
}
