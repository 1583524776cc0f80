use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::tortuosity::calibration::{InterceptEstimate, compute_mean_intercept_length};
use crate::tortuosity::config::{FreePathMode, ParticleTortuosityConfig};
use crate::tortuosity::error::{SolverResult, TortuosityError};
use crate::tortuosity::random_walk::{WalkParams, random_walk};
use crate::tortuosity::result::{
	EnsembleStatistics, MsdSample, TortuosityResult, diffusion_coefficient, reference_diffusivity,
	tortuosity_from_diffusion,
};
use crate::tortuosity::walker::{Walker, WalkerStream};
use crate::voxel_grid::grid::Grid3D;
use crate::voxel_grid::void_mask::VoidMask;

/// Number of equal walk increments; MSD is sampled after each one
pub const PHASES: usize = 100;
/// First phase of the late-time window used for the MSD slope
pub const FIT_START_PHASE: usize = 9;

/// Cooperative cancellation flag, checked between phases
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Particle random-walk tortuosity solver over one grid
pub struct ParticleTortuositySolver<'a> {
	grid: &'a Grid3D,
	config: ParticleTortuosityConfig,
	walkers: Vec<Walker>,
}

impl<'a> ParticleTortuositySolver<'a> {
	pub fn new(grid: &'a Grid3D, config: ParticleTortuosityConfig) -> Self {
		Self {
			grid,
			config,
			walkers: Vec::new(),
		}
	}

	pub fn config(&self) -> &ParticleTortuosityConfig {
		&self.config
	}

	/// Walkers of the last main run, indexed by walker id
	pub fn walkers(&self) -> &[Walker] {
		&self.walkers
	}

	pub fn solve(&mut self) -> SolverResult<TortuosityResult> {
		self.solve_with_cancel(&CancelToken::new())
	}

	/// Validate, calibrate, run every phase and derive the transport coefficients
	pub fn solve_with_cancel(&mut self, cancel: &CancelToken) -> SolverResult<TortuosityResult> {
		let start_time = Instant::now();
		self.config.validate(self.grid)?;

		let cutoff = self.config.void_cutoff;
		let mask = VoidMask::from_grid(self.grid, cutoff);
		if mask.count_void() == 0 {
			return Err(TortuosityError::NoVoidPhase);
		}
		let porosity = self.grid.volume_fraction(cutoff);

		let threads = self.config.effective_threads();
		let pool = ThreadPoolBuilder::new()
			.num_threads(threads)
			.build()
			.map_err(|e| TortuosityError::ThreadPool(e.to_string()))?;

		self.grid.report_memory();
		log::info!(
			"Particle tortuosity: {} walkers on {} threads, porosity {:.4}, void [{}, {}]",
			self.config.particles,
			threads,
			porosity,
			cutoff.low,
			cutoff.high
		);

		if cancel.is_cancelled() {
			return Err(TortuosityError::Cancelled { phase: 0 });
		}
		let intercept = compute_mean_intercept_length(
			&pool,
			&mask,
			self.grid.voxel_length,
			self.config.mean_velocity,
			self.config.calibration_particles,
			self.config.seed,
		);

		let mean_free_path = self.mean_free_path(&intercept);
		let params = WalkParams {
			voxel_length: self.grid.voxel_length,
			mean_velocity: self.config.mean_velocity,
			mean_free_path,
		};
		let total_length = self.config.effective_total_length(self.grid, mean_free_path);
		log::info!("Walk length {:.1} voxels, mean free path {:.4} voxels", total_length, mean_free_path);

		let curve = self.execute_random_walks(&pool, &mask, &params, total_length, cancel)?;

		let diffusion = diffusion_coefficient(&curve, FIT_START_PHASE);
		let reference = reference_diffusivity(
			self.config.mean_velocity,
			mean_free_path * self.grid.voxel_length,
			intercept.mean_intercept_length,
		);
		let (normalized_diffusivity, tortuosity) = tortuosity_from_diffusion(diffusion, porosity, reference);

		let last = curve.last().copied().unwrap_or_default();
		if last.active_walkers < self.config.particles {
			log::warn!("{} of {} walkers were skipped", self.config.particles - last.active_walkers, self.config.particles);
		}
		log::info!(
			"Diffusion coefficient [{:.4e}, {:.4e}, {:.4e}], tortuosity [{:.4}, {:.4}, {:.4}] in {:.2} s",
			diffusion[0],
			diffusion[1],
			diffusion[2],
			tortuosity[0],
			tortuosity[1],
			tortuosity[2],
			start_time.elapsed().as_secs_f64()
		);

		Ok(TortuosityResult {
			diffusion_coefficient: diffusion,
			tortuosity,
			normalized_diffusivity,
			mean_intercept_length: intercept.mean_intercept_length.unwrap_or(0.0),
			porosity,
			mean_free_path,
			wall_collisions: last.total_collisions,
			active_walkers: last.active_walkers,
			msd_curve: curve.iter().map(|s| MsdSample { time: s.mean_time, msd: s.msd }).collect(),
		})
	}

	/// Mean free path (voxel units) for the main run
	fn mean_free_path(&self, intercept: &InterceptEstimate) -> f64 {
		match self.config.free_path {
			FreePathMode::Prescribed(mfp) => mfp,
			FreePathMode::Continuum { knudsen } => match intercept.mean_intercept_length {
				Some(mil) => knudsen * mil / self.grid.voxel_length,
				// no walls: scale with the domain instead
				None => knudsen * self.grid.max_dimension() as f64,
			},
		}
	}

	/// Spawn the main population and advance it through every phase, returning the MSD curve
	pub fn execute_random_walks(
		&mut self,
		pool: &ThreadPool,
		mask: &VoidMask,
		params: &WalkParams,
		total_length: f64,
		cancel: &CancelToken,
	) -> SolverResult<Vec<EnsembleStatistics>> {
		let seed = self.config.seed;
		let particles = self.config.particles;
		self.walkers = pool.install(|| {
			(0..particles)
				.into_par_iter()
				.map(|index| Walker::spawn(index, seed, WalkerStream::Main, mask, params.mean_free_path, params.mean_velocity))
				.collect()
		});

		let pb = if self.config.show_progress {
			ProgressBar::new(PHASES as u64)
		} else {
			ProgressBar::hidden()
		};
		pb.set_style(
			ProgressStyle::default_bar()
			.template("Random walks: [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
			.unwrap_or_else(|_| ProgressStyle::default_bar())
			.progress_chars("#>-"),
		);

		let mut curve = Vec::with_capacity(PHASES);
		for phase in 0..PHASES {
			if cancel.is_cancelled() {
				pb.abandon();
				return Err(TortuosityError::Cancelled { phase });
			}
			let target_length = total_length * (phase + 1) as f64 / PHASES as f64;
			let walkers = &mut self.walkers;
			pool.install(|| {
				walkers
					.par_iter_mut()
					.for_each(|walker| random_walk(walker, mask, params, target_length));
			});

			let stats = EnsembleStatistics::gather(&self.walkers, params.voxel_length);
			log::debug!(
				"phase {}: t = {:.4e}, msd = [{:.4e}, {:.4e}, {:.4e}], {} wall collisions",
				phase,
				stats.mean_time,
				stats.msd[0],
				stats.msd[1],
				stats.msd[2],
				stats.total_collisions
			);
			curve.push(stats);
			pb.inc(1);
		}

		pb.finish_and_clear();
		Ok(curve)
	}
}

/// Run the particle solver and flatten failures into the `-1` sentinel result.
///
/// The failure reason goes to the log; callers check `TortuosityResult::is_sentinel`.
pub fn compute_particle_tortuosity(grid: &Grid3D, config: ParticleTortuosityConfig) -> TortuosityResult {
	match ParticleTortuositySolver::new(grid, config).solve() {
		Ok(result) => result,
		Err(e) => {
			log::error!("Particle tortuosity failed: {}", e);
			TortuosityResult::sentinel()
		}
	}
}
