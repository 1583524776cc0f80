use crate::tortuosity::vec3::Vec3;
use crate::tortuosity::walker::Walker;

/// Value written to every field of a failed run
pub const SENTINEL: f64 = -1.0;

/// Floor on the normalized diffusivity before dividing, keeps tortuosity finite on blocked axes
pub const MIN_NORMALIZED_DIFFUSIVITY: f64 = 1e-12;

/// Aggregate over one population after one phase
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnsembleStatistics {
	/// Mean squared displacement per axis, world units squared
	pub msd: Vec3,
	/// Average accumulated walk time
	pub mean_time: f64,
	pub total_collisions: u64,
	pub active_walkers: usize,
}

impl EnsembleStatistics {
	/// Reduce over every non-skipped walker, in walker order
	pub fn gather(walkers: &[Walker], voxel_length: f64) -> Self {
		let mut sum_sq = [0.0; 3];
		let mut sum_time = 0.0;
		let mut total_collisions = 0u64;
		let mut active_walkers = 0usize;

		for walker in walkers.iter().filter(|w| !w.skip) {
			let d = walker.displacement();
			for a in 0..3 {
				sum_sq[a] += d[a] * d[a];
			}
			sum_time += walker.walk_time;
			total_collisions += walker.collision_count;
			active_walkers += 1;
		}

		if active_walkers == 0 {
			return Self::default();
		}
		let n = active_walkers as f64;
		let scale = voxel_length * voxel_length / n;
		Self {
			msd: [sum_sq[0] * scale, sum_sq[1] * scale, sum_sq[2] * scale],
			mean_time: sum_time / n,
			total_collisions,
			active_walkers,
		}
	}
}

/// One point of the mean-squared-displacement curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsdSample {
	pub time: f64,
	pub msd: Vec3,
}

/// Transport coefficients of a particle tortuosity run
#[derive(Debug, Clone, PartialEq)]
pub struct TortuosityResult {
	pub diffusion_coefficient: Vec3,
	pub tortuosity: Vec3,
	pub normalized_diffusivity: Vec3,
	/// World units; 0 when the calibration walkers never hit a wall
	pub mean_intercept_length: f64,
	pub porosity: f64,
	/// Mean free path actually used, voxel units
	pub mean_free_path: f64,
	pub wall_collisions: u64,
	pub active_walkers: usize,
	pub msd_curve: Vec<MsdSample>,
}

impl TortuosityResult {
	/// Every field set to -1
	pub fn sentinel() -> Self {
		Self {
			diffusion_coefficient: [SENTINEL; 3],
			tortuosity: [SENTINEL; 3],
			normalized_diffusivity: [SENTINEL; 3],
			mean_intercept_length: SENTINEL,
			porosity: SENTINEL,
			mean_free_path: SENTINEL,
			wall_collisions: 0,
			active_walkers: 0,
			msd_curve: Vec::new(),
		}
	}

	pub fn is_sentinel(&self) -> bool {
		self.tortuosity == [SENTINEL; 3] && self.diffusion_coefficient == [SENTINEL; 3]
	}
}

/// Late-time slope of the MSD curve, per axis: `(msd[last] - msd[start]) / (2 (t[last] - t[start]))`.
///
/// Negative or non-finite slopes (pure noise on a blocked axis) become 0.
pub fn diffusion_coefficient(curve: &[EnsembleStatistics], start_phase: usize) -> Vec3 {
	let (Some(first), Some(last)) = (curve.get(start_phase), curve.last()) else {
		return [0.0; 3];
	};
	let dt = last.mean_time - first.mean_time;
	if dt <= 0.0 || !dt.is_finite() {
		return [0.0; 3];
	}
	let mut d = [0.0; 3];
	for a in 0..3 {
		let slope = (last.msd[a] - first.msd[a]) / (2.0 * dt);
		d[a] = if slope.is_finite() { slope.max(0.0) } else { 0.0 };
	}
	d
}

/// Reference diffusivity of the open pore space.
///
/// Bosanquet-style combination of the bulk free path and the pore intercept
/// length (both world units); bulk-only when no intercept length is known.
pub fn reference_diffusivity(mean_velocity: f64, mean_free_path: f64, mean_intercept_length: Option<f64>) -> f64 {
	match mean_intercept_length {
		Some(mil) if mil > 0.0 && mil.is_finite() => {
			mean_velocity * (mean_free_path * mil) / (mean_free_path + mil) / 3.0
		}
		_ => mean_velocity * mean_free_path / 3.0,
	}
}

/// Normalized diffusivity `D * porosity / Dp` and tortuosity `porosity / normalized`, per axis
pub fn tortuosity_from_diffusion(diffusion: Vec3, porosity: f64, reference: f64) -> (Vec3, Vec3) {
	let mut normalized = [0.0; 3];
	let mut tortuosity = [0.0; 3];
	for a in 0..3 {
		let n = diffusion[a] * porosity / reference;
		normalized[a] = if n.is_finite() { n.max(0.0) } else { 0.0 };
		tortuosity[a] = porosity / normalized[a].max(MIN_NORMALIZED_DIFFUSIVITY);
	}
	(normalized, tortuosity)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stats(msd: f64, time: f64) -> EnsembleStatistics {
		EnsembleStatistics { msd: [msd, 2.0 * msd, 0.0], mean_time: time, total_collisions: 0, active_walkers: 1 }
	}

	#[test]
	fn slope_uses_the_late_window() {
		// linear MSD = 6 t on x, 12 t on y, flat on z, transient at the start
		let mut curve: Vec<EnsembleStatistics> = (0..100).map(|p| stats(6.0 * (p + 1) as f64, (p + 1) as f64)).collect();
		curve[0].msd = [1000.0; 3];
		let d = diffusion_coefficient(&curve, 9);
		assert!((d[0] - 3.0).abs() < 1e-12);
		assert!((d[1] - 6.0).abs() < 1e-12);
		assert_eq!(d[2], 0.0);
	}

	#[test]
	fn shrinking_msd_clamps_to_zero() {
		let curve = vec![stats(5.0, 1.0), stats(4.0, 2.0)];
		assert_eq!(diffusion_coefficient(&curve, 0), [0.0; 3]);
		assert_eq!(diffusion_coefficient(&curve[..1], 9), [0.0; 3]);
	}

	#[test]
	fn reference_diffusivity_falls_back_without_walls() {
		assert!((reference_diffusivity(3.0, 2.0, None) - 2.0).abs() < 1e-15);
		// equal lengths halve the free path
		assert!((reference_diffusivity(3.0, 2.0, Some(2.0)) - 1.0).abs() < 1e-15);
	}

	#[test]
	fn blocked_axis_keeps_a_finite_tortuosity() {
		let (normalized, tortuosity) = tortuosity_from_diffusion([0.5, 0.25, 0.0], 0.5, 0.5);
		assert_eq!(normalized, [0.5, 0.25, 0.0]);
		assert!((tortuosity[0] - 1.0).abs() < 1e-15);
		assert!((tortuosity[1] - 2.0).abs() < 1e-15);
		assert!(tortuosity[2].is_finite() && tortuosity[2] > 1e9);
	}

	#[test]
	fn sentinel_is_recognised() {
		assert!(TortuosityResult::sentinel().is_sentinel());
	}
}
