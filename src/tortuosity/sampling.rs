//! Random draws used by the collision model.
//!
//! The formulas fix the physical calibration of the walk: rejection-sampled
//! isotropic directions, inverse-CDF exponential free paths, and diffuse
//! (cosine-law) wall reflection built from a flux-weighted Maxwellian.

use std::f64::consts::PI;

use rand::Rng;

use crate::tortuosity::error::{SolverResult, TortuosityError};
use crate::tortuosity::stepper::Axis;
use crate::tortuosity::vec3::{self, Vec3};

/// Upper bound on redraws before a direction is declared degenerate
pub const MAX_RESAMPLE_ATTEMPTS: usize = 1000;

/// Uniform draw in (0, 1], safe to take the logarithm of
#[inline]
fn unit_open_closed<R: Rng + ?Sized>(rng: &mut R) -> f64 {
	1.0 - rng.random::<f64>()
}

/// Uniformly distributed unit vector with no zero component.
///
/// Draws points in the cube [-1, 1]^3 until one falls inside the unit ball,
/// then projects it onto the sphere.
pub fn sample_isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> SolverResult<Vec3> {
	for _ in 0..MAX_RESAMPLE_ATTEMPTS {
		let v = [
			rng.random_range(-1.0..=1.0),
			rng.random_range(-1.0..=1.0),
			rng.random_range(-1.0..=1.0),
		];
		let len2 = vec3::dot(v, v);
		if len2 > 1.0 {
			continue;
		}
		match vec3::normalize(v) {
			Some(dir) if !vec3::has_zero_component(dir) => return Ok(dir),
			_ => continue,
		}
	}
	Err(TortuosityError::DegenerateDirection { attempts: MAX_RESAMPLE_ATTEMPTS })
}

/// Exponentially distributed length with the given mean: `-ln(U) * mean`, U in (0, 1]
#[inline]
pub fn sample_exponential<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> f64 {
	-unit_open_closed(rng).ln() * mean
}

/// Axis-aligned wall normal for a face crossed on `axis`, pointing back against `incoming`
#[inline]
pub fn surface_normal(axis: Axis, incoming: Vec3) -> Vec3 {
	let mut normal = [0.0; 3];
	normal[axis.index()] = if incoming[axis.index()] > 0.0 { -1.0 } else { 1.0 };
	normal
}

/// Unit tangent of the wall plane: the incoming direction minus its normal part,
/// or a random perpendicular when the incoming direction is along the normal.
fn tangent_basis<R: Rng + ?Sized>(rng: &mut R, normal: Vec3, incoming: Vec3) -> SolverResult<Vec3> {
	let projected = vec3::sub(incoming, vec3::scale(normal, vec3::dot(incoming, normal)));
	if vec3::norm(projected) > 1e-12 {
		if let Some(t) = vec3::normalize(projected) {
			return Ok(t);
		}
	}
	for _ in 0..MAX_RESAMPLE_ATTEMPTS {
		let aux = sample_isotropic_direction(rng)?;
		let t = vec3::cross(normal, aux);
		if vec3::norm(t) > 1e-6 {
			if let Some(t) = vec3::normalize(t) {
				return Ok(t);
			}
		}
	}
	Err(TortuosityError::DegenerateDirection { attempts: MAX_RESAMPLE_ATTEMPTS })
}

/// Outgoing direction after a diffuse wall collision.
///
/// `normal` must be a unit vector pointing into the void. The emitted speed is
/// drawn with `vrms = sqrt(pi)/2 * mean_velocity`, then only its direction is kept.
pub fn sample_lambertian_reflection<R: Rng + ?Sized>(
	rng: &mut R,
	normal: Vec3,
	incoming: Vec3,
	mean_velocity: f64,
) -> SolverResult<Vec3> {
	let vrms = PI.sqrt() / 2.0 * mean_velocity;
	let tan1 = tangent_basis(rng, normal, incoming)?;
	let tan2 = vec3::cross(normal, tan1);

	for _ in 0..MAX_RESAMPLE_ATTEMPTS {
		let r1 = unit_open_closed(rng);
		let r2 = rng.random::<f64>();
		let r3 = unit_open_closed(rng);

		let v_perp = vrms * (-r1.ln()).sqrt();
		let theta = 2.0 * PI * r2;
		let v_par = vrms * (-r3.ln()).sqrt();
		let v_par1 = v_par * theta.sin();
		let v_par2 = v_par * theta.cos();

		let velocity = vec3::add(
			vec3::scale(normal, v_perp),
			vec3::add(vec3::scale(tan1, v_par1), vec3::scale(tan2, v_par2)),
		);
		match vec3::normalize(velocity) {
			Some(dir) if !vec3::has_zero_component(dir) => return Ok(dir),
			_ => continue,
		}
	}
	Err(TortuosityError::DegenerateDirection { attempts: MAX_RESAMPLE_ATTEMPTS })
}
