use crate::voxel_grid::grid::Grid3D;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

impl Grid3D {
	/// Relative (di, dj, dk) offsets of every voxel within `radius` of a center voxel
	pub fn compute_offsets(radius: f64) -> Vec<(isize, isize, isize)> {
		let mut offsets = Vec::new();
		let r_int = 1 + radius as isize;
		let r2 = radius * radius;

		for di in -r_int..=r_int {
			let di2 = di * di;
			for dj in -r_int..=r_int {
				let dj2 = dj * dj;
				for dk in -r_int..=r_int {
					// convert to f64 in last step
					let dist = (di2 + dj2 + dk * dk) as f64;
					if dist <= r2 {
						offsets.push((di, dj, dk));
					}
				}
			}
		}
		offsets
	}

	/// Paint a sphere from precomputed offsets; voxels falling outside the grid are dropped
	pub fn paint_sphere_with_offsets(&mut self, ci: usize, cj: usize, ck: usize, offsets: &[(isize, isize, isize)], value: u8) {
		let dims = [self.len_i as isize, self.len_j as isize, self.len_k as isize];
		for &(di, dj, dk) in offsets {
			let i = ci as isize + di;
			let j = cj as isize + dj;
			let k = ck as isize + dk;
			if i >= 0 && j >= 0 && k >= 0 && i < dims[0] && j < dims[1] && k < dims[2] {
				self.set_voxel_ijk(i as usize, j as usize, k as usize, value);
			}
		}
	}

	/// Compute offsets, then paint a sphere of material `value`
	pub fn add_sphere(&mut self, ci: usize, cj: usize, ck: usize, radius: f64, value: u8) {
		let offsets = Self::compute_offsets(radius);
		self.paint_sphere_with_offsets(ci, cj, ck, &offsets, value);
	}

	/// Set every voxel in the half-open box `min..max` (clamped to the grid)
	pub fn fill_box(&mut self, min: [usize; 3], max: [usize; 3], value: u8) {
		let max = [max[0].min(self.len_i), max[1].min(self.len_j), max[2].min(self.len_k)];
		for k in min[2]..max[2] {
			for j in min[1]..max[1] {
				for i in min[0]..max[0] {
					self.set_voxel_ijk(i, j, k, value);
				}
			}
		}
	}

	/// Set the single voxel layer `index` normal to `axis` (0 = I, 1 = J, 2 = K)
	pub fn carve_plane(&mut self, axis: usize, index: usize, value: u8) {
		let mut min = [0usize; 3];
		let mut max = self.dims();
		min[axis] = index;
		max[axis] = index + 1;
		self.fill_box(min, max, value);
	}
}

/// Fully open cube: every voxel is void (id 0)
pub fn synthetic_open(size: usize, voxel_length: f64) -> Grid3D {
	Grid3D::new(size, size, size, voxel_length)
}

/// Solid cube (id 255) with a void channel `width` voxels thick normal to K
pub fn synthetic_channel(size: usize, width: usize, voxel_length: f64) -> Grid3D {
	let mut grid = Grid3D::new(size, size, size, voxel_length);
	if size == 0 {
		return grid;
	}
	grid.fill(255);
	let width = width.clamp(1, size);
	let start = (size - width) / 2;
	for k in start..start + width {
		grid.carve_plane(2, k, 0);
	}
	grid
}

/// Void cube packed with `count` randomly placed solid spheres (id 255)
pub fn synthetic_spheres(size: usize, count: usize, radius: f64, seed: u64, voxel_length: f64) -> Grid3D {
	let mut grid = Grid3D::new(size, size, size, voxel_length);
	if size == 0 {
		return grid;
	}
	let mut rng = StdRng::seed_from_u64(seed);
	let offsets = Grid3D::compute_offsets(radius);

	let pb = ProgressBar::new(count as u64);
	pb.set_style(
		ProgressStyle::default_bar()
		.template("Placing spheres: [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
		.unwrap_or_else(|_| ProgressStyle::default_bar())
		.progress_chars("#>-"),
	);

	for _ in 0..count {
		let ci = rng.random_range(0..size);
		let cj = rng.random_range(0..size);
		let ck = rng.random_range(0..size);
		grid.paint_sphere_with_offsets(ci, cj, ck, &offsets, 255);
		pb.inc(1);
	}

	pb.finish_and_clear();
	grid
}
