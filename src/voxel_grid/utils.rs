use std::mem::size_of;
use crate::voxel_grid::grid;

/// Format large numbers with KB, MB, GB, TB suffixes
pub fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;
	const TB: usize = GB * 1024;

	if bytes >= TB {
		format!("{:.2} TB", bytes as f64 / TB as f64)
	} else if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

/// Split a linear index of an i-fastest grid with dimensions `dims` into (i, j, k)
#[inline]
pub fn linear_to_ijk(index: usize, dims: [usize; 3]) -> [usize; 3] {
	let plane = dims[0] * dims[1];
	[index % dims[0], (index % plane) / dims[0], index / plane]
}

/// Map any integer index into `[0, n-1]` by symmetric reflection at both ends.
///
/// A single reflection is `-i-1` below zero and `(n-1)-(i-n)` above the top.
/// Indices further than one grid width away are folded over the period `2n`,
/// which gives the same answer as reflecting repeatedly.
#[inline]
pub fn reflect_index(i: i64, n: usize) -> usize {
	debug_assert!(n > 0);
	let n = n as i64;
	let r = i.rem_euclid(2 * n);
	if r < n { r as usize } else { (2 * n - 1 - r) as usize }
}

impl grid::Grid3D {
	/// Report memory usage through the log
	pub fn report_memory(&self) {
		let struct_overhead = size_of::<Self>() - size_of::<Vec<u8>>();
		let data_bytes = self.data.capacity();
		let total_memory = struct_overhead + data_bytes;

		log::info!(
			"Grid3D {} x {} x {} ({:e} voxels, {:.3e} per voxel): data {}, total {}",
			self.len_i,
			self.len_j,
			self.len_k,
			self.total_voxels as f64,
			self.voxel_length,
			format_bytes(data_bytes),
			format_bytes(total_memory)
		);
	}

	/// Convert (i, j, k) to a linear index
	#[inline]
	pub fn ijk_to_index(&self, i: usize, j: usize, k: usize) -> usize {
		i + j * self.len_i + k * self.len_i * self.len_j
	}

	/// Convert a linear index back to (i, j, k)
	#[inline]
	pub fn index_to_ijk(&self, index: usize) -> (usize, usize, usize) {
		let [i, j, k] = linear_to_ijk(index, self.dims());
		(i, j, k)
	}

	/// Get a voxel value using (i, j, k) coordinates (panics if out of bounds)
	#[inline]
	pub fn get_voxel_ijk(&self, i: usize, j: usize, k: usize) -> u8 {
		self.data[self.ijk_to_index(i, j, k)]
	}

	/// Set a voxel value using (i, j, k) coordinates (assumes valid bounds)
	#[inline]
	pub fn set_voxel_ijk(&mut self, i: usize, j: usize, k: usize, value: u8) {
		let index = self.ijk_to_index(i, j, k);
		self.data[index] = value;
	}

	/// Material id at any integer position; out-of-range indices are reflected back in
	#[inline]
	pub fn material_at(&self, i: i64, j: i64, k: i64) -> u8 {
		self.get_voxel_ijk(
			reflect_index(i, self.len_i),
			reflect_index(j, self.len_j),
			reflect_index(k, self.len_k),
		)
	}

	/// Set every voxel to `value`
	pub fn fill(&mut self, value: u8) {
		self.data.fill(value);
	}

	/// Count the voxels whose value lies in `low..=high`
	pub fn count_in_range(&self, low: u8, high: u8) -> usize {
		self.data.iter().filter(|&&v| v >= low && v <= high).count()
	}
}
