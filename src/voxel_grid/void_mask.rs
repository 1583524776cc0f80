use bitvec::vec::BitVec;

use crate::voxel_grid::grid::Grid3D;
use crate::voxel_grid::utils::{linear_to_ijk, reflect_index};

/// Inclusive grayscale range treated as the void (pore) phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoidCutoff {
	pub low: i32,
	pub high: i32,
}

impl VoidCutoff {
	pub const fn new(low: i32, high: i32) -> Self {
		Self { low, high }
	}

	/// A single material id
	pub const fn id(value: u8) -> Self {
		Self { low: value as i32, high: value as i32 }
	}

	/// Both ends inside the 8-bit grayscale range and ordered
	pub fn is_valid(&self) -> bool {
		0 <= self.low && self.low <= self.high && self.high <= u8::MAX as i32
	}

	#[inline]
	pub fn contains(&self, value: u8) -> bool {
		let v = value as i32;
		v >= self.low && v <= self.high
	}
}

impl Default for VoidCutoff {
	fn default() -> Self {
		Self::id(0)
	}
}

/// Bit-packed void/solid classification of a grid, read-only during a walk
#[derive(Clone, Debug)]
pub struct VoidMask {
	pub len_i: usize,
	pub len_j: usize,
	pub len_k: usize,
	bits: BitVec,
}

impl VoidMask {
	/// Classify every voxel of `grid` against `cutoff`
	pub fn from_grid(grid: &Grid3D, cutoff: VoidCutoff) -> Self {
		let bits: BitVec = grid.data.iter().map(|&v| cutoff.contains(v)).collect();
		Self {
			len_i: grid.len_i,
			len_j: grid.len_j,
			len_k: grid.len_k,
			bits,
		}
	}

	#[inline]
	pub fn dims(&self) -> [usize; 3] {
		[self.len_i, self.len_j, self.len_k]
	}

	/// Void test at any integer position, reflecting out-of-range indices like `Grid3D::material_at`
	#[inline]
	pub fn is_void(&self, i: i64, j: i64, k: i64) -> bool {
		let i = reflect_index(i, self.len_i);
		let j = reflect_index(j, self.len_j);
		let k = reflect_index(k, self.len_k);
		self.bits[i + j * self.len_i + k * self.len_i * self.len_j]
	}

	/// Void test for a voxel array position
	#[inline]
	pub fn is_void_at(&self, voxel: [i64; 3]) -> bool {
		self.is_void(voxel[0], voxel[1], voxel[2])
	}

	/// Number of void voxels
	pub fn count_void(&self) -> usize {
		self.bits.count_ones()
	}

	/// Voxel position of a linear mask index
	#[inline]
	pub fn index_to_voxel(&self, index: usize) -> [i64; 3] {
		let [i, j, k] = linear_to_ijk(index, self.dims());
		[i as i64, j as i64, k as i64]
	}

	/// Linear indices of every void voxel
	pub fn void_indices(&self) -> impl Iterator<Item = usize> + '_ {
		self.bits.iter_ones()
	}
}
