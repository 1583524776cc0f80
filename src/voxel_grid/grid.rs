use std::io;

/// 3D voxel grid of 8-bit grayscale / material ids
#[derive(Clone, Debug)]
pub struct Grid3D {
	pub len_i: usize,  // Number of voxels along I (x)
	pub len_j: usize,  // Number of voxels along J (y)
	pub len_k: usize,  // Number of voxels along K (z)
	pub total_voxels: usize, // Total number of voxels IxJxK
	pub voxel_length: f64,  // Edge length of one voxel in world units
	pub data: Vec<u8>,  // One byte per voxel, x fastest
}

impl Grid3D {
	/// Create a new voxel grid, fully allocated with all voxels set to 0
	pub fn new(len_i: usize, len_j: usize, len_k: usize, voxel_length: f64) -> Self {
		let total_voxels = len_i * len_j * len_k;

		Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			voxel_length,
			data: vec![0u8; total_voxels],
		}
	}

	/// Wrap existing voxel data; `data.len()` must equal IxJxK
	pub fn from_data(len_i: usize, len_j: usize, len_k: usize, voxel_length: f64, data: Vec<u8>) -> io::Result<Self> {
		let total_voxels = len_i * len_j * len_k;
		if data.len() != total_voxels {
			return Err(io::Error::new(
				io::ErrorKind::InvalidData,
				format!(
					"voxel data holds {} values but {}x{}x{} needs {}",
					data.len(), len_i, len_j, len_k, total_voxels
				),
			));
		}

		Ok(Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			voxel_length,
			data,
		})
	}

	/// Grid dimensions as an array, I/J/K
	#[inline]
	pub fn dims(&self) -> [usize; 3] {
		[self.len_i, self.len_j, self.len_k]
	}

	/// Largest of the three dimensions
	pub fn max_dimension(&self) -> usize {
		self.len_i.max(self.len_j).max(self.len_k)
	}

	pub fn is_empty(&self) -> bool {
		self.total_voxels == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_grid_is_zeroed() {
		let grid = Grid3D::new(3, 4, 5, 1e-6);
		assert_eq!(grid.total_voxels, 60);
		assert!(grid.data.iter().all(|&v| v == 0));
		assert_eq!(grid.max_dimension(), 5);
		assert_eq!(grid.dims(), [3, 4, 5]);
	}

	#[test]
	fn from_data_rejects_wrong_length() {
		let err = Grid3D::from_data(2, 2, 2, 1.0, vec![0u8; 7]).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::InvalidData);
		assert!(Grid3D::from_data(2, 2, 2, 1.0, vec![0u8; 8]).is_ok());
	}
}
