use crate::voxel_grid::grid::Grid3D;
use crate::voxel_grid::void_mask::VoidCutoff;

impl Grid3D {
	/// Fraction of voxels whose value lies inside `cutoff` (0 for an empty grid)
	pub fn volume_fraction(&self, cutoff: VoidCutoff) -> f64 {
		if self.total_voxels == 0 || !cutoff.is_valid() {
			return 0.0;
		}
		let matching = self.count_in_range(cutoff.low as u8, cutoff.high as u8);
		matching as f64 / self.total_voxels as f64
	}
}
