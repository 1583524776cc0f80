pub mod voxel_grid {
	pub mod info;
	pub mod grid;
	pub mod manip;
	pub mod utils;
	pub mod void_mask;
	pub mod volume_fraction;
	pub mod raw_input;
}

pub mod tortuosity {
	pub mod error;
	pub mod config;
	pub mod vec3;
	pub mod sampling;
	pub mod stepper;
	pub mod walker;
	pub mod random_walk;
	pub mod calibration;
	pub mod result;
	pub mod ensemble;
}
