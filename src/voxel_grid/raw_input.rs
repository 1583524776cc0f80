use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;

use crate::voxel_grid::grid::Grid3D;

static DIMS_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn dims_pattern() -> Option<&'static Regex> {
	DIMS_PATTERN
		.get_or_init(|| Regex::new(r"(?i)(\d+)x(\d+)x(\d+)").ok())
		.as_ref()
}

fn invalid(message: String) -> io::Error {
	io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Parse `IxJxK` dimensions out of a string such as `200x200x100` or `fibers_64x64x32.raw`
pub fn parse_dims(text: &str) -> Option<[usize; 3]> {
	let caps = dims_pattern()?.captures_iter(text).last()?;
	let mut dims = [0usize; 3];
	for (axis, dim) in dims.iter_mut().enumerate() {
		*dim = caps.get(axis + 1)?.as_str().parse().ok()?;
	}
	if dims.iter().any(|&d| d == 0) {
		return None;
	}
	Some(dims)
}

/// Read a headerless 8-bit raw volume from any reader
pub fn read_raw_volume<R: Read>(mut reader: R, dims: [usize; 3], voxel_length: f64) -> io::Result<Grid3D> {
	let expected = dims[0] * dims[1] * dims[2];
	let mut data = Vec::with_capacity(expected);
	reader.read_to_end(&mut data)?;
	if data.len() != expected {
		return Err(invalid(format!(
			"raw volume holds {} bytes, {}x{}x{} needs {}",
			data.len(), dims[0], dims[1], dims[2], expected
		)));
	}
	Grid3D::from_data(dims[0], dims[1], dims[2], voxel_length, data)
}

/// Load a headerless 8-bit raw volume; dimensions come from `dims` or else the file name
pub fn load_raw_volume_path(path: &Path, dims: Option<[usize; 3]>, voxel_length: f64) -> io::Result<Grid3D> {
	let dims = match dims {
		Some(d) => d,
		None => path
			.file_name()
			.and_then(|name| name.to_str())
			.and_then(parse_dims)
			.ok_or_else(|| invalid(format!("no IxJxK dimensions given or found in {}", path.display())))?,
	};

	let start_time = Instant::now();
	let grid = read_raw_volume(BufReader::new(File::open(path)?), dims, voxel_length)?;
	log::info!(
		"Loaded {} ({}x{}x{}) in {:.3} seconds",
		path.display(),
		dims[0],
		dims[1],
		dims[2],
		start_time.elapsed().as_secs_f64()
	);
	Ok(grid)
}
