use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use voxel_tortuosity::tortuosity::config::{FreePathMode, ParticleTortuosityConfig};
use voxel_tortuosity::tortuosity::ensemble::compute_particle_tortuosity;
use voxel_tortuosity::voxel_grid::grid::Grid3D;
use voxel_tortuosity::voxel_grid::info;
use voxel_tortuosity::voxel_grid::manip;
use voxel_tortuosity::voxel_grid::raw_input;
use voxel_tortuosity::voxel_grid::void_mask::VoidCutoff;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Synthetic {
	/// Fully void cube
	Open,
	/// Solid cube with a void slab normal to z
	Channel,
	/// Void cube with random solid spheres
	Spheres,
}

/// Particle random-walk tortuosity of a voxelized porous structure
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
	/// Headerless 8-bit raw volume
	#[arg(short, long, conflicts_with = "synthetic")]
	input: Option<PathBuf>,

	/// Raw volume dimensions as IxJxK (read from the file name when omitted)
	#[arg(long)]
	dims: Option<String>,

	/// Generate a test structure instead of reading one
	#[arg(long, value_enum)]
	synthetic: Option<Synthetic>,

	/// Edge length of the synthetic cube, voxels
	#[arg(long, default_value_t = 32)]
	size: usize,

	/// Voxel edge length, world units
	#[arg(long, default_value_t = 1e-6)]
	voxel_length: f64,

	/// Lowest grayscale value counted as void
	#[arg(long, default_value_t = 0)]
	void_low: i32,

	/// Highest grayscale value counted as void
	#[arg(long, default_value_t = 0)]
	void_high: i32,

	#[arg(short, long, default_value_t = 20_000)]
	particles: usize,

	/// Mean free path, voxels
	#[arg(long, default_value_t = 1.0, conflicts_with = "continuum")]
	mean_free_path: f64,

	/// Derive the mean free path from the calibrated mean intercept length
	#[arg(long)]
	continuum: bool,

	/// Mean free path over mean intercept length in continuum mode
	#[arg(long, default_value_t = 0.01)]
	knudsen: f64,

	/// Mean thermal velocity, world units per unit time
	#[arg(long, default_value_t = 1.0)]
	velocity: f64,

	#[arg(long, default_value_t = 1)]
	seed: u64,

	/// Walk length per walker in voxels (<= 1 uses 100 * largest dimension)
	#[arg(long, default_value_t = 0.0)]
	length: f64,

	/// Worker threads (0 = one per core)
	#[arg(short, long, default_value_t = 0)]
	threads: usize,

	/// Hide the progress bar
	#[arg(short, long)]
	quiet: bool,
}

fn load_grid(args: &Args) -> Result<Grid3D> {
	if let Some(path) = &args.input {
		let dims = match &args.dims {
			Some(text) => Some(raw_input::parse_dims(text).with_context(|| format!("cannot parse dimensions '{}'", text))?),
			None => None,
		};
		return raw_input::load_raw_volume_path(path, dims, args.voxel_length)
			.with_context(|| format!("failed to load {}", path.display()));
	}

	let grid = match args.synthetic {
		Some(Synthetic::Open) => manip::synthetic_open(args.size, args.voxel_length),
		Some(Synthetic::Channel) => manip::synthetic_channel(args.size, (args.size / 4).max(1), args.voxel_length),
		Some(Synthetic::Spheres) => {
			let count = (args.size * args.size * args.size) / 400;
			manip::synthetic_spheres(args.size, count.max(1), args.size as f64 / 10.0, args.seed, args.voxel_length)
		}
		None => bail!("give either --input or --synthetic"),
	};
	Ok(grid)
}

fn main() -> Result<ExitCode> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	info::print_method_reference();
	info::print_compile_info();

	let grid = load_grid(&args)?;

	let free_path = if args.continuum {
		FreePathMode::Continuum { knudsen: args.knudsen }
	} else {
		FreePathMode::Prescribed(args.mean_free_path)
	};
	let config = ParticleTortuosityConfig {
		void_cutoff: VoidCutoff::new(args.void_low, args.void_high),
		particles: args.particles,
		free_path,
		mean_velocity: args.velocity,
		seed: args.seed,
		total_length: args.length,
		threads: args.threads,
		show_progress: !args.quiet,
		..Default::default()
	};

	let result = compute_particle_tortuosity(&grid, config);
	if result.is_sentinel() {
		eprintln!("Tortuosity computation failed; see the log above");
		return Ok(ExitCode::FAILURE);
	}

	println!("Porosity:               {:.6}", result.porosity);
	println!("Mean intercept length:  {:.6e}", result.mean_intercept_length);
	println!("Mean free path (voxel): {:.6}", result.mean_free_path);
	println!(
		"Diffusion coefficient:  {:.6e} {:.6e} {:.6e}",
		result.diffusion_coefficient[0], result.diffusion_coefficient[1], result.diffusion_coefficient[2]
	);
	println!(
		"Normalized diffusivity: {:.6} {:.6} {:.6}",
		result.normalized_diffusivity[0], result.normalized_diffusivity[1], result.normalized_diffusivity[2]
	);
	println!(
		"Tortuosity:             {:.6} {:.6} {:.6}",
		result.tortuosity[0], result.tortuosity[1], result.tortuosity[2]
	);
	Ok(ExitCode::SUCCESS)
}
