use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TortuosityError {
	#[error("Configuration error: {0}")]
	InvalidConfig(String),

	#[error("No void voxels match the cutoff; nothing to walk through")]
	NoVoidPhase,

	#[error("Thread pool error: {0}")]
	ThreadPool(String),

	#[error("Simulation cancelled before phase {phase}")]
	Cancelled { phase: usize },

	#[error("Direction resampling still degenerate after {attempts} attempts")]
	DegenerateDirection { attempts: usize },
}

pub type SolverResult<T> = Result<T, TortuosityError>;
