use std::env;
use std::sync::Once;

/// Name of the running executable, or a fallback
pub fn program_name() -> String {
	env::current_exe()
	.ok()
	.as_ref()
	.and_then(|path| path.file_name()) // Extract filename
	.and_then(|name| name.to_str()) // Convert to &str
	.unwrap_or("voxel_tortuosity") // Fallback
	.to_string()
}

/// Print the method reference (only prints once)
pub fn print_method_reference() {
	static PRINT_REFERENCE_ONCE: Once = Once::new();
	PRINT_REFERENCE_ONCE.call_once(|| {
		eprintln!("Method: random-walk tortuosity with diffuse (cosine-law) wall reflection");
		eprintln!("Diffusivity from the late-time slope of the mean squared displacement\n");
	});
}

/// Print compilation information (only prints once)
pub fn print_compile_info() {
	static PRINT_COMPILE_ONCE: Once = Once::new();
	PRINT_COMPILE_ONCE.call_once(|| {
		eprintln!("Program: {}", program_name());
		eprintln!(
			"Compiled on: {} at {}",
			env!("COMPILE_DATE"),
					 env!("COMPILE_TIME")
		);
		eprintln!("Version: {}", env!("CARGO_PKG_VERSION"));
	});
}
