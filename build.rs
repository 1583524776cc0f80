use std::process::Command;

fn date_field(format: &str) -> String {
	Command::new("date")
	.arg(format)
	.output()
	.map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
	.unwrap_or_else(|_| "unknown".to_string())
}

fn main() {
	let compile_date = date_field("+%Y-%m-%d");
	let compile_time = date_field("+%H:%M:%S");

	println!("cargo:rustc-env=COMPILE_DATE={}", compile_date);
	println!("cargo:rustc-env=COMPILE_TIME={}", compile_time);
	println!("cargo:rerun-if-changed=build.rs");
}
