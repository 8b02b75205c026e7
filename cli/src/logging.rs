use anyhow::{Context, Result};
use log::LevelFilter;

/// Sets up [`log`] to print to stderr, with the level controlled by a repeated `-v` flag.
///
/// Formalises the `fern` dependency that the teacher declared but never wired up: a standalone
/// CLI binary is exactly where a logging dispatcher belongs.
pub(crate) fn init(verbosity: u8) -> Result<()> {
	let level = match verbosity {
		0 => LevelFilter::Info,
		1 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!(
				"[{} {} {}] {}",
				humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
				record.level(),
				record.target(),
				message,
			))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to set up logging dispatcher")
}
