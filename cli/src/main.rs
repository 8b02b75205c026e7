//! `assembler` — a command-line bidirectional translator between binary `.class` files and the
//! JBC text assembly dialect (see the `jbc` crate), plus container I/O for `.jar`/`.jmod` files
//! and directories (see `container`).

mod classpath;
mod container;
mod logging;
mod translate;

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::{Context, Result};
use clap::Parser;
use crate::classpath::Classpath;
use crate::container::Input;

/// Translates Java class files to and from the JBC text format.
#[derive(Debug, Parser)]
struct Cli {
	/// Be verbose. Pass twice for trace-level logging.
	#[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
	verbose: u8,

	/// A path-separator-delimited list of directories/jars/jmods used to resolve library classes
	/// during preverification.
	#[arg(short = 'c', long = "classpath")]
	classpath: Option<String>,

	/// A `.class`/`.jbc` file, a directory, or a `.jar`/`.jmod` archive.
	input: PathBuf,

	/// Where to write the translated output; same kind of thing as `input`.
	output: PathBuf,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	let verbose = cli.verbose;

	if let Err(e) = logging::init(verbose) {
		eprintln!("failed to initialize logging: {e:#}");
		return ExitCode::FAILURE;
	}

	match run(cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			log::error!("{e:#}");
			ExitCode::FAILURE
		},
	}
}

fn run(cli: Cli) -> Result<()> {
	let Cli { verbose: _, classpath, input, output } = cli;

	let classpath = classpath
		.map(|raw| Classpath::parse(&raw))
		.transpose()
		.context("failed to set up classpath")?;

	log::info!("reading input from {input:?}");
	match container::read_input(&input)? {
		Input::SingleFile { name, content } => {
			let (kind, translated) = translate::translate_entry(&name, &content, classpath.as_ref())?;
			let output = resolve_single_output(&output, &name, kind);
			container::write_single_output(&output, &translated)?;
		},
		Input::Container { entries } => {
			let translated = entries.into_iter()
				.map(|(name, content)| {
					let (kind, translated) = translate::translate_entry(&name, &content, classpath.as_ref())?;
					Ok((translate::translated_name(&name, kind), translated))
				})
				.collect::<Result<Vec<_>>>()?;

			container::write_container_output(&output, translated)?;
		},
	}

	log::info!("wrote output to {output:?}");
	Ok(())
}

/// If `output` already names a directory, the single translated file is placed inside it under
/// its translated name; otherwise `output` is taken as the exact file path to write.
fn resolve_single_output(output: &std::path::Path, input_name: &str, kind: translate::EntryKind) -> PathBuf {
	if output.is_dir() {
		output.join(translate::translated_name(input_name, kind))
	} else {
		output.clone()
	}
}
