use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Whether a path names a directory, a `.jmod` archive, or any other (jar-like) archive.
///
/// `.jmod` files nest their class entries under a `classes/` directory, which this layer strips
/// on read and re-adds on write so the rest of the pipeline only ever sees plain entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
	Directory,
	Jmod,
	Archive,
}

fn container_kind(path: &Path) -> ContainerKind {
	if path.is_dir() {
		ContainerKind::Directory
	} else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("jmod")) {
		ContainerKind::Jmod
	} else {
		ContainerKind::Archive
	}
}

/// A single input either names one file to translate, or a directory/archive whose entries are
/// each routed independently by extension (see `translate::classify`).
pub(crate) enum Input {
	SingleFile { name: String, content: Vec<u8> },
	Container { entries: Vec<(String, Vec<u8>)> },
}

pub(crate) fn read_input(path: &Path) -> Result<Input> {
	if path.is_file() && !is_archive_extension(path) {
		let name = path.file_name()
			.ok_or_else(|| anyhow!("{path:?} has no file name"))?
			.to_string_lossy()
			.into_owned();
		let content = std::fs::read(path).with_context(|| anyhow!("failed to read {path:?}"))?;
		return Ok(Input::SingleFile { name, content });
	}

	let entries = match container_kind(path) {
		ContainerKind::Directory => read_directory(path)?,
		ContainerKind::Jmod => read_zip(path, true)?,
		ContainerKind::Archive => read_zip(path, false)?,
	};

	Ok(Input::Container { entries })
}

fn is_archive_extension(path: &Path) -> bool {
	path.extension().is_some_and(|ext| {
		ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("jmod") || ext.eq_ignore_ascii_case("zip")
	})
}

fn read_directory(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
	WalkDir::new(dir)
		.follow_links(false)
		.into_iter()
		.filter(|res| res.as_ref().is_ok_and(|entry| !entry.file_type().is_dir()))
		.map(|res| {
			let entry = res.with_context(|| anyhow!("failed to walk directory {dir:?}"))?;
			let relative = entry.path().strip_prefix(dir)
				.with_context(|| anyhow!("{:?} is not inside {dir:?}", entry.path()))?;
			let name = to_entry_name(relative);
			let content = std::fs::read(entry.path())
				.with_context(|| anyhow!("failed to read {:?}", entry.path()))?;
			Ok((name, content))
		})
		.collect()
}

fn to_entry_name(relative: &Path) -> String {
	relative.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/")
}

fn read_zip(path: &Path, is_jmod: bool) -> Result<Vec<(String, Vec<u8>)>> {
	let file = File::open(path).with_context(|| anyhow!("failed to open {path:?}"))?;
	let mut archive = ZipArchive::new(file)
		.with_context(|| anyhow!("failed to read {path:?} as a zip archive"))?;

	(0..archive.len())
		.map(|i| {
			let mut entry = archive.by_index(i)
				.with_context(|| anyhow!("failed to read entry {i} of {path:?}"))?;
			if entry.is_dir() {
				return Ok(None);
			}

			let name = entry.name().to_string();
			let name = if is_jmod {
				name.strip_prefix("classes/").map(str::to_string).unwrap_or(name)
			} else {
				name
			};

			let mut content = Vec::with_capacity(entry.size() as usize);
			entry.read_to_end(&mut content)?;
			Ok(Some((name, content)))
		})
		.filter_map(Result::transpose)
		.collect()
}

/// Writes the single translated output file of a [`Input::SingleFile`] input.
pub(crate) fn write_single_output(path: &Path, content: &[u8]) -> Result<()> {
	write_single_file(path, content)
}

/// Writes translated entries back out, mirroring [`read_input`]'s container kind so
/// `assembler in.jmod out.jmod` round-trips the `classes/` prefix.
pub(crate) fn write_container_output(path: &Path, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
	write_container(path, entries)
}

fn write_single_file(path: &Path, content: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.with_context(|| anyhow!("failed to create directory {parent:?}"))?;
	}
	std::fs::write(path, content).with_context(|| anyhow!("failed to write {path:?}"))
}

fn write_container(path: &Path, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
	let is_jmod = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("jmod"));
	let looks_like_archive = is_jmod || path.extension().is_some_and(|ext| {
		ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip")
	});

	if looks_like_archive {
		write_zip(path, entries, is_jmod)
	} else {
		write_directory(path, entries)
	}
}

fn write_directory(dir: &Path, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
	for (name, content) in entries {
		let path = dir.join(PathBuf::from_iter(name.split('/')));
		write_single_file(&path, &content)?;
	}
	Ok(())
}

fn write_zip(path: &Path, entries: Vec<(String, Vec<u8>)>, is_jmod: bool) -> Result<()> {
	let file = File::create(path).with_context(|| anyhow!("failed to create {path:?}"))?;
	let mut writer = ZipWriter::new(file);
	let options = SimpleFileOptions::default();

	for (name, content) in entries {
		let name = if is_jmod && name.ends_with(".class") {
			format!("classes/{name}")
		} else {
			name
		};

		writer.start_file(&name, options)
			.with_context(|| anyhow!("failed to start zip entry {name}"))?;
		writer.write_all(&content)
			.with_context(|| anyhow!("failed to write zip entry {name}"))?;
	}

	writer.finish().with_context(|| anyhow!("failed to finalize {path:?}"))?;
	Ok(())
}
