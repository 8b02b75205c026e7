use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use duke::preverify::LibraryClasspath;
use duke::tree::class::{ClassFile, ClassName};
use zip::ZipArchive;

/// One entry of a `--classpath` list: a directory of `.class` files, or a `.jar`/`.jmod` archive.
///
/// Archives are opened once and indexed, matching the `dukebox` crate's `FileJar` / `zip_impls.rs`
/// approach of wrapping a [`ZipArchive`] directly rather than re-reading the central directory on
/// every lookup.
enum ClasspathEntry {
	Directory(PathBuf),
	Jar { archive: RefCell<ZipArchive<File>> },
	/// Like [`ClasspathEntry::Jar`], but class entries are stored under a `classes/` prefix.
	Jmod { archive: RefCell<ZipArchive<File>> },
}

impl ClasspathEntry {
	fn open(path: &Path) -> Result<ClasspathEntry> {
		let is_jmod = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("jmod"));

		if path.is_dir() {
			Ok(ClasspathEntry::Directory(path.to_path_buf()))
		} else {
			let file = File::open(path)
				.with_context(|| anyhow!("failed to open classpath entry {path:?}"))?;
			let archive = ZipArchive::new(file)
				.with_context(|| anyhow!("failed to read {path:?} as a zip archive"))?;
			let archive = RefCell::new(archive);

			Ok(if is_jmod {
				ClasspathEntry::Jmod { archive }
			} else {
				ClasspathEntry::Jar { archive }
			})
		}
	}

	fn resolve(&self, name: &ClassName) -> Result<Option<ClassFile>> {
		let class_file_name = format!("{name}.class");

		let bytes = match self {
			ClasspathEntry::Directory(dir) => {
				let path = dir.join(&class_file_name);
				if path.is_file() {
					Some(std::fs::read(&path).with_context(|| anyhow!("failed to read {path:?}"))?)
				} else {
					None
				}
			},
			ClasspathEntry::Jar { archive } => read_zip_entry(archive, &class_file_name)?,
			ClasspathEntry::Jmod { archive } => read_zip_entry(archive, &format!("classes/{class_file_name}"))?,
		};

		bytes
			.map(|bytes| {
				let mut cursor = std::io::Cursor::new(bytes);
				duke::read_class(&mut cursor).with_context(|| anyhow!("failed to parse class {name} found on classpath"))
			})
			.transpose()
	}
}

fn read_zip_entry(archive: &RefCell<ZipArchive<File>>, name: &str) -> Result<Option<Vec<u8>>> {
	use std::io::Read;

	let mut archive = archive.borrow_mut();
	match archive.by_name(name) {
		Ok(mut entry) => {
			let mut data = Vec::with_capacity(entry.size() as usize);
			entry.read_to_end(&mut data)?;
			Ok(Some(data))
		},
		Err(zip::result::ZipError::FileNotFound) => Ok(None),
		Err(e) => Err(anyhow!("could not read {name} from archive: {e}")),
	}
}

/// The `;`/`:`-delimited (platform path-separator) classpath a [`duke::preverify::Preverifier`]
/// consults to resolve supertypes and interfaces.
pub(crate) struct Classpath(Vec<ClasspathEntry>);

impl Classpath {
	pub(crate) fn parse(raw: &str) -> Result<Classpath> {
		let entries = std::env::split_paths(raw)
			.map(|path| ClasspathEntry::open(&path))
			.collect::<Result<_>>()
			.context("failed to set up classpath")?;

		Ok(Classpath(entries))
	}
}

impl LibraryClasspath for Classpath {
	fn resolve(&self, name: &ClassName) -> Result<Option<ClassFile>> {
		for entry in &self.0 {
			if let Some(class) = entry.resolve(name)? {
				return Ok(Some(class));
			}
		}
		Ok(None)
	}
}
