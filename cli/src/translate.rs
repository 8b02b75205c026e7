use anyhow::{anyhow, Context, Result};
use duke::preverify::{NoopPreverifier, Preverifier};
use crate::classpath::Classpath;

/// What a container entry's extension says should be done with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
	Disassemble,
	Assemble,
	Copy,
}

pub(crate) fn classify(name: &str) -> EntryKind {
	if name.ends_with(".class") {
		EntryKind::Disassemble
	} else if name.ends_with(".jbc") {
		EntryKind::Assemble
	} else {
		EntryKind::Copy
	}
}

/// `name.class` -> `name.jbc`, `name.jbc` -> `name.class`; anything else is returned unchanged.
pub(crate) fn translated_name(name: &str, kind: EntryKind) -> String {
	match kind {
		EntryKind::Disassemble => format!("{}.jbc", &name[..name.len() - ".class".len()]),
		EntryKind::Assemble => format!("{}.class", &name[..name.len() - ".jbc".len()]),
		EntryKind::Copy => name.to_string(),
	}
}

/// Reads a binary `.class` file and prints its JBC text form.
pub(crate) fn disassemble(bytes: &[u8], name: &str) -> Result<Vec<u8>> {
	let mut cursor = std::io::Cursor::new(bytes);
	let class = duke::read_class(&mut cursor)
		.with_context(|| anyhow!("failed to read class file {name}"))?;

	let source = jbc::print(&class)
		.with_context(|| anyhow!("failed to disassemble {name}"))?;

	Ok(source.into_bytes())
}

/// Parses a JBC source text and assembles it into a binary `.class` file.
///
/// If a classpath was supplied, a [`duke::preverify::Preverifier`] is run over the assembled
/// class before it's written out; this repository ships only [`NoopPreverifier`], so methods keep
/// whatever `StackMapTable` frames the source wrote explicitly and gain no others (see
/// `DESIGN.md`).
pub(crate) fn assemble(bytes: &[u8], name: &str, classpath: Option<&Classpath>) -> Result<Vec<u8>> {
	let source = std::str::from_utf8(bytes)
		.with_context(|| anyhow!("{name} is not valid utf-8"))?;

	let mut class = jbc::parse(source)
		.with_context(|| anyhow!("failed to assemble {name}"))?;

	if let Some(classpath) = classpath {
		NoopPreverifier.preverify(&mut class, classpath)
			.with_context(|| anyhow!("preverification of {name} failed"))?;
	}

	let mut out = Vec::new();
	duke::write_class(&mut out, &class)
		.with_context(|| anyhow!("failed to write class file for {name}"))?;

	Ok(out)
}

pub(crate) fn translate_entry(name: &str, bytes: &[u8], classpath: Option<&Classpath>) -> Result<(EntryKind, Vec<u8>)> {
	let kind = classify(name);
	let translated = match kind {
		EntryKind::Disassemble => {
			log::info!("disassembling {name}");
			disassemble(bytes, name)?
		},
		EntryKind::Assemble => {
			log::info!("assembling {name}");
			assemble(bytes, name, classpath)?
		},
		EntryKind::Copy => {
			log::info!("copying {name}");
			bytes.to_vec()
		},
	};
	Ok((kind, translated))
}
