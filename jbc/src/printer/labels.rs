//! Labels Collector (spec §4.9): assigns every [`Label`] referenced by a [`Code`] attribute a
//! stable, sequential source-level name, the same way the binary reader assigns `Label` ids to
//! offsets on the read side (see `duke::class_reader`), just the other way around.

use std::collections::HashMap;
use duke::tree::method::code::{Code, Label};
use crate::error::PrintError;

pub(crate) struct Labels {
	names: HashMap<u16, String>,
}

impl Labels {
	/// Walks `code.instructions` in order, naming every label attached to an instruction
	/// `label1`, `label2`, ... in the order encountered, then `code.last_label` if it wasn't
	/// already named. Every other label a `Code` can reference (exception table, line numbers,
	/// local variables, type-annotation targets) is guaranteed by the binary reader to resolve to
	/// one of those two sources, so no further pass over `Code` is needed.
	pub(crate) fn build(code: &Code) -> Labels {
		let mut names = HashMap::new();
		let mut next = 1;
		for entry in &code.instructions {
			if let Some(label) = entry.label {
				names.entry(label.id()).or_insert_with(|| {
					let name = format!("label{next}");
					next += 1;
					name
				});
			}
		}
		if let Some(last) = code.last_label {
			names.entry(last.id()).or_insert_with(|| {
				let name = format!("label{next}");
				next += 1;
				name
			});
		}
		Labels { names }
	}

	pub(crate) fn name(&self, label: Label) -> Result<String, PrintError> {
		self.names.get(&label.id()).cloned().ok_or(PrintError::MissingLabel(label))
	}
}
