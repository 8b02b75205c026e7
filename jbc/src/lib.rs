//! A crate for translating [Java class files](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html)
//! to and from a textual assembly representation ("JBC"), built on top of the `duke` crate's
//! in-memory tree representation ([`duke::tree::class::ClassFile`]).
//!
//! [`parse`] reads JBC source into a `ClassFile`; [`print`] goes the other way. Neither function
//! touches the binary `.class` format directly — that's `duke::read_class`/`duke::write_class`.

pub mod error;
mod keywords;
mod parser;
mod printer;
mod token;

use duke::tree::class::ClassFile;
use crate::error::{ParseError, PrintError};

/// Parses a complete JBC source file into a [`ClassFile`].
pub fn parse(source: &str) -> Result<ClassFile, ParseError> {
	parser::parse_class(source)
}

/// Disassembles a [`ClassFile`] into its JBC source form.
pub fn print(class: &ClassFile) -> Result<String, PrintError> {
	printer::print_class(class)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	/// Asserts that `source` round-trips through `print(parse(source))` back to a `ClassFile`
	/// equal to the one `source` itself parses to (spec §8, law 2, modulo label renaming, which
	/// doesn't apply here since the printer's label names are assigned deterministically from
	/// first-occurrence order and so is each reparse).
	fn assert_round_trips(source: &str) -> ClassFile {
		let class = parse(source).unwrap_or_else(|e| panic!("failed to parse source:\n{source}\nerror: {e}"));
		let printed = print(&class).unwrap_or_else(|e| panic!("failed to print class: {e}"));
		let reparsed = parse(&printed).unwrap_or_else(|e| panic!("failed to reparse printed source:\n{printed}\nerror: {e}"));
		assert_eq!(class, reparsed, "printed source was:\n{printed}");
		class
	}

	#[test]
	fn empty_class() {
		assert_round_trips("version 8;\npublic class Foo {\n}\n");
	}

	#[test]
	fn field_with_constant_value() {
		assert_round_trips(r#"
			version 8;
			public class Foo {
				public static final int BAR = 42;
			}
		"#);
	}

	#[test]
	fn method_with_self_loop() {
		let class = assert_round_trips(r#"
			version 8;
			public class Foo {
				public static void loop() {
					label1:
					goto label1;
				}
			}
		"#);
		assert_eq!(class.methods.len(), 1);
		assert!(class.methods[0].code.is_some());
	}

	#[test]
	fn method_with_branch_and_explicit_frames() {
		let class = assert_round_trips(r#"
			version 8;
			public class Foo {
				public static int branchy(int) {
					iload 0;
					ifeq else_;
					iconst_1;
					goto end_;
					else_:
					frame same;
					iconst_0;
					end_:
					frame same;
					ireturn;
				}
			}
		"#);
		let code = class.methods[0].code.as_ref().unwrap();
		let frames = code.instructions.iter().filter(|e| e.frame.is_some()).count();
		assert_eq!(frames, 2);
	}

	#[test]
	fn frame_kinds_append_and_full_with_object_type() {
		let class = assert_round_trips(r#"
			version 8;
			public class Foo {
				public static void withFrames(int) {
					iload 0;
					ifeq target;
					aconst_null;
					astore 1;
					goto after;
					target:
					frame append { object java.lang.String };
					aconst_null;
					astore 1;
					after:
					frame full locals { integer object java.lang.String } stack { };
					return;
				}
			}
		"#);
		let code = class.methods[0].code.as_ref().unwrap();
		let frame_kinds: Vec<_> = code.instructions.iter().filter_map(|e| e.frame.as_ref()).collect();
		assert_eq!(frame_kinds.len(), 2);
		assert!(matches!(frame_kinds[0], duke::tree::method::code::StackMapData::Append { .. }));
		assert!(matches!(frame_kinds[1], duke::tree::method::code::StackMapData::Full { .. }));
	}

	#[test]
	fn module_declaration() {
		let class = assert_round_trips(r#"
			version 9;
			module module_info [
				Module {
					com.example.mymodule;
					requires {
						java.base;
					}
					exports {
						com.example.api;
					}
				}
			];
		"#);
		let module = class.module.expect("module attribute should have been parsed");
		assert_eq!(module.requires.len(), 1);
		assert_eq!(module.exports.len(), 1);
	}
}
