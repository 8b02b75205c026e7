//! Turns a [`ClassFile`] back into its JBC textual form (spec §4, §6).
//!
//! Mirrors the parser's grammar in reverse: [`labels`] assigns a name to every label a [`Code`]
//! references, the sibling modules format constants/annotations/attributes, and this module
//! drives the top-level class/field/method layout.

mod annotation;
mod attribute;
mod constant;
mod instruction;
mod labels;

use duke::tree::class::{ClassAccess, ClassFile, ClassName};
use duke::tree::descriptor::{ArrayType, Type};
use duke::tree::field::{Field, FieldAccess};
use duke::tree::method::{Method, MethodAccess};
use duke::tree::version::Version;
use crate::error::PrintError;

/// Accumulates the textual output, tracking the current indentation depth.
pub(crate) struct Out {
	buf: String,
	indent: usize,
}

impl Out {
	fn new() -> Out {
		Out { buf: String::new(), indent: 0 }
	}

	pub(crate) fn line(&mut self, s: impl AsRef<str>) {
		for _ in 0..self.indent {
			self.buf.push('\t');
		}
		self.buf.push_str(s.as_ref());
		self.buf.push('\n');
	}

	pub(crate) fn indent(&mut self) {
		self.indent += 1;
	}

	pub(crate) fn dedent(&mut self) {
		self.indent -= 1;
	}
}

pub(crate) fn print_class(class: &ClassFile) -> Result<String, PrintError> {
	let mut out = Out::new();

	out.line(format!("version {};", format_version(class.version)));

	let kind = class_kind_keyword(class.access);
	let mut header = format!("{}{} {}", format_class_modifiers(class.access), kind, format_class_name(&class.name));

	if class.access.is_interface {
		// The `java.lang.annotation.Annotation` marker super-interface is implied by the
		// `@interface` keyword itself (see `Parser::parse_class_file`'s auto-append), so it's
		// left out here unless some other interface is also present.
		let shown: Vec<ClassName> = class.interfaces.iter()
			.filter(|i| !class.access.is_annotation || format_class_name(i) != "java.lang.annotation.Annotation")
			.cloned()
			.collect();
		if !shown.is_empty() {
			header.push_str(&format!(" extends {}", format_class_name_list(&shown)));
		}
	} else {
		// Mirrors the implicit super class the parser fills in when no `extends` is written:
		// `java.lang.Enum` for enums, `java.lang.Object` otherwise. Only an explicit deviation
		// from that default needs to be spelled out.
		let implied_super = if class.access.is_enum { "java.lang.Enum" } else { "java.lang.Object" };
		if let Some(super_class) = &class.super_class {
			if format_class_name(super_class) != implied_super {
				header.push_str(&format!(" extends {}", format_class_name(super_class)));
			}
		}
		if !class.interfaces.is_empty() {
			header.push_str(&format!(" implements {}", format_class_name_list(&class.interfaces)));
		}
	}
	out.line(header);

	attribute::print_class_attributes(&mut out, class)?;

	out.line("{");
	out.indent();
	for field in &class.fields {
		print_field(&mut out, field)?;
	}
	for method in &class.methods {
		print_method(&mut out, method)?;
	}
	out.dedent();
	out.line("}");

	Ok(out.buf)
}

/// Inverts [`super::parser::parse_version_number`]: majors 45-48 (Java 1.1-1.4) print in the
/// historical `1.x` form, majors 49 and up print as a bare major number. The two parser branches
/// overlap for majors 49-54, so this picks exactly one canonical spelling per major.
fn format_version(v: Version) -> String {
	let major = v.major();
	if (45..=48).contains(&major) {
		format!("{:.1}", 1.0 + (major - 45) as f64 / 10.0)
	} else {
		format!("{}", major as i64 - 44)
	}
}

fn class_kind_keyword(access: ClassAccess) -> &'static str {
	if access.is_module {
		"module"
	} else if access.is_annotation {
		"@interface"
	} else if access.is_interface {
		"interface"
	} else if access.is_enum {
		"enum"
	} else {
		"class"
	}
}

/// Only the flags not already implied by [`class_kind_keyword`]'s choice of keyword (`super`,
/// `interface`, `abstract`, `annotation`, `enum`, `module` are all re-derived from the keyword by
/// [`Parser::expect_class_access_flags`]).
fn format_class_modifiers(access: ClassAccess) -> String {
	let mut s = String::new();
	if access.is_public {
		s.push_str("public ");
	}
	if access.is_final {
		s.push_str("final ");
	}
	if access.is_synthetic {
		s.push_str("synthetic ");
	}
	s
}

pub(crate) fn format_field_modifiers(access: FieldAccess) -> String {
	let mut s = String::new();
	if access.is_public { s.push_str("public "); }
	if access.is_private { s.push_str("private "); }
	if access.is_protected { s.push_str("protected "); }
	if access.is_static { s.push_str("static "); }
	if access.is_final { s.push_str("final "); }
	if access.is_volatile { s.push_str("volatile "); }
	if access.is_transient { s.push_str("transient "); }
	if access.is_synthetic { s.push_str("synthetic "); }
	if access.is_enum { s.push_str("enum "); }
	s
}

pub(crate) fn format_method_modifiers(access: MethodAccess) -> String {
	let mut s = String::new();
	if access.is_public { s.push_str("public "); }
	if access.is_private { s.push_str("private "); }
	if access.is_protected { s.push_str("protected "); }
	if access.is_static { s.push_str("static "); }
	if access.is_final { s.push_str("final "); }
	if access.is_synchronized { s.push_str("synchronized "); }
	if access.is_bridge { s.push_str("bridge "); }
	if access.is_varargs { s.push_str("varargs "); }
	if access.is_native { s.push_str("native "); }
	if access.is_abstract { s.push_str("abstract "); }
	if access.is_strict { s.push_str("strictfp "); }
	if access.is_synthetic { s.push_str("synthetic "); }
	s
}

fn print_field(out: &mut Out, field: &Field) -> Result<(), PrintError> {
	let ty = field.descriptor.as_slice().parse()
		.map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?
		.0;
	let mut line = format!("{}{} {}", format_field_modifiers(field.access), format_type(&ty), field.name);
	if let Some(value) = &field.constant_value {
		line.push_str(&format!(" = {}", constant::format_constant_value(value, Some(&ty))));
	}
	out.line(line);
	out.indent();
	attribute::print_field_attributes(out, field)?;
	out.dedent();
	out.line(";");
	Ok(())
}

fn print_method(out: &mut Out, method: &Method) -> Result<(), PrintError> {
	let parsed = method.descriptor.as_slice().parse()
		.map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?;

	let mut line = format!("{}{} {}(", format_method_modifiers(method.access), format_return_type(&parsed.return_descriptor), method.name);
	let params = format_method_params(method, &parsed.parameter_descriptors);
	line.push_str(&params);
	line.push(')');

	if let Some(exceptions) = &method.exceptions {
		if !exceptions.is_empty() {
			line.push_str(&format!(" throws {}", format_class_name_list(exceptions)));
		}
	}
	out.line(line);

	out.indent();
	attribute::print_method_attributes(out, method)?;
	out.dedent();

	match &method.code {
		Some(code) => {
			out.line("{");
			out.indent();
			instruction::print_code(out, code)?;
			out.dedent();
			out.line("}");
		}
		None => out.line(";"),
	}
	Ok(())
}

fn format_method_params(method: &Method, params: &[Type]) -> String {
	let names = method.method_parameters.as_ref();
	params.iter().enumerate().map(|(i, ty)| {
		let mut s = String::new();
		if let Some(p) = names.and_then(|ps| ps.get(i)) {
			if p.flags.is_final { s.push_str("final "); }
			if p.flags.is_synthetic { s.push_str("synthetic "); }
			if p.flags.is_mandated { s.push_str("mandated "); }
		}
		s.push_str(&format_type(ty));
		if let Some(name) = names.and_then(|ps| ps.get(i)).and_then(|p| p.name.as_ref()) {
			s.push(' ');
			s.push_str(&name.to_string());
		}
		s
	}).collect::<Vec<_>>().join(", ")
}

pub(crate) fn format_class_name(c: &ClassName) -> String {
	c.to_string().replace('/', ".")
}

fn format_class_name_list(names: &[ClassName]) -> String {
	names.iter().map(format_class_name).collect::<Vec<_>>().join(", ")
}

pub(crate) fn format_type(ty: &Type) -> String {
	match ty {
		Type::B => "byte".to_string(),
		Type::C => "char".to_string(),
		Type::D => "double".to_string(),
		Type::F => "float".to_string(),
		Type::I => "int".to_string(),
		Type::J => "long".to_string(),
		Type::S => "short".to_string(),
		Type::Z => "boolean".to_string(),
		Type::Object(c) => format_class_name(c),
		Type::Array(dims, elem) => {
			let mut s = format_array_elem_type(elem);
			for _ in 0..*dims {
				s.push_str("[]");
			}
			s
		}
	}
}

fn format_array_elem_type(elem: &ArrayType) -> String {
	match elem {
		ArrayType::B => "byte".to_string(),
		ArrayType::C => "char".to_string(),
		ArrayType::D => "double".to_string(),
		ArrayType::F => "float".to_string(),
		ArrayType::I => "int".to_string(),
		ArrayType::J => "long".to_string(),
		ArrayType::S => "short".to_string(),
		ArrayType::Z => "boolean".to_string(),
		ArrayType::Object(c) => format_class_name(c),
	}
}

pub(crate) fn format_return_type(ty: &Option<Type>) -> String {
	match ty {
		None => "void".to_string(),
		Some(t) => format_type(t),
	}
}

/// Escapes `s` into a quoted JBC string literal: characters outside the printable ASCII range
/// (`< 0x20` or `> 0x7E`) become `\ooo` octal escapes, and `"`, `\` get a backslash escape.
pub(crate) fn format_string_literal(s: &str) -> String {
	let mut out = String::with_capacity(s.len() + 2);
	out.push('"');
	for c in s.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			c if (c as u32) < 0x20 || (c as u32) > 0x7E => {
				out.push_str(&format!("\\{:03o}", c as u32));
			}
			c => out.push(c),
		}
	}
	out.push('"');
	out
}

/// Escapes `c` into a quoted JBC char literal, the same way [`format_string_literal`] does
/// for `'` instead of `"`.
pub(crate) fn format_char_literal(c: char) -> String {
	let mut out = String::with_capacity(3);
	out.push('\'');
	match c {
		'\'' => out.push_str("\\'"),
		'\\' => out.push_str("\\\\"),
		c if (c as u32) < 0x20 || (c as u32) > 0x7E => {
			out.push_str(&format!("\\{:03o}", c as u32));
		}
		c => out.push(c),
	}
	out.push('\'');
	out
}
