//! Formats class/field/method attribute blocks (spec §4.5, §6); the mirror image of
//! `parser::attribute`.
//!
//! A `Code` attribute has no explicit spelling of its own: the method body `{ ... }` printed by
//! [`super::print_method`] already is the "shorthand" form `parser::attribute` expects (the
//! `Code` keyword is reserved in the attribute vocabulary only to reject it if ever written
//! inside a method's `[ ... ]` block).

use duke::tree::annotation::Annotation;
use duke::tree::class::{ClassFile, EnclosingMethod, InnerClass, InnerClassFlags};
use duke::tree::field::Field;
use duke::tree::method::Method;
use duke::tree::module::{
	Module, ModuleExportsFlags, ModuleFlags, ModuleName, ModuleOpensFlags, ModuleRequiresFlags,
};
use duke::tree::type_annotation::TypeAnnotation;
use crate::error::PrintError;
use super::annotation::{format_annotation, format_element_value, format_type_annotation_class, format_type_annotation_field, format_type_annotation_method};
use super::{format_class_name, format_string_literal, Out};

fn print_block(out: &mut Out, lines: Vec<String>) {
	if lines.is_empty() {
		return;
	}
	out.line("[");
	out.indent();
	for line in lines {
		out.line(line);
	}
	out.dedent();
	out.line("]");
}

fn format_annotation_list(annotations: &[Annotation]) -> Result<Option<String>, PrintError> {
	if annotations.is_empty() {
		return Ok(None);
	}
	let mut s = String::from("{");
	for a in annotations {
		s.push(' ');
		s.push_str(&format_annotation(a)?);
	}
	s.push_str(" }");
	Ok(Some(s))
}

/// One `format_annotation_list`-shaped entry per formal parameter, in declaration order, matching
/// the binary attribute's own dense, index-free layout (spec §4.6).
fn format_parameter_annotations_list(parameters: &[Vec<Annotation>]) -> Result<Option<String>, PrintError> {
	if parameters.is_empty() {
		return Ok(None);
	}
	let mut s = String::from("{");
	for annotations in parameters {
		s.push(' ');
		s.push_str(&format_annotation_list(annotations)?.unwrap_or_else(|| "{ }".to_string()));
	}
	s.push_str(" }");
	Ok(Some(s))
}

/// Unlike [`format_annotation_list`]'s entries, a type annotation's own grammar already closes on
/// its type path's trailing `}` (see `parser::annotation::parse_type_annotation_class` and
/// friends) — no `;` separates list entries.
fn format_type_annotation_list<T>(annotations: &[TypeAnnotation<T>], one: impl Fn(&TypeAnnotation<T>) -> Result<String, PrintError>) -> Result<Option<String>, PrintError> {
	if annotations.is_empty() {
		return Ok(None);
	}
	let mut s = String::from("{");
	for a in annotations {
		s.push(' ');
		s.push_str(&one(a)?);
	}
	s.push_str(" }");
	Ok(Some(s))
}

fn format_inner_class_flags(flags: InnerClassFlags) -> String {
	let mut s = String::new();
	if flags.is_public { s.push_str("public "); }
	if flags.is_private { s.push_str("private "); }
	if flags.is_protected { s.push_str("protected "); }
	if flags.is_static { s.push_str("static "); }
	if flags.is_final { s.push_str("final "); }
	if flags.is_abstract { s.push_str("abstract "); }
	if flags.is_synthetic { s.push_str("synthetic "); }
	if flags.is_enum { s.push_str("enum "); }
	s
}

fn format_inner_classes(entries: &[InnerClass]) -> String {
	let mut s = String::from("{");
	for e in entries {
		s.push(' ');
		s.push_str(&format_inner_class_flags(e.flags));
		s.push_str(&format_class_name(&e.inner_class));
		if let Some(outer) = &e.outer_class {
			s.push_str(&format!(" outer {}", format_class_name(outer)));
		}
		if let Some(name) = &e.inner_name {
			s.push_str(&format!(" as {}", format_string_literal(&name.to_string())));
		}
		s.push(';');
	}
	s.push_str(" }");
	s
}

fn format_enclosing_method(em: &EnclosingMethod) -> Result<String, PrintError> {
	let mut s = format_class_name(&em.class);
	if let Some(m) = &em.method {
		let parsed = m.desc.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?;
		let args = parsed.parameter_descriptors.iter().map(super::format_type).collect::<Vec<_>>().join(", ");
		s.push_str(&format!(" {} {}({})", super::format_return_type(&parsed.return_descriptor), m.name, args));
	}
	s.push(';');
	Ok(s)
}

fn format_class_name_brace_list(names: &[duke::tree::class::ClassName]) -> String {
	let mut s = String::from("{");
	for n in names {
		s.push(' ');
		s.push_str(&format_class_name(n));
		s.push(';');
	}
	s.push_str(" }");
	s
}

fn format_module_name_brace_list(names: &[ModuleName]) -> String {
	let mut s = String::from("{");
	for (i, n) in names.iter().enumerate() {
		if i > 0 {
			s.push(',');
		}
		s.push(' ');
		s.push_str(&n.to_string());
	}
	s.push_str(" }");
	s
}

fn format_module_flags(flags: ModuleFlags) -> String {
	let mut s = String::new();
	if flags.is_open { s.push_str("open "); }
	if flags.is_synthetic { s.push_str("synthetic "); }
	if flags.is_mandated { s.push_str("mandated "); }
	s
}

fn format_module_requires_flags(flags: ModuleRequiresFlags) -> String {
	let mut s = String::new();
	if flags.is_transitive { s.push_str("transitive "); }
	if flags.is_static_phase { s.push_str("static_phase "); }
	if flags.is_synthetic { s.push_str("synthetic "); }
	if flags.is_mandated { s.push_str("mandated "); }
	s
}

fn format_module_exports_flags(flags: ModuleExportsFlags) -> String {
	let mut s = String::new();
	if flags.is_synthetic { s.push_str("synthetic "); }
	if flags.is_mandated { s.push_str("mandated "); }
	s
}

fn format_module_opens_flags(flags: ModuleOpensFlags) -> String {
	let mut s = String::new();
	if flags.is_synthetic { s.push_str("synthetic "); }
	if flags.is_mandated { s.push_str("mandated "); }
	s
}

/// Unlike field/method/class modifiers, a module's (and its `requires`/`exports`/`opens`
/// entries') flags follow the identifier rather than leading it (see `parser::attribute::parse_module`).
fn format_module(m: &Module) -> String {
	let mut s = format!("{{ {}", m.name);
	let flags = format_module_flags(m.flags);
	if !flags.is_empty() {
		s.push(' ');
		s.push_str(flags.trim_end());
	}
	if let Some(v) = &m.version {
		s.push_str(&format!(" = {}", format_string_literal(&v.to_string())));
	}
	s.push(';');

	if !m.requires.is_empty() {
		s.push_str(" requires {");
		for r in &m.requires {
			s.push_str(&format!(" {}", r.name));
			let flags = format_module_requires_flags(r.flags);
			if !flags.is_empty() {
				s.push(' ');
				s.push_str(flags.trim_end());
			}
			if let Some(v) = &r.version {
				s.push_str(&format!(" = {}", format_string_literal(&v.to_string())));
			}
			s.push(';');
		}
		s.push_str(" }");
	}
	if !m.exports.is_empty() {
		s.push_str(" exports {");
		for e in &m.exports {
			s.push_str(&format!(" {}", e.name));
			let flags = format_module_exports_flags(e.flags);
			if !flags.is_empty() {
				s.push(' ');
				s.push_str(flags.trim_end());
			}
			if !e.exports_to.is_empty() {
				s.push_str(&format!(" to {}", format_module_name_brace_list(&e.exports_to)));
			}
			s.push(';');
		}
		s.push_str(" }");
	}
	if !m.opens.is_empty() {
		s.push_str(" opens {");
		for o in &m.opens {
			s.push_str(&format!(" {}", o.name));
			let flags = format_module_opens_flags(o.flags);
			if !flags.is_empty() {
				s.push(' ');
				s.push_str(flags.trim_end());
			}
			if !o.opens_to.is_empty() {
				s.push_str(&format!(" to {}", format_module_name_brace_list(&o.opens_to)));
			}
			s.push(';');
		}
		s.push_str(" }");
	}
	if !m.uses.is_empty() {
		s.push_str(&format!(" uses {}", format_class_name_brace_list(&m.uses)));
	}
	if !m.provides.is_empty() {
		s.push_str(" provides {");
		for p in &m.provides {
			s.push_str(&format!(" {} with {}", format_class_name(&p.name), format_class_name_brace_list(&p.provides_with)));
			s.push(';');
		}
		s.push_str(" }");
	}
	s.push_str(" }");
	s
}

pub(crate) fn print_class_attributes(out: &mut Out, class: &ClassFile) -> Result<(), PrintError> {
	let mut lines = Vec::new();
	if let Some(s) = &class.source_file {
		lines.push(format!("SourceFile {};", format_string_literal(&s.to_string())));
	}
	if let Some(s) = &class.source_debug_extension {
		lines.push(format!("SourceDir {};", format_string_literal(&s.to_string())));
	}
	if let Some(inner_classes) = &class.inner_classes {
		lines.push(format!("InnerClasses {};", format_inner_classes(inner_classes)));
	}
	if let Some(em) = &class.enclosing_method {
		lines.push(format!("EnclosingMethod {}", format_enclosing_method(em)?));
	}
	if let Some(c) = &class.nest_host_class {
		lines.push(format!("NestHost {};", format_class_name(c)));
	}
	if let Some(members) = &class.nest_members {
		lines.push(format!("NestMembers {};", format_class_name_brace_list(members)));
	}
	if class.has_deprecated_attribute {
		lines.push("Deprecated;".to_string());
	}
	if class.has_synthetic_attribute {
		lines.push("Synthetic;".to_string());
	}
	if let Some(sig) = &class.signature {
		lines.push(format!("Signature {};", format_string_literal(&sig.to_string())));
	}
	if let Some(s) = format_annotation_list(&class.runtime_visible_annotations)? {
		lines.push(format!("RuntimeVisibleAnnotations {s};"));
	}
	if let Some(s) = format_annotation_list(&class.runtime_invisible_annotations)? {
		lines.push(format!("RuntimeInvisibleAnnotations {s};"));
	}
	if let Some(s) = format_type_annotation_list(&class.runtime_visible_type_annotations, format_type_annotation_class)? {
		lines.push(format!("RuntimeVisibleTypeAnnotations {s};"));
	}
	if let Some(s) = format_type_annotation_list(&class.runtime_invisible_type_annotations, format_type_annotation_class)? {
		lines.push(format!("RuntimeInvisibleTypeAnnotations {s};"));
	}
	if let Some(module) = &class.module {
		lines.push(format!("Module {};", format_module(module)));
	}
	if let Some(c) = &class.module_main_class {
		lines.push(format!("ModuleMainClass {};", format_class_name(c)));
	}
	if let Some(packages) = &class.module_packages {
		let mut s = String::from("{");
		for p in packages {
			s.push(' ');
			s.push_str(&p.to_string());
			s.push(';');
		}
		s.push_str(" }");
		lines.push(format!("ModulePackages {s};"));
	}
	print_block(out, lines);
	Ok(())
}

pub(crate) fn print_field_attributes(out: &mut Out, field: &Field) -> Result<(), PrintError> {
	let mut lines = Vec::new();
	if field.has_deprecated_attribute {
		lines.push("Deprecated;".to_string());
	}
	if field.has_synthetic_attribute {
		lines.push("Synthetic;".to_string());
	}
	if let Some(sig) = &field.signature {
		lines.push(format!("Signature {};", format_string_literal(&sig.to_string())));
	}
	if let Some(s) = format_annotation_list(&field.runtime_visible_annotations)? {
		lines.push(format!("RuntimeVisibleAnnotations {s};"));
	}
	if let Some(s) = format_annotation_list(&field.runtime_invisible_annotations)? {
		lines.push(format!("RuntimeInvisibleAnnotations {s};"));
	}
	if let Some(s) = format_type_annotation_list(&field.runtime_visible_type_annotations, format_type_annotation_field)? {
		lines.push(format!("RuntimeVisibleTypeAnnotations {s};"));
	}
	if let Some(s) = format_type_annotation_list(&field.runtime_invisible_type_annotations, format_type_annotation_field)? {
		lines.push(format!("RuntimeInvisibleTypeAnnotations {s};"));
	}
	print_block(out, lines);
	Ok(())
}

pub(crate) fn print_method_attributes(out: &mut Out, method: &Method) -> Result<(), PrintError> {
	let mut lines = Vec::new();
	if method.has_deprecated_attribute {
		lines.push("Deprecated;".to_string());
	}
	if method.has_synthetic_attribute {
		lines.push("Synthetic;".to_string());
	}
	if let Some(sig) = &method.signature {
		lines.push(format!("Signature {};", format_string_literal(&sig.to_string())));
	}
	if let Some(v) = &method.annotation_default {
		lines.push(format!("AnnotationDefault {}", format_element_value(v)?));
	}
	if let Some(s) = format_annotation_list(&method.runtime_visible_annotations)? {
		lines.push(format!("RuntimeVisibleAnnotations {s};"));
	}
	if let Some(s) = format_annotation_list(&method.runtime_invisible_annotations)? {
		lines.push(format!("RuntimeInvisibleAnnotations {s};"));
	}
	if let Some(s) = format_parameter_annotations_list(&method.runtime_visible_parameter_annotations)? {
		lines.push(format!("RuntimeVisibleParameterAnnotations {s};"));
	}
	if let Some(s) = format_parameter_annotations_list(&method.runtime_invisible_parameter_annotations)? {
		lines.push(format!("RuntimeInvisibleParameterAnnotations {s};"));
	}
	if let Some(s) = format_type_annotation_list(&method.runtime_visible_type_annotations, format_type_annotation_method)? {
		lines.push(format!("RuntimeVisibleTypeAnnotations {s};"));
	}
	if let Some(s) = format_type_annotation_list(&method.runtime_invisible_type_annotations, format_type_annotation_method)? {
		lines.push(format!("RuntimeInvisibleTypeAnnotations {s};"));
	}
	print_block(out, lines);
	Ok(())
}
