//! Formats annotations, type annotations and element values (spec §4.6, §6); the mirror image
//! of `parser::annotation`.

use duke::tree::annotation::{Annotation, ElementValue, Object};
use duke::tree::type_annotation::{
	TargetInfoClass, TargetInfoCode, TargetInfoField, TargetInfoMethod, TypeAnnotation, TypePath, TypePathKind,
};
use crate::error::PrintError;
use crate::printer::labels::Labels;
use super::{format_return_type, format_string_literal, format_type};

pub(crate) fn format_annotation(a: &Annotation) -> Result<String, PrintError> {
	let ty = a.annotation_type.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?.0;
	let mut s = format!("{} {{", format_type(&ty));
	for pair in &a.element_value_pairs {
		s.push(' ');
		s.push_str(&pair.name.to_string());
		s.push_str(" = ");
		s.push_str(&format_element_value(&pair.value)?);
	}
	s.push_str(" }");
	Ok(s)
}

fn format_object(o: &Object) -> String {
	match o {
		Object::Boolean(b) => format!("(boolean) {}", if *b { 1 } else { 0 }),
		Object::Byte(b) => format!("(byte) {b}"),
		Object::Short(s) => format!("(short) {s}"),
		Object::Char(c) => format!("(char) {c}"),
		Object::Integer(i) => format!("{i}"),
		Object::Long(l) => format!("(long) {l}"),
		Object::Float(f) => format!("(float) {f}"),
		Object::Double(d) => format!("(double) {d}"),
		Object::String(s) => format!("(String) {}", format_string_literal(&s.to_string())),
	}
}

/// Each variant already includes its own terminator, matching the self-delimiting shape
/// `parser::annotation::parse_element_value` expects: a trailing `;` for primitive/string/
/// enum/class values, nothing extra for annotation/array values, which close on their own `}`.
pub(crate) fn format_element_value(v: &ElementValue) -> Result<String, PrintError> {
	Ok(match v {
		ElementValue::Object(o) => format!("{};", format_object(o)),
		ElementValue::Enum { type_name, const_name } => {
			let ty = type_name.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?.0;
			format!("{}#{};", format_type(&ty), const_name)
		}
		ElementValue::Class(rd) => {
			let ty = rd.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?.0;
			format!("{};", format_return_type(&ty))
		}
		ElementValue::AnnotationInterface(a) => format!("@{}", format_annotation(a)?),
		ElementValue::ArrayType(values) => {
			let mut s = String::from("{");
			for value in values {
				s.push(' ');
				s.push_str(&format_element_value(value)?);
			}
			s.push_str(" }");
			s
		}
	})
}

fn format_type_path(path: &TypePath) -> String {
	let mut s = String::from("{");
	for kind in &path.path {
		s.push(' ');
		s.push_str(&match kind {
			TypePathKind::ArrayDeeper => "array;".to_string(),
			TypePathKind::NestedDeeper => "inner_type;".to_string(),
			TypePathKind::WildcardBound => "wildcard;".to_string(),
			TypePathKind::TypeArgument { index } => format!("type_argument {index};"),
		});
	}
	s.push_str(" }");
	s
}

fn format_target_info_class(t: &TargetInfoClass) -> String {
	match t {
		TargetInfoClass::ClassTypeParameter { index } => format!("parameter_generic_class {index}"),
		TargetInfoClass::Extends => "extends".to_string(),
		TargetInfoClass::Implements { index } => format!("extends {index}"),
		TargetInfoClass::ClassTypeParameterBound { type_parameter_index, bound_index } => {
			format!("bound_generic_class {type_parameter_index} {bound_index}")
		}
	}
}

fn format_target_info_field(t: &TargetInfoField) -> String {
	match t {
		TargetInfoField::Field => "field".to_string(),
	}
}

fn format_target_info_method(t: &TargetInfoMethod) -> String {
	match t {
		TargetInfoMethod::MethodTypeParameter { index } => format!("parameter_generic_method {index}"),
		TargetInfoMethod::MethodTypeParameterBound { type_parameter_index, bound_index } => {
			format!("bound_generic_method {type_parameter_index} {bound_index}")
		}
		TargetInfoMethod::Return => "return".to_string(),
		TargetInfoMethod::Receiver => "receiver".to_string(),
		TargetInfoMethod::FormalParameter { index } => format!("parameter {index}"),
		TargetInfoMethod::Throws { index } => format!("throws {index}"),
	}
}

fn format_lv_table(table: &[(duke::tree::method::code::LabelRange, duke::tree::method::code::LvIndex)], labels: &Labels) -> Result<String, PrintError> {
	let mut s = String::from("{");
	for (range, index) in table {
		s.push(' ');
		s.push_str(&labels.name(range.start)?);
		s.push(' ');
		s.push_str(&labels.name(range.end)?);
		s.push(' ');
		s.push_str(&format!("{}", index.index));
		s.push(';');
	}
	s.push_str(" }");
	Ok(s)
}

fn format_target_info_code(t: &TargetInfoCode, labels: &Labels) -> Result<String, PrintError> {
	Ok(match t {
		TargetInfoCode::LocalVariable { table } => format!("local_variable {}", format_lv_table(table, labels)?),
		TargetInfoCode::ResourceVariable { table } => format!("resource_variable {}", format_lv_table(table, labels)?),
		TargetInfoCode::ExceptionParameter { index } => format!("catch {index}"),
		TargetInfoCode::InstanceOf(label) => format!("instance_of {}", labels.name(*label)?),
		TargetInfoCode::New(label) => format!("new {}", labels.name(*label)?),
		TargetInfoCode::ConstructorReference(label) => format!("method_reference_new {}", labels.name(*label)?),
		TargetInfoCode::MethodReference(label) => format!("method_reference {}", labels.name(*label)?),
		TargetInfoCode::Cast { label, index } => format!("cast {} {index}", labels.name(*label)?),
		TargetInfoCode::ConstructorInvocationTypeArgument { label, index } => {
			format!("argument_generic_method_new {} {index}", labels.name(*label)?)
		}
		TargetInfoCode::MethodInvocationTypeArgument { label, index } => {
			format!("argument_generic_method {} {index}", labels.name(*label)?)
		}
		TargetInfoCode::ConstructorReferenceTypeArgument { label, index } => {
			format!("argument_generic_method_reference_new {} {index}", labels.name(*label)?)
		}
		TargetInfoCode::MethodReferenceTypeArgument { label, index } => {
			format!("argument_generic_method_reference {} {index}", labels.name(*label)?)
		}
	})
}

pub(crate) fn format_type_annotation_class(ta: &TypeAnnotation<TargetInfoClass>) -> Result<String, PrintError> {
	Ok(format!("{} {} {}", format_annotation(&ta.annotation)?, format_target_info_class(&ta.type_reference), format_type_path(&ta.type_path)))
}

pub(crate) fn format_type_annotation_field(ta: &TypeAnnotation<TargetInfoField>) -> Result<String, PrintError> {
	Ok(format!("{} {} {}", format_annotation(&ta.annotation)?, format_target_info_field(&ta.type_reference), format_type_path(&ta.type_path)))
}

pub(crate) fn format_type_annotation_method(ta: &TypeAnnotation<TargetInfoMethod>) -> Result<String, PrintError> {
	Ok(format!("{} {} {}", format_annotation(&ta.annotation)?, format_target_info_method(&ta.type_reference), format_type_path(&ta.type_path)))
}

pub(crate) fn format_type_annotation_code(ta: &TypeAnnotation<TargetInfoCode>, labels: &Labels) -> Result<String, PrintError> {
	Ok(format!("{} {} {}", format_annotation(&ta.annotation)?, format_target_info_code(&ta.type_reference, labels)?, format_type_path(&ta.type_path)))
}
