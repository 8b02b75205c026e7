use std::fmt::{Display, Formatter};
use java_string::{JavaStr, JavaString};
use crate::macros::make_string_str_like;
use crate::tree::annotation::Annotation;
use crate::tree::attribute::Attribute;
use crate::tree::field::{FieldDescriptor, FieldSignature};
use crate::tree::type_annotation::{TargetInfoField, TypeAnnotation};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponent {
	pub name: RecordName,
	pub descriptor: FieldDescriptor,

	pub signature: Option<FieldSignature>,

	pub runtime_visible_annotations: Vec<Annotation>,
	pub runtime_invisible_annotations: Vec<Annotation>,
	pub runtime_visible_type_annotations: Vec<TypeAnnotation<TargetInfoField>>,
	pub runtime_invisible_type_annotations: Vec<TypeAnnotation<TargetInfoField>>,

	pub attributes: Vec<Attribute>,
}

impl RecordComponent {
	pub fn new(name: RecordName, descriptor: FieldDescriptor) -> RecordComponent {
		RecordComponent {
			name,
			descriptor,

			signature: None,

			runtime_visible_annotations: Vec::new(),
			runtime_invisible_annotations: Vec::new(),
			runtime_visible_type_annotations: Vec::new(),
			runtime_invisible_type_annotations: Vec::new(),

			attributes: Vec::new(),
		}
	}

}

make_string_str_like!(
	pub RecordName(JavaString);
	pub RecordNameSlice(JavaStr);
	is_valid(s) = {
		if crate::tree::names::is_valid_unqualified_name(s) {
			Ok(())
		} else {
			anyhow::bail!("invalid record component name: must be non-empty and not contain any of `.`, `;`, `[` and `/`")
		}
	};
);

impl Display for RecordName {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self.as_slice(), f)
	}
}
impl Display for RecordNameSlice {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_inner())
	}
}

