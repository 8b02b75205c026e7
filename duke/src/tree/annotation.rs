use std::fmt::{Debug, Formatter};
use java_string::JavaString;
use crate::tree::descriptor::ReturnDescriptor;
use crate::tree::field::FieldDescriptor;

#[derive(Clone, PartialEq)]
pub struct Annotation {
	pub annotation_type: FieldDescriptor,
	pub element_value_pairs: Vec<ElementValuePair>,
}

impl Annotation {
	pub fn new(annotation_type: FieldDescriptor) -> Annotation {
		Annotation {
			annotation_type,
			element_value_pairs: Vec::new(),
		}
	}
}

impl Debug for Annotation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "@{:?}", self.annotation_type)?;
		f.debug_map()
			.entries(self.element_value_pairs.iter()
				.map(|pair| (&pair.name, &pair.value))
			)
			.finish()
	}
}

#[derive(Clone, PartialEq)]
pub struct ElementValuePair {
	pub name: JavaString,
	pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
	Object(Object),
	Enum {
		type_name: FieldDescriptor,
		const_name: JavaString /* name of the constant */,
	},
	Class(ReturnDescriptor),
	AnnotationInterface(Annotation),
	ArrayType(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
	Byte(i8),
	Char(u16),
	Double(f64),
	Float(f32),
	Integer(i32),
	Long(i64),
	Short(i16),
	Boolean(bool),
	String(JavaString),
}