//! Parses annotations, type annotations and element values (spec §4.6, §6).

use duke::tree::annotation::{Annotation, ElementValue, ElementValuePair, Object};
use duke::tree::descriptor::{ParsedFieldDescriptor, ParsedReturnDescriptor};
use duke::tree::method::code::{Label, LabelRange, LvIndex};
use duke::tree::type_annotation::{
	TargetInfoClass, TargetInfoCode, TargetInfoField, TargetInfoMethod, TypeAnnotation, TypePath, TypePathKind,
};
use crate::error::ParseError;
use crate::keywords::TYPE_PATH_KEYWORDS;
use crate::parser::instruction::LabelAllocator;
use crate::parser::{java_string, Parser};
use crate::token::Token;

/// `type '{' (ident '=' elementValue)* '}'`
pub(crate) fn parse_annotation(p: &mut Parser) -> Result<Annotation, ParseError> {
	let ty = p.expect_type()?;
	let mut annotation = Annotation::new(ParsedFieldDescriptor(ty).write());
	p.expect_punct('{')?;
	while !p.accept_punct('}')? {
		let name = p.expect_word()?;
		p.expect_punct('=')?;
		let value = parse_element_value(p)?;
		annotation.element_value_pairs.push(ElementValuePair { name: java_string(&name), value });
	}
	Ok(annotation)
}

fn numeric_suffix(p: &mut Parser) -> Result<Option<String>, ParseError> {
	match p.next_raw()? {
		Token::Word(w) if matches!(w.as_str(), "d" | "D" | "f" | "F" | "l" | "L") => Ok(Some(w)),
		t => {
			p.push_back(t);
			Ok(None)
		}
	}
}

fn parse_explicit_object(p: &mut Parser, cast: &str) -> Result<Object, ParseError> {
	Ok(match cast {
		"boolean" => Object::Boolean(p.expect_number()? != 0.0),
		"byte" => Object::Byte(p.expect_number()? as i64 as i8),
		"short" => Object::Short(p.expect_number()? as i64 as i16),
		"char" => Object::Char(match p.next_raw()? {
			Token::QuotedChar(c) => c as u16,
			Token::Number(n) => n as u16,
			t => return Err(p.err(format!("expected a char or number but got {}", t.describe()))),
		}),
		"int" => Object::Integer(p.expect_number()? as i64 as i32),
		"long" => Object::Long(p.expect_number()? as i64),
		"float" => Object::Float(p.expect_number()? as f32),
		"double" => Object::Double(p.expect_number()?),
		"String" => Object::String(java_string(&p.expect_string()?)),
		other => return Err(p.err(format!("unknown element value cast {other:?}"))),
	})
}

/// Parses a single element value. Primitive/string/enum/class values consume their own trailing
/// `;`; annotation and array values don't, since they already end in `}`.
pub(crate) fn parse_element_value(p: &mut Parser) -> Result<ElementValue, ParseError> {
	match p.next_raw()? {
		Token::Punct('@') => Ok(ElementValue::AnnotationInterface(parse_annotation(p)?)),
		Token::Punct('{') => {
			let mut values = Vec::new();
			while !p.accept_punct('}')? {
				values.push(parse_element_value(p)?);
			}
			Ok(ElementValue::ArrayType(values))
		}
		Token::Punct('(') => {
			let cast = p.expect_word()?;
			p.expect_punct(')')?;
			let value = parse_explicit_object(p, &cast)?;
			p.expect_punct(';')?;
			Ok(ElementValue::Object(value))
		}
		Token::QuotedChar(c) => {
			p.expect_punct(';')?;
			Ok(ElementValue::Object(Object::Char(c as u16)))
		}
		Token::QuotedString(s) => {
			p.expect_punct(';')?;
			Ok(ElementValue::Object(Object::String(java_string(&s))))
		}
		Token::Number(n) => {
			let value = match numeric_suffix(p)?.as_deref() {
				Some("d" | "D") => Object::Double(n),
				Some("f" | "F") => Object::Float(n as f32),
				Some("l" | "L") => Object::Long(n as i64),
				Some(_) => unreachable!(),
				None => Object::Integer(n as i32),
			};
			p.expect_punct(';')?;
			Ok(ElementValue::Object(value))
		}
		Token::Word(w) if w == "true" => {
			p.expect_punct(';')?;
			Ok(ElementValue::Object(Object::Boolean(true)))
		}
		Token::Word(w) if w == "false" => {
			p.expect_punct(';')?;
			Ok(ElementValue::Object(Object::Boolean(false)))
		}
		Token::Word(w) => {
			p.push_back(Token::Word(w));
			let ty = p.expect_type()?;
			if p.accept_punct('#')? {
				let const_name = p.expect_word()?;
				p.expect_punct(';')?;
				Ok(ElementValue::Enum {
					type_name: ParsedFieldDescriptor(ty).write(),
					const_name: java_string(&const_name),
				})
			} else {
				p.expect_punct(';')?;
				Ok(ElementValue::Class(ParsedReturnDescriptor(Some(ty)).write()))
			}
		}
		t => Err(p.err(format!("expected an element value but got {}", t.describe()))),
	}
}

/// `(array | inner_type | wildcard | type_argument [number]) ';'`, repeated inside the
/// `{ ... }` following a type annotation's target info.
fn parse_type_path(p: &mut Parser) -> Result<TypePath, ParseError> {
	p.expect_punct('{')?;
	let mut path = Vec::new();
	while !p.accept_punct('}')? {
		let kind = p.expect_keyword(TYPE_PATH_KEYWORDS)?;
		let kind = match kind {
			"array" => TypePathKind::ArrayDeeper,
			"inner_type" => TypePathKind::NestedDeeper,
			"wildcard" => TypePathKind::WildcardBound,
			"type_argument" => {
				let index = match p.next_raw()? {
					Token::Number(n) => n as u8,
					t => {
						p.push_back(t);
						0
					}
				};
				TypePathKind::TypeArgument { index }
			}
			_ => unreachable!("TYPE_PATH_KEYWORDS exhausted"),
		};
		p.expect_punct(';')?;
		path.push(kind);
	}
	Ok(TypePath { path })
}

fn expect_u8(p: &mut Parser) -> Result<u8, ParseError> {
	Ok(p.expect_number()? as i64 as u8)
}
fn expect_u16(p: &mut Parser) -> Result<u16, ParseError> {
	Ok(p.expect_number()? as i64 as u16)
}

fn parse_target_info_class(p: &mut Parser, keyword: &str) -> Result<TargetInfoClass, ParseError> {
	Ok(match keyword {
		"parameter_generic_class" => TargetInfoClass::ClassTypeParameter { index: expect_u8(p)? },
		"extends" => match p.next_raw()? {
			Token::Number(n) => TargetInfoClass::Implements { index: n as i64 as u16 },
			t => {
				p.push_back(t);
				TargetInfoClass::Extends
			}
		},
		"bound_generic_class" => TargetInfoClass::ClassTypeParameterBound {
			type_parameter_index: expect_u8(p)?,
			bound_index: expect_u8(p)?,
		},
		other => return Err(p.err(format!("{other:?} is not a valid target info for a class type annotation"))),
	})
}

fn parse_target_info_field(p: &mut Parser, keyword: &str) -> Result<TargetInfoField, ParseError> {
	match keyword {
		"field" => Ok(TargetInfoField::Field),
		other => Err(p.err(format!("{other:?} is not a valid target info for a field type annotation"))),
	}
}

fn parse_target_info_method(p: &mut Parser, keyword: &str) -> Result<TargetInfoMethod, ParseError> {
	Ok(match keyword {
		"parameter_generic_method" => TargetInfoMethod::MethodTypeParameter { index: expect_u8(p)? },
		"bound_generic_method" => TargetInfoMethod::MethodTypeParameterBound {
			type_parameter_index: expect_u8(p)?,
			bound_index: expect_u8(p)?,
		},
		"return" => TargetInfoMethod::Return,
		"receiver" => TargetInfoMethod::Receiver,
		"parameter" => TargetInfoMethod::FormalParameter { index: expect_u8(p)? },
		"throws" => TargetInfoMethod::Throws { index: expect_u16(p)? },
		other => return Err(p.err(format!("{other:?} is not a valid target info for a method type annotation"))),
	})
}

fn label_ref(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<Label, ParseError> {
	let name = p.expect_word()?;
	alloc.reference(line, &name)
}

/// `'{' (fromLabel toLabel index ';')* '}'`, shared by `local_variable`/`resource_variable`.
fn parse_lv_table(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<Vec<(LabelRange, LvIndex)>, ParseError> {
	p.expect_punct('{')?;
	let mut table = Vec::new();
	while !p.accept_punct('}')? {
		let start = label_ref(p, alloc, line)?;
		let end = label_ref(p, alloc, line)?;
		let index = LvIndex { index: expect_u16(p)? };
		p.expect_punct(';')?;
		table.push((LabelRange { start, end }, index));
	}
	Ok(table)
}

fn parse_target_info_code(p: &mut Parser, alloc: &mut LabelAllocator, line: usize, keyword: &str) -> Result<TargetInfoCode, ParseError> {
	Ok(match keyword {
		"local_variable" => TargetInfoCode::LocalVariable { table: parse_lv_table(p, alloc, line)? },
		"resource_variable" => TargetInfoCode::ResourceVariable { table: parse_lv_table(p, alloc, line)? },
		"catch" => TargetInfoCode::ExceptionParameter { index: expect_u16(p)? },
		"instance_of" => TargetInfoCode::InstanceOf(label_ref(p, alloc, line)?),
		"new" => TargetInfoCode::New(label_ref(p, alloc, line)?),
		"method_reference_new" => TargetInfoCode::ConstructorReference(label_ref(p, alloc, line)?),
		"method_reference" => TargetInfoCode::MethodReference(label_ref(p, alloc, line)?),
		"cast" => TargetInfoCode::Cast { label: label_ref(p, alloc, line)?, index: expect_u8(p)? },
		"argument_generic_method_new" => TargetInfoCode::ConstructorInvocationTypeArgument {
			label: label_ref(p, alloc, line)?, index: expect_u8(p)?,
		},
		"argument_generic_method" => TargetInfoCode::MethodInvocationTypeArgument {
			label: label_ref(p, alloc, line)?, index: expect_u8(p)?,
		},
		"argument_generic_method_reference_new" => TargetInfoCode::ConstructorReferenceTypeArgument {
			label: label_ref(p, alloc, line)?, index: expect_u8(p)?,
		},
		"argument_generic_method_reference" => TargetInfoCode::MethodReferenceTypeArgument {
			label: label_ref(p, alloc, line)?, index: expect_u8(p)?,
		},
		other => return Err(p.err(format!("{other:?} is not a valid target info inside a method body"))),
	})
}

pub(crate) fn parse_type_annotation_class(p: &mut Parser) -> Result<TypeAnnotation<TargetInfoClass>, ParseError> {
	let annotation = parse_annotation(p)?;
	let keyword = p.expect_word()?;
	let target = parse_target_info_class(p, &keyword)?;
	let path = parse_type_path(p)?;
	Ok(TypeAnnotation::new(target, path, annotation))
}

pub(crate) fn parse_type_annotation_field(p: &mut Parser) -> Result<TypeAnnotation<TargetInfoField>, ParseError> {
	let annotation = parse_annotation(p)?;
	let keyword = p.expect_word()?;
	let target = parse_target_info_field(p, &keyword)?;
	let path = parse_type_path(p)?;
	Ok(TypeAnnotation::new(target, path, annotation))
}

pub(crate) fn parse_type_annotation_method(p: &mut Parser) -> Result<TypeAnnotation<TargetInfoMethod>, ParseError> {
	let annotation = parse_annotation(p)?;
	let keyword = p.expect_word()?;
	let target = parse_target_info_method(p, &keyword)?;
	let path = parse_type_path(p)?;
	Ok(TypeAnnotation::new(target, path, annotation))
}

pub(crate) fn parse_type_annotation_code(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<TypeAnnotation<TargetInfoCode>, ParseError> {
	let annotation = parse_annotation(p)?;
	let keyword = p.expect_word()?;
	let target = parse_target_info_code(p, alloc, line, &keyword)?;
	let path = parse_type_path(p)?;
	Ok(TypeAnnotation::new(target, path, annotation))
}
