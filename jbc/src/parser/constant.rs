//! Parses loadable constants, member references and method handles (spec §4.3, §6).
//!
//! Two forms are accepted: an explicit cast `(T) literal`, and an inferred form where the
//! literal's own shape picks the type. Numeric narrowing always truncates; `(boolean) n` clamps
//! to `0`/`1` rather than replicating the historical `INTEGER_FALSE`/`INTEGER_TRUE` mixup.

use duke::tree::class::ClassName;
use duke::tree::descriptor::{ParsedFieldDescriptor, ParsedMethodDescriptor, Type};
use duke::tree::field::{ConstantValue, FieldName, FieldRef};
use duke::tree::method::{MethodDescriptor, MethodRef};
use duke::tree::method::code::{ConstantDynamic, Handle, InvokeDynamic, Loadable};
use crate::error::ParseError;
use crate::keywords::REFERENCE_KIND_KEYWORDS;
use crate::parser::{java_string, Parser};
use crate::token::Token;

/// `class_name '#'` or a bare `'#'` meaning the class currently being parsed.
fn expect_owner(p: &mut Parser) -> Result<ClassName, ParseError> {
	if p.accept_punct('#')? {
		return p.current_class.clone().ok_or_else(|| p.err("'#' used outside of a class body"));
	}
	let class = p.expect_class_name()?;
	p.expect_punct('#')?;
	Ok(class)
}

pub(crate) fn parse_field_ref(p: &mut Parser) -> Result<FieldRef, ParseError> {
	let class = expect_owner(p)?;
	let ty = p.expect_type()?;
	let name = p.expect_word()?;
	Ok(FieldRef {
		class,
		name: FieldName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?,
		desc: ParsedFieldDescriptor(ty).write(),
	})
}

pub(crate) fn parse_method_ref(p: &mut Parser) -> Result<MethodRef, ParseError> {
	let class = expect_owner(p)?;
	let return_type = p.expect_return_type()?;
	let name = p.expect_method_name()?;
	let args = p.expect_type_list()?;
	Ok(MethodRef {
		class,
		name,
		desc: ParsedMethodDescriptor { parameter_descriptors: args, return_descriptor: return_type }.write(),
	})
}

/// Parses a method handle literal: a reference-kind keyword followed by a field or method
/// reference. `invokestatic`/`invokespecial` may be preceded by `interface` to mark the
/// referenced method as belonging to an interface.
pub(crate) fn parse_handle(p: &mut Parser) -> Result<Handle, ParseError> {
	let kind = p.expect_keyword(REFERENCE_KIND_KEYWORDS)?;
	Ok(match kind {
		"getfield" => Handle::GetField(parse_field_ref(p)?),
		"getstatic" => Handle::GetStatic(parse_field_ref(p)?),
		"putfield" => Handle::PutField(parse_field_ref(p)?),
		"putstatic" => Handle::PutStatic(parse_field_ref(p)?),
		"invokevirtual" => Handle::InvokeVirtual(parse_method_ref(p)?),
		"invokeinterface" => Handle::InvokeInterface(parse_method_ref(p)?),
		"newinvokespecial" => Handle::NewInvokeSpecial(parse_method_ref(p)?),
		"invokestatic" => {
			let is_interface = p.accept_word("interface")?;
			Handle::InvokeStatic(parse_method_ref(p)?, is_interface)
		}
		"invokespecial" => {
			let is_interface = p.accept_word("interface")?;
			Handle::InvokeSpecial(parse_method_ref(p)?, is_interface)
		}
		_ => unreachable!("REFERENCE_KIND_KEYWORDS exhausted"),
	})
}

fn parse_loadable_arguments(p: &mut Parser) -> Result<Vec<Loadable>, ParseError> {
	p.expect_punct('{')?;
	let mut args = Vec::new();
	while !p.accept_punct('}')? {
		args.push(parse_loadable(p)?);
		p.expect_punct(';')?;
	}
	Ok(args)
}

/// `dynamic type identifier handleLiteral '{' (loadable ';')* '}'`
fn parse_constant_dynamic(p: &mut Parser) -> Result<ConstantDynamic, ParseError> {
	let ty = p.expect_type()?;
	let name = p.expect_word()?;
	let handle = parse_handle(p)?;
	let arguments = parse_loadable_arguments(p)?;
	Ok(ConstantDynamic {
		name: FieldName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?,
		descriptor: ParsedFieldDescriptor(ty).write(),
		handle,
		arguments,
	})
}

/// `returnType name '(' argTypes ')' handleLiteral '{' (loadable ';')* '}'`
pub(crate) fn parse_invoke_dynamic(p: &mut Parser) -> Result<InvokeDynamic, ParseError> {
	let return_type = p.expect_return_type()?;
	let name = p.expect_method_name()?;
	let args = p.expect_type_list()?;
	let handle = parse_handle(p)?;
	let arguments = parse_loadable_arguments(p)?;
	Ok(InvokeDynamic {
		name,
		descriptor: ParsedMethodDescriptor { parameter_descriptors: args, return_descriptor: return_type }.write(),
		handle,
		arguments,
	})
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

/// Parses a number token plus its optional trailing `d`/`f`/`l` suffix word into the matching
/// [`Loadable`] (defaulting to `Integer` when no suffix is present).
fn parse_inferred_number(p: &mut Parser, n: f64) -> Result<Loadable, ParseError> {
	Ok(match numeric_suffix(p)?.as_deref() {
		Some("d" | "D") => Loadable::Double(n),
		Some("f" | "F") => Loadable::Float(n as f32),
		Some("l" | "L") => Loadable::Long(n as i64),
		Some(_) => unreachable!(),
		None => Loadable::Integer(n as i32),
	})
}

/// Parses the inferred (uncast) form of a loadable constant.
fn parse_inferred(p: &mut Parser) -> Result<Loadable, ParseError> {
	match p.next_raw()? {
		Token::QuotedChar(c) => Ok(Loadable::Integer(c as i32)),
		Token::QuotedString(s) => Ok(Loadable::String(java_string(&s))),
		Token::Number(n) => parse_inferred_number(p, n),
		Token::Word(w) if w == "true" => Ok(Loadable::Integer(1)),
		Token::Word(w) if w == "false" => Ok(Loadable::Integer(0)),
		Token::Word(w) => {
			p.push_back(Token::Word(w));
			let ty = p.expect_type()?;
			Ok(Loadable::Class(type_to_class_name(p, ty)?))
		}
		t => Err(p.err(format!("expected a constant but got {}", t.describe()))),
	}
}

/// Turns a parsed [`Type`] into a [`ClassName`], for contexts (`Class` constants, `new`,
/// `anewarray`, `checkcast`, `instanceof`, ...) that store a class reference but accept any type
/// syntax, including arrays.
pub(crate) fn type_to_class_name(p: &mut Parser, ty: Type) -> Result<ClassName, ParseError> {
	match ty {
		Type::Object(c) => Ok(c),
		other => {
			// primitive or array type used as a `Class` constant: store its field descriptor
			// re-parsed as a class name is nonsensical for primitives, so build a synthetic
			// internal name instead (matches how the constant pool stores array `Class` entries
			// directly as their descriptor string).
			let descriptor = ParsedFieldDescriptor(other).write();
			ClassName::new(descriptor.into_inner()).map_err(|e| p.err(e.to_string()))
		}
	}
}

/// Parses a loadable constant, optionally wrapped in an explicit `(Type)` cast.
pub(crate) fn parse_loadable(p: &mut Parser) -> Result<Loadable, ParseError> {
	if p.accept_punct('(')? {
		let cast = p.expect_word()?;
		// `(MethodType)` spells its operand as a bare method descriptor-shape `(args)ret`, so it
		// doesn't close the leading '(' the way the other casts do.
		if cast == "MethodType" {
			p.push_back(Token::Punct('('));
			let args = p.expect_type_list()?;
			let ret = p.expect_return_type()?;
			let desc: MethodDescriptor = ParsedMethodDescriptor { parameter_descriptors: args, return_descriptor: ret }.write();
			return Ok(Loadable::MethodType(desc));
		}
		p.expect_punct(')')?;
		return Ok(match cast.as_str() {
			"boolean" => Loadable::Integer(expect_number_i64(p)?.clamp(0, 1) as i32),
			"byte" => Loadable::Integer(expect_number_i64(p)? as i8 as i32),
			"short" => Loadable::Integer(expect_number_i64(p)? as i16 as i32),
			"int" => Loadable::Integer(expect_number_i64(p)? as i32),
			"char" => Loadable::Integer(expect_char_or_number(p)? as i32),
			"long" => Loadable::Long(expect_number_i64(p)?),
			"float" => Loadable::Float(p.expect_number()? as f32),
			"double" => Loadable::Double(p.expect_number()?),
			"String" => Loadable::String(java_string(&p.expect_string()?)),
			"Class" => {
				let ty = p.expect_type()?;
				Loadable::Class(type_to_class_name(p, ty)?)
			}
			"MethodHandle" => Loadable::MethodHandle(parse_handle(p)?),
			"Dynamic" => Loadable::Dynamic(parse_constant_dynamic(p)?),
			other => return Err(p.err(format!("unknown constant cast {other:?}"))),
		});
	}
	parse_inferred(p)
}

fn expect_number_i64(p: &mut Parser) -> Result<i64, ParseError> {
	Ok(p.expect_number()? as i64)
}
fn expect_char_or_number(p: &mut Parser) -> Result<u16, ParseError> {
	match p.next_raw()? {
		Token::QuotedChar(c) => Ok(c as u16),
		Token::Number(n) => Ok(n as u16),
		t => Err(p.err(format!("expected a char or number but got {}", t.describe()))),
	}
}

/// Parses the value after `=` in a `fieldDecl`, which is restricted to the types
/// [`ConstantValue`] can hold.
pub(crate) fn parse_constant_value(p: &mut Parser) -> Result<ConstantValue, ParseError> {
	let line = p.line();
	Ok(match parse_loadable(p)? {
		Loadable::Integer(i) => ConstantValue::Integer(i),
		Loadable::Float(f) => ConstantValue::Float(f),
		Loadable::Long(l) => ConstantValue::Long(l),
		Loadable::Double(d) => ConstantValue::Double(d),
		Loadable::String(s) => ConstantValue::String(s),
		_ => return Err(ParseError::new(line, "a field constant value must be a primitive or String")),
	})
}
