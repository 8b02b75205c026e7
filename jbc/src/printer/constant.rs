//! Formats loadable constants, member references and method handles (spec §4.3, §6); the
//! mirror image of `parser::constant`.

use duke::tree::class::ClassName;
use duke::tree::descriptor::Type;
use duke::tree::field::{ConstantValue, FieldRef};
use duke::tree::method::MethodRef;
use duke::tree::method::code::{ConstantDynamic, Handle, InvokeDynamic, Loadable};
use crate::error::PrintError;
use super::{format_char_literal, format_class_name, format_return_type, format_string_literal, format_type};

pub(crate) fn format_field_ref(f: &FieldRef) -> Result<String, PrintError> {
	let ty = f.desc.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?.0;
	Ok(format!("{}#{} {}", format_class_name(&f.class), format_type(&ty), f.name))
}

pub(crate) fn format_method_ref(m: &MethodRef) -> Result<String, PrintError> {
	let parsed = m.desc.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?;
	let args = parsed.parameter_descriptors.iter().map(format_type).collect::<Vec<_>>().join(", ");
	Ok(format!("{}#{} {}({})", format_class_name(&m.class), format_return_type(&parsed.return_descriptor), m.name, args))
}

pub(crate) fn format_handle(h: &Handle) -> Result<String, PrintError> {
	Ok(match h {
		Handle::GetField(f) => format!("getfield {}", format_field_ref(f)?),
		Handle::GetStatic(f) => format!("getstatic {}", format_field_ref(f)?),
		Handle::PutField(f) => format!("putfield {}", format_field_ref(f)?),
		Handle::PutStatic(f) => format!("putstatic {}", format_field_ref(f)?),
		Handle::InvokeVirtual(m) => format!("invokevirtual {}", format_method_ref(m)?),
		Handle::InvokeInterface(m) => format!("invokeinterface {}", format_method_ref(m)?),
		Handle::NewInvokeSpecial(m) => format!("newinvokespecial {}", format_method_ref(m)?),
		Handle::InvokeStatic(m, is_interface) => {
			format!("invokestatic {}{}", if *is_interface { "interface " } else { "" }, format_method_ref(m)?)
		}
		Handle::InvokeSpecial(m, is_interface) => {
			format!("invokespecial {}{}", if *is_interface { "interface " } else { "" }, format_method_ref(m)?)
		}
	})
}

fn format_loadable_arguments(args: &[Loadable]) -> Result<String, PrintError> {
	let mut s = String::from("{");
	for arg in args {
		s.push(' ');
		s.push_str(&format_loadable(arg)?);
		s.push(';');
	}
	s.push_str(" }");
	Ok(s)
}

fn format_constant_dynamic(cd: &ConstantDynamic) -> Result<String, PrintError> {
	let ty = cd.descriptor.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?.0;
	Ok(format!("{} {} {} {}", format_type(&ty), cd.name, format_handle(&cd.handle)?, format_loadable_arguments(&cd.arguments)?))
}

pub(crate) fn format_invoke_dynamic(id: &InvokeDynamic) -> Result<String, PrintError> {
	let parsed = id.descriptor.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?;
	let args = parsed.parameter_descriptors.iter().map(format_type).collect::<Vec<_>>().join(", ");
	Ok(format!(
		"{} {}({}) {} {}",
		format_return_type(&parsed.return_descriptor), id.name, args,
		format_handle(&id.handle)?, format_loadable_arguments(&id.arguments)?,
	))
}

/// Writes a loadable constant with an explicit `(Type)` cast, except for `String`/`Class`
/// constants and the numeric default (`int`), which the grammar can infer without one.
pub(crate) fn format_loadable(l: &Loadable) -> Result<String, PrintError> {
	Ok(match l {
		Loadable::Integer(i) => format!("{i}"),
		Loadable::Float(f) => format!("(float) {f}"),
		Loadable::Long(l) => format!("(long) {l}"),
		Loadable::Double(d) => format!("(double) {d}"),
		Loadable::String(s) => format_string_literal(&s.to_string()),
		Loadable::Class(c) => format!("(Class) {}", format_class_name_as_type(c)),
		Loadable::MethodHandle(h) => format!("(MethodHandle) {}", format_handle(h)?),
		Loadable::MethodType(desc) => {
			let parsed = desc.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?;
			let args = parsed.parameter_descriptors.iter().map(format_type).collect::<Vec<_>>().join(", ");
			format!("(MethodType) ({}){}", args, format_return_type(&parsed.return_descriptor))
		}
		Loadable::Dynamic(cd) => format!("(Dynamic) {}", format_constant_dynamic(cd)?),
	})
}

/// [`Loadable::Class`] stores array `Class` constants as a raw field-descriptor-shaped
/// [`ClassName`] (see `parser::constant::type_to_class_name`); re-parse it as a field
/// descriptor so arrays print as `int[]` rather than their internal `[I` spelling.
pub(crate) fn format_class_name_as_type(c: &ClassName) -> String {
	let inner = c.as_inner();
	if inner.starts_with('[') {
		let desc = unsafe { duke::tree::field::FieldDescriptorSlice::from_inner_unchecked(inner) };
		match desc.parse() {
			Ok(parsed) => format_type(&parsed.0),
			Err(_) => format_class_name(c),
		}
	} else {
		format_class_name(c)
	}
}

/// `ty` is the owning field's declared type: a `boolean`/`char`-typed constant is stored as a
/// plain [`ConstantValue::Integer`] (the JVM constant pool has no dedicated boolean/char form),
/// so printing it back as a bare number would lose that distinction on the next parse. Mirrors
/// `parser::constant::parse_constant_value`'s acceptance of `true`/`false`/a char literal through
/// the same `Loadable::Integer` path.
pub(crate) fn format_constant_value(v: &ConstantValue, ty: Option<&Type>) -> String {
	match v {
		ConstantValue::Integer(i) => match ty {
			Some(Type::Z) => (*i != 0).to_string(),
			Some(Type::C) => format_char_literal(char::from_u32(*i as u32).unwrap_or('\0')),
			_ => format!("{i}"),
		},
		ConstantValue::Float(f) => format!("(float) {f}"),
		ConstantValue::Long(l) => format!("(long) {l}"),
		ConstantValue::Double(d) => format!("(double) {d}"),
		ConstantValue::String(s) => format_string_literal(&s.to_string()),
	}
}
