//! Attribute-block dispatch (spec §4.5, §6): reads the keyword after a `[` and calls the
//! matching sub-parser, for however many attributes follow before the closing `]`.

use duke::tree::class::{ClassFile, ClassSignature, EnclosingMethod, InnerClass, InnerClassFlags};
use duke::tree::field::{Field, FieldSignature};
use duke::tree::method::code::Code;
use duke::tree::method::{Method, MethodSignature};
use duke::tree::module::{
	Module, ModuleExports, ModuleExportsFlags, ModuleFlags, ModuleName, ModuleOpens, ModuleOpensFlags,
	ModuleProvides, ModuleRequires, ModuleRequiresFlags, PackageName,
};
use crate::error::ParseError;
use crate::keywords::ATTRIBUTE_KEYWORDS;
use crate::parser::annotation::{
	parse_annotation, parse_element_value, parse_type_annotation_class, parse_type_annotation_code,
	parse_type_annotation_field, parse_type_annotation_method,
};
use crate::parser::instruction::LabelAllocator;
use crate::parser::{java_string, Parser};
use crate::token::Token;

/// Reads `[ (keyword ...)* ]`, dispatching each attribute to `handle`. `handle` returns `false`
/// for a keyword it doesn't recognise in its context, which is reported as a [`ParseError`].
fn parse_attribute_block(p: &mut Parser, mut handle: impl FnMut(&mut Parser, &str) -> Result<bool, ParseError>) -> Result<(), ParseError> {
	p.expect_punct('[')?;
	while !p.accept_punct(']')? {
		let line = p.line();
		let keyword = p.expect_keyword(ATTRIBUTE_KEYWORDS)?;
		if !handle(p, keyword)? {
			return Err(ParseError::new(line, format!("{keyword:?} is not valid in this context")));
		}
	}
	Ok(())
}

fn parse_inner_classes(p: &mut Parser) -> Result<Vec<InnerClass>, ParseError> {
	p.expect_punct('{')?;
	let mut entries = Vec::new();
	while !p.accept_punct('}')? {
		let inner_class = p.expect_class_name()?;
		let outer_class = if p.accept_word("outer")? { Some(p.expect_class_name()?) } else { None };
		let inner_name = if p.accept_word("as")? { Some(java_string(&p.expect_string()?)) } else { None };
		let raw = p.expect_access_flags()?;
		p.expect_punct(';')?;
		entries.push(InnerClass {
			inner_class,
			outer_class,
			inner_name,
			flags: InnerClassFlags {
				is_public: raw.public,
				is_private: raw.private,
				is_protected: raw.protected,
				is_static: raw.static_,
				is_final: raw.final_,
				is_interface: raw.interface,
				is_abstract: raw.abstract_,
				is_synthetic: raw.synthetic,
				is_annotation: raw.abstract_annotation,
				is_enum: raw.enum_,
			},
		});
	}
	Ok(entries)
}

fn parse_enclosing_method(p: &mut Parser) -> Result<EnclosingMethod, ParseError> {
	let class = p.expect_class_name()?;
	let method = match p.next_raw()? {
		Token::Punct(';') => None,
		t => {
			p.push_back(t);
			let return_type = p.expect_return_type()?;
			let name = p.expect_method_name()?;
			let args = p.expect_type_list()?;
			let desc = duke::tree::descriptor::ParsedMethodDescriptor {
				parameter_descriptors: args,
				return_descriptor: return_type,
			}.write();
			p.expect_punct(';')?;
			Some(duke::tree::method::MethodNameAndDesc { name, desc })
		}
	};
	Ok(EnclosingMethod { class, method })
}

fn parse_class_name_brace_list(p: &mut Parser) -> Result<Vec<duke::tree::class::ClassName>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		out.push(p.expect_class_name()?);
		p.expect_punct(';')?;
	}
	Ok(out)
}

fn parse_module_name_brace_list(p: &mut Parser) -> Result<Vec<ModuleName>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		let name = p.expect_word()?;
		out.push(ModuleName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?);
		if p.accept_punct(',')? {
			continue;
		}
		p.expect_punct(';')?;
	}
	Ok(out)
}

fn parse_module(p: &mut Parser) -> Result<Module, ParseError> {
	p.expect_punct('{')?;
	let name = p.expect_word()?;
	let name = ModuleName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?;
	let raw = p.expect_access_flags()?;
	let flags = ModuleFlags { is_open: raw.open, is_synthetic: raw.synthetic, is_mandated: raw.mandated };
	let version = if p.accept_punct('=')? { Some(java_string(&p.expect_string()?)) } else { None };
	p.expect_punct(';')?;

	let mut module = Module { name, flags, version, requires: Vec::new(), exports: Vec::new(), opens: Vec::new(), uses: Vec::new(), provides: Vec::new() };

	while !p.accept_punct('}')? {
		if p.accept_word("requires")? {
			p.expect_punct('{')?;
			while !p.accept_punct('}')? {
				let name = p.expect_word()?;
				let name = ModuleName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?;
				let raw = p.expect_access_flags()?;
				let flags = ModuleRequiresFlags {
					is_transitive: raw.transitive,
					is_static_phase: raw.static_phase,
					is_synthetic: raw.synthetic,
					is_mandated: raw.mandated,
				};
				let version = if p.accept_punct('=')? { Some(java_string(&p.expect_string()?)) } else { None };
				p.expect_punct(';')?;
				module.requires.push(ModuleRequires { name, flags, version });
			}
		} else if p.accept_word("exports")? {
			p.expect_punct('{')?;
			while !p.accept_punct('}')? {
				let name = p.expect_word()?;
				let name = PackageName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?;
				let raw = p.expect_access_flags()?;
				let flags = ModuleExportsFlags { is_synthetic: raw.synthetic, is_mandated: raw.mandated };
				let exports_to = if p.accept_word("to")? { parse_module_name_brace_list(p)? } else { Vec::new() };
				p.expect_punct(';')?;
				module.exports.push(ModuleExports { name, flags, exports_to });
			}
		} else if p.accept_word("opens")? {
			p.expect_punct('{')?;
			while !p.accept_punct('}')? {
				let name = p.expect_word()?;
				let name = PackageName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?;
				let raw = p.expect_access_flags()?;
				let flags = ModuleOpensFlags { is_synthetic: raw.synthetic, is_mandated: raw.mandated };
				let opens_to = if p.accept_word("to")? { parse_module_name_brace_list(p)? } else { Vec::new() };
				p.expect_punct(';')?;
				module.opens.push(ModuleOpens { name, flags, opens_to });
			}
		} else if p.accept_word("uses")? {
			module.uses = parse_class_name_brace_list(p)?;
		} else if p.accept_word("provides")? {
			p.expect_punct('{')?;
			while !p.accept_punct('}')? {
				let name = p.expect_class_name()?;
				p.expect_word_exact("with")?;
				let provides_with = parse_class_name_brace_list(p)?;
				p.expect_punct(';')?;
				module.provides.push(ModuleProvides { name, provides_with });
			}
		} else {
			return Err(p.err("expected requires/exports/opens/uses/provides or '}'"));
		}
	}
	Ok(module)
}

pub(crate) fn parse_field_attributes(p: &mut Parser, field: &mut Field) -> Result<(), ParseError> {
	parse_attribute_block(p, |p, keyword| Ok(match keyword {
		"Deprecated" => { p.expect_punct(';')?; field.has_deprecated_attribute = true; }
		"Synthetic" => { p.expect_punct(';')?; field.has_synthetic_attribute = true; }
		"Signature" => {
			let s = p.expect_string()?;
			p.expect_punct(';')?;
			field.signature = Some(FieldSignature::new(java_string(&s)).map_err(|e| p.err(e.to_string()))?);
		}
		"RuntimeVisibleAnnotations" => field.runtime_visible_annotations = parse_annotation_list(p)?,
		"RuntimeInvisibleAnnotations" => field.runtime_invisible_annotations = parse_annotation_list(p)?,
		"RuntimeVisibleTypeAnnotations" => field.runtime_visible_type_annotations = parse_type_annotation_list(p, parse_type_annotation_field)?,
		"RuntimeInvisibleTypeAnnotations" => field.runtime_invisible_type_annotations = parse_type_annotation_list(p, parse_type_annotation_field)?,
		_ => return Ok(false),
	}).map(|()| true))
}

pub(crate) fn parse_method_attributes(p: &mut Parser, method: &mut Method) -> Result<(), ParseError> {
	parse_attribute_block(p, |p, keyword| Ok(match keyword {
		"Deprecated" => { p.expect_punct(';')?; method.has_deprecated_attribute = true; }
		"Synthetic" => { p.expect_punct(';')?; method.has_synthetic_attribute = true; }
		"Signature" => {
			let s = p.expect_string()?;
			p.expect_punct(';')?;
			method.signature = Some(MethodSignature::new(java_string(&s)).map_err(|e| p.err(e.to_string()))?);
		}
		"AnnotationDefault" => method.annotation_default = Some(parse_element_value(p)?),
		"RuntimeVisibleAnnotations" => method.runtime_visible_annotations = parse_annotation_list(p)?,
		"RuntimeInvisibleAnnotations" => method.runtime_invisible_annotations = parse_annotation_list(p)?,
		"RuntimeVisibleTypeAnnotations" => method.runtime_visible_type_annotations = parse_type_annotation_list(p, parse_type_annotation_method)?,
		"RuntimeInvisibleTypeAnnotations" => method.runtime_invisible_type_annotations = parse_type_annotation_list(p, parse_type_annotation_method)?,
		"RuntimeVisibleParameterAnnotations" => method.runtime_visible_parameter_annotations = parse_parameter_annotations(p)?,
		"RuntimeInvisibleParameterAnnotations" => method.runtime_invisible_parameter_annotations = parse_parameter_annotations(p)?,
		_ => return Ok(false),
	}).map(|()| true))
}

pub(crate) fn parse_class_attributes(p: &mut Parser, class: &mut ClassFile) -> Result<(), ParseError> {
	parse_attribute_block(p, |p, keyword| Ok(match keyword {
		"SourceFile" => { let s = p.expect_string()?; p.expect_punct(';')?; class.source_file = Some(java_string(&s)); }
		"SourceDir" => { let s = p.expect_string()?; p.expect_punct(';')?; class.source_debug_extension = Some(java_string(&s)); }
		"InnerClasses" => class.inner_classes = Some(parse_inner_classes(p)?),
		"EnclosingMethod" => class.enclosing_method = Some(parse_enclosing_method(p)?),
		"NestHost" => { class.nest_host_class = Some(p.expect_class_name()?); p.expect_punct(';')?; }
		"NestMembers" => class.nest_members = Some(parse_class_name_brace_list(p)?),
		"Deprecated" => { p.expect_punct(';')?; class.has_deprecated_attribute = true; }
		"Synthetic" => { p.expect_punct(';')?; class.has_synthetic_attribute = true; }
		"Signature" => {
			let s = p.expect_string()?;
			p.expect_punct(';')?;
			class.signature = Some(ClassSignature::new(java_string(&s)).map_err(|e| p.err(e.to_string()))?);
		}
		"RuntimeVisibleAnnotations" => class.runtime_visible_annotations = parse_annotation_list(p)?,
		"RuntimeInvisibleAnnotations" => class.runtime_invisible_annotations = parse_annotation_list(p)?,
		"RuntimeVisibleTypeAnnotations" => class.runtime_visible_type_annotations = parse_type_annotation_list(p, parse_type_annotation_class)?,
		"RuntimeInvisibleTypeAnnotations" => class.runtime_invisible_type_annotations = parse_type_annotation_list(p, parse_type_annotation_class)?,
		"Module" => class.module = Some(parse_module(p)?),
		"ModuleMainClass" => { class.module_main_class = Some(p.expect_class_name()?); p.expect_punct(';')?; }
		"ModulePackages" => {
			p.expect_punct('{')?;
			let mut packages = Vec::new();
			while !p.accept_punct('}')? {
				let name = p.expect_word()?;
				packages.push(PackageName::new(java_string(&name)).map_err(|e| p.err(e.to_string()))?);
				p.expect_punct(';')?;
			}
			class.module_packages = Some(packages);
		}
		_ => return Ok(false),
	}).map(|()| true))
}

/// Code-attribute blocks only ever carry type annotations and (round-tripped) stack map frames
/// in this grammar: line numbers and local variables are pseudo-instructions (§4.7), and
/// exception handlers are the `catch` pseudo-instruction.
pub(crate) fn parse_code_attributes(p: &mut Parser, code: &mut Code, alloc: &mut LabelAllocator) -> Result<(), ParseError> {
	p.expect_punct('[')?;
	while !p.accept_punct(']')? {
		let line = p.line();
		let keyword = p.expect_keyword(ATTRIBUTE_KEYWORDS)?;
		match keyword {
			"RuntimeVisibleTypeAnnotations" => {
				code.runtime_visible_type_annotations = parse_code_type_annotation_list(p, alloc, line)?;
			}
			"RuntimeInvisibleTypeAnnotations" => {
				code.runtime_invisible_type_annotations = parse_code_type_annotation_list(p, alloc, line)?;
			}
			other => return Err(ParseError::new(line, format!("{other:?} is not valid inside a method body"))),
		}
	}
	Ok(())
}

fn parse_annotation_list(p: &mut Parser) -> Result<Vec<duke::tree::annotation::Annotation>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		out.push(parse_annotation(p)?);
	}
	Ok(out)
}

fn parse_type_annotation_list<T>(p: &mut Parser, mut one: impl FnMut(&mut Parser) -> Result<duke::tree::type_annotation::TypeAnnotation<T>, ParseError>) -> Result<Vec<duke::tree::type_annotation::TypeAnnotation<T>>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		out.push(one(p)?);
	}
	Ok(out)
}

fn parse_code_type_annotation_list(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<Vec<duke::tree::type_annotation::TypeAnnotation<duke::tree::type_annotation::TargetInfoCode>>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		out.push(parse_type_annotation_code(p, alloc, line)?);
	}
	Ok(out)
}

/// Reads `{ annotationList* }`, one `annotationList` per formal parameter in declaration order,
/// matching the binary attribute's own dense, index-free layout (spec §4.6).
fn parse_parameter_annotations(p: &mut Parser) -> Result<Vec<Vec<duke::tree::annotation::Annotation>>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		out.push(parse_annotation_list(p)?);
	}
	Ok(out)
}
