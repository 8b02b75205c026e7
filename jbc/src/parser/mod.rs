mod constant;
mod annotation;
mod attribute;
mod instruction;

use std::collections::HashMap;
use java_string::JavaString;
use duke::tree::class::{ClassAccess, ClassFile, ClassName};
use duke::tree::descriptor::{ArrayType, Type};
use duke::tree::field::{Field, FieldAccess, FieldDescriptor, FieldName};
use duke::tree::method::{Method, MethodAccess, MethodDescriptor, MethodName, MethodParameter, ParameterFlags, ParameterName};
use duke::tree::version::Version;
use crate::error::ParseError;
use crate::keywords::{ClassKind, FLAG_WORDS, RawFlags};
use crate::token::{Token, TokenSource};

/// Turns `s` into a [`JavaString`] character by character, without relying on any `From<&str>`
/// impl on the wrapper crate's side.
pub(crate) fn java_string(s: &str) -> JavaString {
	let mut out = JavaString::new();
	for c in s.chars() {
		out.push(c);
	}
	out
}

/// Parses a complete JBC source file into a [`ClassFile`].
pub fn parse_class(source: &str) -> Result<ClassFile, ParseError> {
	let mut p = Parser::new(source);
	p.parse_class_file()
}

pub(crate) struct Parser {
	pub(crate) tokens: TokenSource,
	imports: HashMap<String, String>,
	pub(crate) current_class: Option<ClassName>,
}

impl Parser {
	fn new(source: &str) -> Parser {
		Parser {
			tokens: TokenSource::new(source),
			imports: HashMap::new(),
			current_class: None,
		}
	}

	pub(crate) fn err(&self, message: impl Into<String>) -> ParseError {
		ParseError::new(self.tokens.line(), message)
	}
	fn err_at(&self, line: usize, message: impl Into<String>) -> ParseError {
		ParseError::new(line, message)
	}

	fn next(&mut self) -> Result<Token, ParseError> {
		self.tokens.next()
	}
	/// Like the private `next`, but usable from sibling parser submodules that need raw token
	/// dispatch (e.g. to distinguish a quoted char from a number).
	pub(crate) fn next_raw(&mut self) -> Result<Token, ParseError> {
		self.next()
	}
	pub(crate) fn push_back(&mut self, token: Token) {
		self.tokens.push_back(token)
	}
	pub(crate) fn line(&self) -> usize {
		self.tokens.line()
	}

	fn unexpected(&self, expected: &str, got: &Token) -> ParseError {
		self.err(format!("expected {expected} but got {}", got.describe()))
	}

	pub(crate) fn expect_word(&mut self) -> Result<String, ParseError> {
		match self.next()? {
			Token::Word(w) => Ok(w),
			t => Err(self.unexpected("a word", &t)),
		}
	}
	pub(crate) fn expect_number(&mut self) -> Result<f64, ParseError> {
		match self.next()? {
			Token::Number(n) => Ok(n),
			t => Err(self.unexpected("a number", &t)),
		}
	}
	pub(crate) fn expect_string(&mut self) -> Result<String, ParseError> {
		match self.next()? {
			Token::QuotedString(s) => Ok(s),
			t => Err(self.unexpected("a string", &t)),
		}
	}
	pub(crate) fn expect_char(&mut self) -> Result<char, ParseError> {
		match self.next()? {
			Token::QuotedChar(c) => Ok(c),
			t => Err(self.unexpected("a char", &t)),
		}
	}
	pub(crate) fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
		match self.next()? {
			Token::Punct(p) if p == c => Ok(()),
			t => Err(self.unexpected(&format!("'{c}'"), &t)),
		}
	}
	pub(crate) fn accept_punct(&mut self, c: char) -> Result<bool, ParseError> {
		match self.next()? {
			Token::Punct(p) if p == c => Ok(true),
			t => {
				self.push_back(t);
				Ok(false)
			}
		}
	}
	/// Accepts a word matching `word` exactly, pushing back on mismatch.
	pub(crate) fn accept_word(&mut self, word: &str) -> Result<bool, ParseError> {
		match self.next()? {
			Token::Word(w) if w == word => Ok(true),
			t => {
				self.push_back(t);
				Ok(false)
			}
		}
	}
	pub(crate) fn expect_word_exact(&mut self, word: &str) -> Result<(), ParseError> {
		if self.accept_word(word)? {
			Ok(())
		} else {
			Err(self.err(format!("expected {word:?}")))
		}
	}

	/// Consumes a word, failing if it's not one of `set`. Returns which one matched.
	pub(crate) fn expect_keyword<'a>(&mut self, set: &[&'a str]) -> Result<&'a str, ParseError> {
		let line = self.line();
		let word = self.expect_word()?;
		set.iter().find(|&&k| k == word).copied()
			.ok_or_else(|| self.err_at(line, format!("expected one of {set:?} but got {word:?}")))
	}

	// --- access flags ---

	pub(crate) fn expect_access_flags(&mut self) -> Result<RawFlags, ParseError> {
		let mut flags = RawFlags::default();
		loop {
			match self.next()? {
				Token::Word(w) if FLAG_WORDS.contains(&w.as_str()) => {
					flags.set(&w);
				}
				t => {
					self.push_back(t);
					break;
				}
			}
		}
		Ok(flags)
	}

	/// Like [`Parser::expect_access_flags`], but also recognises the class-kind sugar words
	/// (`class`, `enum`, `interface`, `module`, `@interface`), which additionally set implied
	/// flags (see spec §4.2/§6).
	pub(crate) fn expect_class_access_flags(&mut self) -> Result<(RawFlags, Option<ClassKind>), ParseError> {
		let mut flags = RawFlags::default();
		let mut kind = None;
		loop {
			match self.next()? {
				Token::Word(w) if FLAG_WORDS.contains(&w.as_str()) => {
					flags.set(&w);
				}
				Token::Word(w) if w == "class" => {
					kind = Some(ClassKind::Class);
					flags.super_ = true;
				}
				Token::Word(w) if w == "enum" => {
					kind = Some(ClassKind::Enum);
					flags.super_ = true;
					flags.enum_ = true;
				}
				Token::Word(w) if w == "interface" => {
					kind = Some(ClassKind::Interface);
					flags.abstract_ = true;
					flags.interface = true;
				}
				Token::Word(w) if w == "module" => {
					kind = Some(ClassKind::Module);
					flags.module = true;
				}
				Token::Punct('@') => {
					self.expect_word_exact("interface")?;
					kind = Some(ClassKind::AnnotationInterface);
					flags.abstract_ = true;
					flags.interface = true;
					flags.abstract_annotation = true;
				}
				t => {
					self.push_back(t);
					break;
				}
			}
		}
		Ok((flags, kind))
	}

	// --- names / types ---

	fn resolve_class_name(&self, word: &str) -> Result<ClassName, ParseError> {
		let dotted = if !word.contains('.') {
			self.imports.get(word).cloned().unwrap_or_else(|| word.to_string())
		} else {
			word.to_string()
		};
		let internal = dotted.replace('.', "/");
		ClassName::new(java_string(&internal)).map_err(|e| self.err(e.to_string()))
	}

	pub(crate) fn expect_class_name(&mut self) -> Result<ClassName, ParseError> {
		let word = self.expect_word()?;
		self.resolve_class_name(&word)
	}

	fn primitive_type(word: &str) -> Option<(Type, ArrayType)> {
		Some(match word {
			"boolean" => (Type::Z, ArrayType::Z),
			"byte" => (Type::B, ArrayType::B),
			"char" => (Type::C, ArrayType::C),
			"short" => (Type::S, ArrayType::S),
			"int" => (Type::I, ArrayType::I),
			"long" => (Type::J, ArrayType::J),
			"float" => (Type::F, ArrayType::F),
			"double" => (Type::D, ArrayType::D),
			_ => return None,
		})
	}

	/// Reads a word, looks it up in the imports table, consumes trailing `[]` pairs, and returns
	/// the resulting [`Type`].
	pub(crate) fn expect_type(&mut self) -> Result<Type, ParseError> {
		let word = self.expect_word()?;
		let (base, array_elem) = if let Some((base, arr)) = Self::primitive_type(&word) {
			(base, arr)
		} else {
			let class_name = self.resolve_class_name(&word)?;
			(Type::Object(class_name.clone()), ArrayType::Object(class_name))
		};

		let mut dims: u8 = 0;
		loop {
			if self.accept_punct('[')? {
				self.expect_punct(']')?;
				dims = dims.checked_add(1).ok_or_else(|| self.err("too many array dimensions"))?;
			} else {
				break;
			}
		}

		Ok(if dims == 0 {
			base
		} else {
			Type::Array(dims, array_elem)
		})
	}

	/// Like [`Parser::expect_type`], but additionally accepts `void`, returning `None`.
	pub(crate) fn expect_return_type(&mut self) -> Result<Option<Type>, ParseError> {
		if self.accept_word("void")? {
			return Ok(None);
		}
		self.expect_type().map(Some)
	}

	/// Parses a `methodArgsDecl`: a parenthesised, comma-separated list of
	/// `accessFlags type [name]` entries. The flags and name are only meaningful for the
	/// `MethodParameters` attribute; see [`parameters_from_flags_and_names`].
	pub(crate) fn expect_method_args(&mut self) -> Result<Vec<(RawFlags, Type, Option<String>)>, ParseError> {
		self.expect_punct('(')?;
		let mut args = Vec::new();
		if !self.accept_punct(')')? {
			loop {
				let flags = self.expect_access_flags()?;
				let ty = self.expect_type()?;
				let name = match self.next()? {
					Token::Word(w) => Some(w),
					t => {
						self.push_back(t);
						None
					}
				};
				args.push((flags, ty, name));
				if self.accept_punct(',')? {
					continue;
				}
				self.expect_punct(')')?;
				break;
			}
		}
		Ok(args)
	}

	/// Like [`Parser::expect_method_args`], but for a reference's argument-type list (no flags,
	/// no names), e.g. `Foo#void bar(int,long)`.
	pub(crate) fn expect_type_list(&mut self) -> Result<Vec<Type>, ParseError> {
		self.expect_punct('(')?;
		let mut list = Vec::new();
		if !self.accept_punct(')')? {
			loop {
				list.push(self.expect_type()?);
				if self.accept_punct(',')? {
					continue;
				}
				self.expect_punct(')')?;
				break;
			}
		}
		Ok(list)
	}

	pub(crate) fn expect_method_name(&mut self) -> Result<MethodName, ParseError> {
		if self.accept_punct('<')? {
			let word = self.expect_keyword(&["init", "clinit"])?;
			self.expect_punct('>')?;
			let name = format!("<{word}>");
			return MethodName::new(java_string(&name)).map_err(|e| self.err(e.to_string()));
		}
		let word = self.expect_word()?;
		MethodName::new(java_string(&word)).map_err(|e| self.err(e.to_string()))
	}

	// --- top-level grammar ---

	fn parse_class_file(&mut self) -> Result<ClassFile, ParseError> {
		loop {
			if self.accept_word("import")? {
				let line = self.line();
				let word = self.expect_word()?;
				self.expect_punct(';')?;
				let simple = word.rsplit('.').next().unwrap_or(&word).to_string();
				if self.imports.insert(simple.clone(), word.clone()).is_some() {
					return Err(self.err_at(line, format!("import {simple:?} already declared")));
				}
			} else {
				break;
			}
		}

		let mut version = Version::V1_1;
		if self.accept_word("version")? {
			let line = self.line();
			let n = self.expect_number()?;
			self.expect_punct(';')?;
			version = parse_version_number(n).ok_or_else(|| self.err_at(line, format!("unsupported version {n}")))?;
		}

		let (flags, kind) = self.expect_class_access_flags()?;
		let access = ClassAccess {
			is_public: flags.public,
			is_final: flags.final_,
			is_super: flags.super_,
			is_interface: flags.interface,
			is_abstract: flags.abstract_,
			is_synthetic: flags.synthetic,
			is_annotation: flags.abstract_annotation,
			is_enum: flags.enum_,
			is_module: flags.module,
		};

		let name = self.expect_class_name()?;
		self.current_class = Some(name.clone());

		let is_interface_kind = kind == Some(ClassKind::Interface) || kind == Some(ClassKind::AnnotationInterface);

		let mut super_class = None;
		let mut interfaces = Vec::new();
		if is_interface_kind {
			if self.accept_word("extends")? {
				interfaces = self.expect_class_name_list()?;
			}
		} else if self.accept_word("extends")? {
			super_class = Some(self.expect_class_name()?);
		}
		if !is_interface_kind && self.accept_word("implements")? {
			interfaces = self.expect_class_name_list()?;
		}

		if super_class.is_none() && kind != Some(ClassKind::Module) {
			super_class = if access.is_enum {
				Some(ClassName::new(java_string("java/lang/Enum")).map_err(|e| self.err(e.to_string()))?)
			} else if name.as_slice() == ClassName::JAVA_LANG_OBJECT {
				None
			} else {
				Some(ClassName::JAVA_LANG_OBJECT.to_owned())
			};
		}

		if access.is_annotation {
			let marker = ClassName::new(java_string("java/lang/annotation/Annotation")).map_err(|e| self.err(e.to_string()))?;
			if !interfaces.contains(&marker) {
				interfaces.push(marker);
			}
		}

		let mut class = ClassFile::new(version, access, name, super_class, interfaces);

		if self.accept_punct('[')? {
			self.push_back(Token::Punct('['));
			attribute::parse_class_attributes(self, &mut class)?;
		}

		if self.accept_punct(';')? {
			return Ok(class);
		}
		self.expect_punct('{')?;
		loop {
			if self.accept_punct('}')? {
				break;
			}
			self.parse_member(&mut class)?;
		}

		Ok(class)
	}

	fn expect_class_name_list(&mut self) -> Result<Vec<ClassName>, ParseError> {
		let mut names = vec![self.expect_class_name()?];
		while self.accept_punct(',')? {
			names.push(self.expect_class_name()?);
		}
		Ok(names)
	}

	fn parse_member(&mut self, class: &mut ClassFile) -> Result<(), ParseError> {
		let flags = self.expect_access_flags()?;

		// `clinitDecl = accessFlags ( attributes | methodBody )`
		if self.accept_punct('[')? {
			self.push_back(Token::Punct('['));
			// an attribute block with no preceding type/name can only belong to a static
			// initializer; treat it the same as an empty `<clinit>` header.
			return self.parse_method_after_header(class, flags, None, MethodName::CLINIT.to_owned(), Vec::new());
		}
		if self.accept_punct('{')? {
			self.push_back(Token::Punct('{'));
			return self.parse_method_after_header(class, flags, None, MethodName::CLINIT.to_owned(), Vec::new());
		}

		let return_type = self.expect_return_type()?;
		let name = self.expect_method_name()?;

		if self.accept_punct('(')? {
			self.push_back(Token::Punct('('));
			let args = self.expect_method_args()?;
			self.parse_method_after_header(class, flags, return_type, name, args)
		} else {
			let descriptor = duke::tree::descriptor::ParsedFieldDescriptor(
				return_type.ok_or_else(|| self.err("a field cannot have type void"))?
			).write();
			self.parse_field_after_header(class, flags, descriptor, FieldName::new(name.into_inner()).map_err(|e| self.err(e.to_string()))?)
		}
	}

	fn parse_field_after_header(&mut self, class: &mut ClassFile, flags: RawFlags, descriptor: FieldDescriptor, name: FieldName) -> Result<(), ParseError> {
		let access = FieldAccess {
			is_public: flags.public,
			is_private: flags.private,
			is_protected: flags.protected,
			is_static: flags.static_,
			is_final: flags.final_,
			is_volatile: flags.volatile,
			is_transient: flags.transient,
			is_synthetic: flags.synthetic,
			is_enum: flags.enum_,
		};
		let mut field = Field::new(access, name, descriptor);

		if self.accept_punct('=')? {
			field.constant_value = Some(constant::parse_constant_value(self)?);
		}

		if self.accept_punct('[')? {
			attribute::parse_field_attributes(self, &mut field)?;
		}
		self.expect_punct(';')?;

		class.fields.push(field);
		Ok(())
	}

	fn parse_method_after_header(&mut self, class: &mut ClassFile, flags: RawFlags, return_type: Option<Type>, name: MethodName, args: Vec<(RawFlags, Type, Option<String>)>) -> Result<(), ParseError> {
		let access = MethodAccess {
			is_public: flags.public,
			is_private: flags.private,
			is_protected: flags.protected,
			is_static: flags.static_,
			is_final: flags.final_,
			is_synchronized: flags.synchronized,
			is_bridge: flags.bridge,
			is_varargs: flags.varargs,
			is_native: flags.native,
			is_abstract: flags.abstract_,
			is_strict: flags.strictfp,
			is_synthetic: flags.synthetic,
		};

		let parameter_flags_and_names: Vec<(RawFlags, Option<String>)> = args.iter()
			.map(|(f, _, n)| (*f, n.clone())).collect();
		let parameter_descriptors = args.into_iter().map(|(_, ty, _)| ty).collect();

		let descriptor: MethodDescriptor = duke::tree::descriptor::ParsedMethodDescriptor {
			parameter_descriptors,
			return_descriptor: return_type,
		}.write();

		let mut method = Method::new(access, name, descriptor);
		method.method_parameters = parameters_from_flags_and_names(parameter_flags_and_names)
			.map_err(|e| self.err(e.message))?;

		if self.accept_word("throws")? {
			method.exceptions = Some(self.expect_class_name_list()?);
		}

		if self.accept_punct('[')? {
			attribute::parse_method_attributes(self, &mut method)?;
		}

		if self.accept_punct(';')? {
			class.methods.push(method);
			return Ok(());
		}

		self.expect_punct('{')?;
		let code = instruction::parse_code(self)?;
		method.code = Some(code);
		self.expect_punct('}')?;

		class.methods.push(method);
		Ok(())
	}
}

fn parse_version_number(n: f64) -> Option<Version> {
	// `1.0`..`1.9` map to major versions 45..54 (the historical `1.x` numbering used up to J2SE
	// 1.4, after which releases switched to bare major numbers); bare `5`..`13` map directly.
	if (1.0..2.0).contains(&n) {
		let minor_release = ((n - 1.0) * 10.0).round() as u16;
		if minor_release <= 9 {
			return Some(Version::from_major_minor(45 + minor_release, 0));
		}
		None
	} else {
		let major = n.round() as i64;
		if (5..=13).contains(&major) {
			Some(Version::from_major_minor(44 + major as u16, 0))
		} else {
			None
		}
	}
}

/// Parses a (possibly empty, comma-separated) `methodArgsDecl`-style parameter list with
/// optional access flags and names, used by [`Parser::parse_method_after_header`]'s caller for
/// the `MethodParameters` attribute. Exposed for the method-header grammar in
/// [`Parser::parse_member`]... kept here since it shares `Parser`'s helpers.
pub(crate) fn parameters_from_flags_and_names(names: Vec<(RawFlags, Option<String>)>) -> Result<Option<Vec<MethodParameter>>, ParseError> {
	let any_interesting = names.iter().any(|(f, n)| n.is_some() || f.final_ || f.synthetic || f.mandated);
	if !any_interesting {
		return Ok(None);
	}
	let mut out = Vec::new();
	for (f, n) in names {
		let name = match n {
			Some(n) => Some(ParameterName::new(java_string(&n)).map_err(|e| ParseError::new(0, e.to_string()))?),
			None => None,
		};
		out.push(MethodParameter {
			name,
			flags: ParameterFlags {
				is_final: f.final_,
				is_synthetic: f.synthetic,
				is_mandated: f.mandated,
			},
		});
	}
	Ok(Some(out))
}
