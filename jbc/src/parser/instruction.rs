//! Parses a method body into a [`Code`] (spec §4.7, §4.8, §4.9).
//!
//! Offsets are never computed here: every jump target, exception range and local-variable range
//! is kept as a symbolic [`Label`], and it's the class writer that lays out the actual bytecode
//! and picks the widened forms of branch/variable instructions where needed.

use std::collections::HashMap;
use duke::tree::descriptor::Type;
use duke::tree::field::{FieldDescriptor, FieldSignature};
use duke::tree::method::code::{
	ArrayType, Code, Exception, Instruction, InstructionListEntry, Label, LabelRange, Lv, LvIndex,
	StackMapData, VerificationTypeInfo,
};
use crate::error::ParseError;
use crate::keywords::{FRAME_KIND_KEYWORDS, VERIFICATION_TYPE_KEYWORDS};
use crate::parser::{constant, java_string, Parser};
use crate::token::Token;

/// Maximum number of distinct labels a single [`Code`] may use (spec §4.7).
const MAX_LABELS: u32 = 65534;

/// Maps label names to [`Label`] ids, coalescing multiple names that land on the same
/// instruction and forward references that turn out to alias an already-named position.
pub(crate) struct LabelAllocator {
	by_name: HashMap<String, Label>,
	alias: HashMap<u16, u16>,
	next_id: u32,
	pending: Option<Label>,
	pending_frame: Option<StackMapData>,
}

impl LabelAllocator {
	fn new() -> LabelAllocator {
		LabelAllocator { by_name: HashMap::new(), alias: HashMap::new(), next_id: 0, pending: None, pending_frame: None }
	}

	/// Attaches an explicitly-written frame to whichever instruction comes next.
	fn set_pending_frame(&mut self, frame: StackMapData) {
		self.pending_frame = Some(frame);
	}

	fn take_pending_frame(&mut self) -> Option<StackMapData> {
		self.pending_frame.take()
	}

	fn mint(&mut self, line: usize) -> Result<Label, ParseError> {
		if self.next_id >= MAX_LABELS {
			return Err(ParseError::new(line, "too many labels in one method body"));
		}
		let id = self.next_id as u16;
		self.next_id += 1;
		Ok(Label::new(id))
	}

	/// An ordinary (possibly forward) reference to `name`, minting it if unseen.
	pub(crate) fn reference(&mut self, line: usize, name: &str) -> Result<Label, ParseError> {
		if let Some(&l) = self.by_name.get(name) {
			return Ok(l);
		}
		let l = self.mint(line)?;
		self.by_name.insert(name.to_string(), l);
		Ok(l)
	}

	/// Defines `name` as a label at the current position, coalescing with any other name or
	/// forward reference already resolved to this position.
	fn define(&mut self, line: usize, name: &str) -> Result<Label, ParseError> {
		let existing = self.by_name.get(name).copied();
		let canonical = match (existing, self.pending) {
			(Some(e), Some(p)) if e.id() != p.id() => {
				self.alias.insert(e.id(), p.id());
				p
			}
			(Some(e), _) => e,
			(None, Some(p)) => p,
			(None, None) => self.mint(line)?,
		};
		self.by_name.insert(name.to_string(), canonical);
		self.pending = Some(canonical);
		Ok(canonical)
	}

	/// A label for the current position, for constructs that need one without a source name
	/// (`catch`'s handler PC, `startlocalvar`'s start PC).
	pub(crate) fn current_position(&mut self, line: usize) -> Result<Label, ParseError> {
		match self.pending {
			Some(p) => Ok(p),
			None => {
				let l = self.mint(line)?;
				self.pending = Some(l);
				Ok(l)
			}
		}
	}

	/// Takes the label pending for the position about to receive a real instruction.
	fn take_pending(&mut self) -> Option<Label> {
		self.pending.take()
	}

	fn canonical(&self, label: Label) -> Label {
		let mut id = label.id();
		while let Some(&next) = self.alias.get(&id) {
			id = next;
		}
		Label::new(id)
	}

	/// Rewrites every label reachable from `code` through its final alias chain. Must be called
	/// once, after the whole method body has been parsed.
	pub(crate) fn finish(&self, code: &mut Code) {
		for entry in &mut code.instructions {
			if let Some(l) = &mut entry.label {
				*l = self.canonical(*l);
			}
			remap_instruction(self, &mut entry.instruction);
			if let Some(frame) = &mut entry.frame {
				remap_frame(self, frame);
			}
		}
		for exc in &mut code.exception_table {
			exc.start = self.canonical(exc.start);
			exc.end = self.canonical(exc.end);
			exc.handler = self.canonical(exc.handler);
		}
		if let Some(last) = &mut code.last_label {
			*last = self.canonical(*last);
		}
		if let Some(lines) = &mut code.line_numbers {
			for (l, _) in lines {
				*l = self.canonical(*l);
			}
		}
		if let Some(lvs) = &mut code.local_variables {
			for lv in lvs {
				lv.range.start = self.canonical(lv.range.start);
				lv.range.end = self.canonical(lv.range.end);
			}
		}
	}
}

fn remap_instruction(alloc: &LabelAllocator, instr: &mut Instruction) {
	match instr {
		Instruction::IfEq(l) | Instruction::IfNe(l) | Instruction::IfLt(l) | Instruction::IfGe(l) |
		Instruction::IfGt(l) | Instruction::IfLe(l) |
		Instruction::IfICmpEq(l) | Instruction::IfICmpNe(l) | Instruction::IfICmpLt(l) |
		Instruction::IfICmpGe(l) | Instruction::IfICmpGt(l) | Instruction::IfICmpLe(l) |
		Instruction::IfACmpEq(l) | Instruction::IfACmpNe(l) |
		Instruction::Goto(l) | Instruction::Jsr(l) |
		Instruction::IfNull(l) | Instruction::IfNonNull(l) => {
			*l = alloc.canonical(*l);
		}
		Instruction::TableSwitch { default, table, .. } => {
			*default = alloc.canonical(*default);
			for l in table {
				*l = alloc.canonical(*l);
			}
		}
		Instruction::LookupSwitch { default, pairs } => {
			*default = alloc.canonical(*default);
			for (_, l) in pairs {
				*l = alloc.canonical(*l);
			}
		}
		_ => {}
	}
}

fn remap_verification_type(alloc: &LabelAllocator, info: &mut VerificationTypeInfo) {
	if let VerificationTypeInfo::Uninitialized(l) = info {
		*l = alloc.canonical(*l);
	}
}

fn remap_frame(alloc: &LabelAllocator, frame: &mut StackMapData) {
	match frame {
		StackMapData::Same | StackMapData::Chop { .. } => {}
		StackMapData::SameLocals1StackItem { stack } => remap_verification_type(alloc, stack),
		StackMapData::Append { locals } => locals.iter_mut().for_each(|v| remap_verification_type(alloc, v)),
		StackMapData::Full { locals, stack } => {
			locals.iter_mut().for_each(|v| remap_verification_type(alloc, v));
			stack.iter_mut().for_each(|v| remap_verification_type(alloc, v));
		}
	}
}

struct OpenLocal {
	start: Label,
	name: String,
	descriptor: Option<FieldDescriptor>,
	signature: Option<FieldSignature>,
}

/// Parses the body of a method (the contents between the `{` and `}` already consumed by the
/// caller) into a [`Code`].
pub(crate) fn parse_code(p: &mut Parser) -> Result<Code, ParseError> {
	let mut code = Code::default();
	let mut alloc = LabelAllocator::new();
	let mut open_locals: HashMap<u16, OpenLocal> = HashMap::new();

	loop {
		let line = p.line();
		match p.next_raw()? {
			Token::Punct('}') => {
				p.push_back(Token::Punct('}'));
				break;
			}
			Token::Punct('[') => {
				p.push_back(Token::Punct('['));
				crate::parser::attribute::parse_code_attributes(p, &mut code, &mut alloc)?;
			}
			Token::Word(w) if w == "catch" => {
				parse_catch(p, &mut code, &mut alloc, line)?;
			}
			Token::Word(w) if w == "frame" => {
				let frame = parse_frame(p, &mut alloc, line)?;
				alloc.set_pending_frame(frame);
			}
			Token::Word(w) if w == "line" => {
				let n = p.expect_number()? as u16;
				p.expect_punct(';')?;
				let label = alloc.current_position(line)?;
				code.line_numbers.get_or_insert_with(Vec::new).push((label, n));
			}
			Token::Word(w) if w == "startlocalvar" => {
				let index = p.expect_number()? as u16;
				let name = p.expect_word()?;
				let descriptor = p.expect_type()?;
				p.expect_punct(';')?;
				let start = alloc.current_position(line)?;
				let entry = open_locals.entry(index).or_insert_with(|| OpenLocal {
					start, name: name.clone(), descriptor: None, signature: None,
				});
				entry.descriptor = Some(duke::tree::descriptor::ParsedFieldDescriptor(descriptor).write());
				entry.name = name;
			}
			Token::Word(w) if w == "startlocalvartype" => {
				let index = p.expect_number()? as u16;
				let name = p.expect_word()?;
				let signature = p.expect_string()?;
				p.expect_punct(';')?;
				let start = alloc.current_position(line)?;
				let entry = open_locals.entry(index).or_insert_with(|| OpenLocal {
					start, name: name.clone(), descriptor: None, signature: None,
				});
				entry.signature = Some(FieldSignature::new(java_string(&signature)).map_err(|e| p.err(e.to_string()))?);
				entry.name = name;
			}
			Token::Word(w) if w == "endlocalvar" || w == "endlocalvartype" => {
				let index = p.expect_number()? as u16;
				p.expect_punct(';')?;
				if let Some(open) = open_locals.remove(&index) {
					let end = alloc.current_position(line)?;
					code.local_variables.get_or_insert_with(Vec::new).push(Lv {
						range: LabelRange { start: open.start, end },
						name: duke::tree::method::code::LocalVariableName::new(java_string(&open.name)).map_err(|e| p.err(e.to_string()))?,
						descriptor: open.descriptor,
						signature: open.signature,
						index: LvIndex { index },
					});
				} else {
					return Err(p.err(format!("endlocalvar for unseen index {index}")));
				}
			}
			Token::Word(word) => {
				let next = p.next_raw()?;
				if let Token::Punct(':') = next {
					alloc.define(line, &word)?;
				} else {
					p.push_back(next);
					parse_mnemonic(p, &mut code, &mut alloc, line, &word)?;
				}
			}
			t => return Err(p.err(format!("expected an instruction but got {}", t.describe()))),
		}
	}

	code.last_label = alloc.take_pending();
	alloc.finish(&mut code);
	Ok(code)
}

fn parse_catch(p: &mut Parser, code: &mut Code, alloc: &mut LabelAllocator, line: usize) -> Result<(), ParseError> {
	let catch_type = if p.accept_word("any")? {
		None
	} else {
		Some(p.expect_class_name()?)
	};
	let from = p.expect_word()?;
	let to = p.expect_word()?;
	p.expect_punct(';')?;
	let start = alloc.reference(line, &from)?;
	let end = alloc.reference(line, &to)?;
	let handler = alloc.current_position(line)?;
	code.exception_table.push(Exception { start, end, handler, catch: catch_type });
	Ok(())
}

/// Parses an explicit `frame <kind> ...;` directive (spec §6, JVMS 4.7.4), round-tripping a
/// `StackMapTable` entry that was already present in the source rather than generated by a
/// preverifier. Attaches to whichever instruction comes next at the current position.
fn parse_frame(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<StackMapData, ParseError> {
	let kind = p.expect_keyword(FRAME_KIND_KEYWORDS)?;
	let frame = match kind {
		"same" => StackMapData::Same,
		"same_locals_1_stack_item" => StackMapData::SameLocals1StackItem { stack: parse_verification_type_info(p, alloc, line)? },
		"chop" => StackMapData::Chop { absent: p.expect_number()? as i64 as u8 },
		"append" => StackMapData::Append { locals: parse_verification_type_list(p, alloc, line)? },
		"full" => {
			p.expect_word_exact("locals")?;
			let locals = parse_verification_type_list(p, alloc, line)?;
			p.expect_word_exact("stack")?;
			let stack = parse_verification_type_list(p, alloc, line)?;
			StackMapData::Full { locals, stack }
		}
		_ => unreachable!("FRAME_KIND_KEYWORDS exhausted"),
	};
	p.expect_punct(';')?;
	Ok(frame)
}

fn parse_verification_type_list(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<Vec<VerificationTypeInfo>, ParseError> {
	p.expect_punct('{')?;
	let mut out = Vec::new();
	while !p.accept_punct('}')? {
		out.push(parse_verification_type_info(p, alloc, line)?);
	}
	Ok(out)
}

fn parse_verification_type_info(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<VerificationTypeInfo, ParseError> {
	let kind = p.expect_keyword(VERIFICATION_TYPE_KEYWORDS)?;
	Ok(match kind {
		"top" => VerificationTypeInfo::Top,
		"integer" => VerificationTypeInfo::Integer,
		"float" => VerificationTypeInfo::Float,
		"double" => VerificationTypeInfo::Double,
		"long" => VerificationTypeInfo::Long,
		"null" => VerificationTypeInfo::Null,
		"uninitialized_this" => VerificationTypeInfo::UninitializedThis,
		"object" => VerificationTypeInfo::Object(expect_class_ref_type(p)?),
		"uninitialized" => VerificationTypeInfo::Uninitialized(label_ref(p, alloc, line)?),
		_ => unreachable!("VERIFICATION_TYPE_KEYWORDS exhausted"),
	})
}

fn emit(code: &mut Code, alloc: &mut LabelAllocator, instruction: Instruction) {
	code.instructions.push(InstructionListEntry {
		label: alloc.take_pending(),
		frame: alloc.take_pending_frame(),
		instruction,
	});
}

fn lv_index(p: &mut Parser) -> Result<LvIndex, ParseError> {
	Ok(LvIndex { index: p.expect_number()? as u16 })
}

fn label_ref(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<Label, ParseError> {
	let name = p.expect_word()?;
	alloc.reference(line, &name)
}

fn primitive_array_type(p: &mut Parser) -> Result<ArrayType, ParseError> {
	let word = p.expect_word()?;
	Ok(match word.as_str() {
		"boolean" => ArrayType::Boolean,
		"char" => ArrayType::Char,
		"float" => ArrayType::Float,
		"double" => ArrayType::Double,
		"byte" => ArrayType::Byte,
		"short" => ArrayType::Short,
		"int" => ArrayType::Int,
		"long" => ArrayType::Long,
		other => return Err(p.err(format!("unknown primitive array type {other:?}"))),
	})
}

fn expect_class_ref_type(p: &mut Parser) -> Result<duke::tree::class::ClassName, ParseError> {
	let ty = p.expect_type()?;
	constant::type_to_class_name(p, ty)
}

/// Parses and registers the body of a `tableswitch`/`lookupswitch` block: `case N: label;`
/// entries and one `default: label;` entry, closed by `}`.
fn parse_switch_body(p: &mut Parser, alloc: &mut LabelAllocator, line: usize) -> Result<(Vec<(i32, Label)>, Label), ParseError> {
	p.expect_punct('{')?;
	let mut entries = Vec::new();
	let mut default = None;
	loop {
		if p.accept_punct('}')? {
			break;
		}
		if p.accept_word("default")? {
			p.expect_punct(':')?;
			let label = label_ref(p, alloc, line)?;
			p.expect_punct(';')?;
			if default.is_some() {
				return Err(p.err("duplicate default case"));
			}
			default = Some(label);
		} else {
			p.expect_word_exact("case")?;
			let key = p.expect_number()? as i32;
			p.expect_punct(':')?;
			let label = label_ref(p, alloc, line)?;
			p.expect_punct(';')?;
			entries.push((key, label));
		}
	}
	let default = default.ok_or_else(|| p.err("switch is missing a default case"))?;
	Ok((entries, default))
}

fn parse_table_switch(p: &mut Parser, code: &mut Code, alloc: &mut LabelAllocator, line: usize) -> Result<(), ParseError> {
	let (mut entries, default) = parse_switch_body(p, alloc, line)?;
	entries.sort_by_key(|(k, _)| *k);
	for pair in entries.windows(2) {
		if pair[1].0 != pair[0].0 + 1 {
			return Err(p.err("tableswitch case keys must be contiguous"));
		}
	}
	let low = entries.first().map(|(k, _)| *k).unwrap_or(0);
	let high = entries.last().map(|(k, _)| *k).unwrap_or(0);
	let table = entries.into_iter().map(|(_, l)| l).collect();
	emit(code, alloc, Instruction::TableSwitch { default, low, high, table });
	Ok(())
}

fn parse_lookup_switch(p: &mut Parser, code: &mut Code, alloc: &mut LabelAllocator, line: usize) -> Result<(), ParseError> {
	let (pairs, default) = parse_switch_body(p, alloc, line)?;
	for pair in pairs.windows(2) {
		if pair[1].0 <= pair[0].0 {
			return Err(p.err("lookupswitch case keys must be strictly increasing"));
		}
	}
	emit(code, alloc, Instruction::LookupSwitch { default, pairs });
	Ok(())
}

/// Parses a single real instruction (anything but a label definition or a pseudo-instruction
/// already handled by [`parse_code`]) and appends it to `code`.
fn parse_mnemonic(p: &mut Parser, code: &mut Code, alloc: &mut LabelAllocator, line: usize, word: &str) -> Result<(), ParseError> {
	macro_rules! simple {
		($instr:expr) => {{
			p.expect_punct(';')?;
			emit(code, alloc, $instr);
			return Ok(());
		}};
	}
	macro_rules! lv {
		($variant:ident) => {{
			let index = lv_index(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::$variant(index));
			return Ok(());
		}};
	}
	macro_rules! branch {
		($variant:ident) => {{
			let label = label_ref(p, alloc, line)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::$variant(label));
			return Ok(());
		}};
	}
	macro_rules! field_ref_instr {
		($variant:ident) => {{
			let field = constant::parse_field_ref(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::$variant(field));
			return Ok(());
		}};
	}

	match word {
		"nop" => simple!(Instruction::Nop),
		"aconst_null" => simple!(Instruction::AConstNull),
		"iconst_m1" => simple!(Instruction::IConstM1),
		"iconst_0" => simple!(Instruction::IConst0),
		"iconst_1" => simple!(Instruction::IConst1),
		"iconst_2" => simple!(Instruction::IConst2),
		"iconst_3" => simple!(Instruction::IConst3),
		"iconst_4" => simple!(Instruction::IConst4),
		"iconst_5" => simple!(Instruction::IConst5),
		"lconst_0" => simple!(Instruction::LConst0),
		"lconst_1" => simple!(Instruction::LConst1),
		"fconst_0" => simple!(Instruction::FConst0),
		"fconst_1" => simple!(Instruction::FConst1),
		"fconst_2" => simple!(Instruction::FConst2),
		"dconst_0" => simple!(Instruction::DConst0),
		"dconst_1" => simple!(Instruction::DConst1),
		"bipush" => {
			let n = p.expect_number()? as i64 as i8;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::BiPush(n));
		}
		"sipush" => {
			let n = p.expect_number()? as i64 as i16;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::SiPush(n));
		}
		// `ldc_w`/`ldc2_w` are accepted as aliases of `ldc`: the writer picks the narrow/wide
		// constant-pool index form and the one/two-slot form on its own from the operand.
		"ldc" | "ldc_w" | "ldc2_w" => {
			let constant = constant::parse_loadable(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::Ldc(constant));
		}
		// `_w` variable-instruction mnemonics are likewise accepted as aliases: the writer emits
		// the `wide`-prefixed encoding on its own when the index doesn't fit in a byte.
		"iload" | "iload_w" => lv!(ILoad),
		"lload" | "lload_w" => lv!(LLoad),
		"fload" | "fload_w" => lv!(FLoad),
		"dload" | "dload_w" => lv!(DLoad),
		"aload" | "aload_w" => lv!(ALoad),
		"istore" | "istore_w" => lv!(IStore),
		"lstore" | "lstore_w" => lv!(LStore),
		"fstore" | "fstore_w" => lv!(FStore),
		"dstore" | "dstore_w" => lv!(DStore),
		"astore" | "astore_w" => lv!(AStore),
		"ret" | "ret_w" => lv!(Ret),
		"iaload" => simple!(Instruction::IALoad),
		"laload" => simple!(Instruction::LALoad),
		"faload" => simple!(Instruction::FALoad),
		"daload" => simple!(Instruction::DALoad),
		"aaload" => simple!(Instruction::AALoad),
		"baload" => simple!(Instruction::BALoad),
		"caload" => simple!(Instruction::CALoad),
		"saload" => simple!(Instruction::SALoad),
		"iastore" => simple!(Instruction::IAStore),
		"lastore" => simple!(Instruction::LAStore),
		"fastore" => simple!(Instruction::FAStore),
		"dastore" => simple!(Instruction::DAStore),
		"aastore" => simple!(Instruction::AAStore),
		"bastore" => simple!(Instruction::BAStore),
		"castore" => simple!(Instruction::CAStore),
		"sastore" => simple!(Instruction::SAStore),
		"pop" => simple!(Instruction::Pop),
		"pop2" => simple!(Instruction::Pop2),
		"dup" => simple!(Instruction::Dup),
		"dup_x1" => simple!(Instruction::DupX1),
		"dup_x2" => simple!(Instruction::DupX2),
		"dup2" => simple!(Instruction::Dup2),
		"dup2_x1" => simple!(Instruction::Dup2X1),
		"dup2_x2" => simple!(Instruction::Dup2X2),
		"swap" => simple!(Instruction::Swap),
		"iadd" => simple!(Instruction::IAdd),
		"ladd" => simple!(Instruction::LAdd),
		"fadd" => simple!(Instruction::FAdd),
		"dadd" => simple!(Instruction::DAdd),
		"isub" => simple!(Instruction::ISub),
		"lsub" => simple!(Instruction::LSub),
		"fsub" => simple!(Instruction::FSub),
		"dsub" => simple!(Instruction::DSub),
		"imul" => simple!(Instruction::IMul),
		"lmul" => simple!(Instruction::LMul),
		"fmul" => simple!(Instruction::FMul),
		"dmul" => simple!(Instruction::DMul),
		"idiv" => simple!(Instruction::IDiv),
		"ldiv" => simple!(Instruction::LDiv),
		"fdiv" => simple!(Instruction::FDiv),
		"ddiv" => simple!(Instruction::DDiv),
		"irem" => simple!(Instruction::IRem),
		"lrem" => simple!(Instruction::LRem),
		"frem" => simple!(Instruction::FRem),
		"drem" => simple!(Instruction::DRem),
		"ineg" => simple!(Instruction::INeg),
		"lneg" => simple!(Instruction::LNeg),
		"fneg" => simple!(Instruction::FNeg),
		"dneg" => simple!(Instruction::DNeg),
		"ishl" => simple!(Instruction::IShl),
		"lshl" => simple!(Instruction::LShl),
		"ishr" => simple!(Instruction::IShr),
		"lshr" => simple!(Instruction::LShr),
		"iushr" => simple!(Instruction::IUShr),
		"lushr" => simple!(Instruction::LUShr),
		"iand" => simple!(Instruction::IAnd),
		"land" => simple!(Instruction::LAnd),
		"ior" => simple!(Instruction::IOr),
		"lor" => simple!(Instruction::LOr),
		"ixor" => simple!(Instruction::IXor),
		"lxor" => simple!(Instruction::LXor),
		"iinc" | "iinc_w" => {
			let index = lv_index(p)?;
			let delta = p.expect_number()? as i64 as i16;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::IInc(index, delta));
		}
		"i2l" => simple!(Instruction::I2L),
		"i2f" => simple!(Instruction::I2F),
		"i2d" => simple!(Instruction::I2D),
		"l2i" => simple!(Instruction::L2I),
		"l2f" => simple!(Instruction::L2F),
		"l2d" => simple!(Instruction::L2D),
		"f2i" => simple!(Instruction::F2I),
		"f2l" => simple!(Instruction::F2L),
		"f2d" => simple!(Instruction::F2D),
		"d2i" => simple!(Instruction::D2I),
		"d2l" => simple!(Instruction::D2L),
		"d2f" => simple!(Instruction::D2F),
		"i2b" => simple!(Instruction::I2B),
		"i2c" => simple!(Instruction::I2C),
		"i2s" => simple!(Instruction::I2S),
		"lcmp" => simple!(Instruction::LCmp),
		"fcmpl" => simple!(Instruction::FCmpL),
		"fcmpg" => simple!(Instruction::FCmpG),
		"dcmpl" => simple!(Instruction::DCmpL),
		"dcmpg" => simple!(Instruction::DCmpG),
		"ifeq" => branch!(IfEq),
		"ifne" => branch!(IfNe),
		"iflt" => branch!(IfLt),
		"ifge" => branch!(IfGe),
		"ifgt" => branch!(IfGt),
		"ifle" => branch!(IfLe),
		"if_icmpeq" => branch!(IfICmpEq),
		"if_icmpne" => branch!(IfICmpNe),
		"if_icmplt" => branch!(IfICmpLt),
		"if_icmpge" => branch!(IfICmpGe),
		"if_icmpgt" => branch!(IfICmpGt),
		"if_icmple" => branch!(IfICmpLe),
		"if_acmpeq" => branch!(IfACmpEq),
		"if_acmpne" => branch!(IfACmpNe),
		// `goto_w`/`jsr_w` are accepted as aliases: the writer picks the 2- vs 4-byte branch
		// offset form on its own based on the resolved distance.
		"goto" | "goto_w" => branch!(Goto),
		"jsr" | "jsr_w" => branch!(Jsr),
		"ifnull" => branch!(IfNull),
		"ifnonnull" => branch!(IfNonNull),
		"tableswitch" => parse_table_switch(p, code, alloc, line)?,
		"lookupswitch" => parse_lookup_switch(p, code, alloc, line)?,
		"ireturn" => simple!(Instruction::IReturn),
		"lreturn" => simple!(Instruction::LReturn),
		"freturn" => simple!(Instruction::FReturn),
		"dreturn" => simple!(Instruction::DReturn),
		"areturn" => simple!(Instruction::AReturn),
		"return" => simple!(Instruction::Return),
		"getstatic" => field_ref_instr!(GetStatic),
		"putstatic" => field_ref_instr!(PutStatic),
		"getfield" => field_ref_instr!(GetField),
		"putfield" => field_ref_instr!(PutField),
		"invokevirtual" => {
			let method = constant::parse_method_ref(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::InvokeVirtual(method));
		}
		"invokespecial" => {
			let is_interface = p.accept_word("interface")?;
			let method = constant::parse_method_ref(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::InvokeSpecial(method, is_interface));
		}
		"invokestatic" => {
			let is_interface = p.accept_word("interface")?;
			let method = constant::parse_method_ref(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::InvokeStatic(method, is_interface));
		}
		"invokeinterface" => {
			let method = constant::parse_method_ref(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::InvokeInterface(method));
		}
		"invokedynamic" => {
			let invoke_dynamic = constant::parse_invoke_dynamic(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::InvokeDynamic(invoke_dynamic));
		}
		"new" => {
			let class = p.expect_class_name()?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::New(class));
		}
		"newarray" => {
			let ty = primitive_array_type(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::NewArray(ty));
		}
		"anewarray" => {
			let class = expect_class_ref_type(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::ANewArray(class));
		}
		"arraylength" => simple!(Instruction::ArrayLength),
		"athrow" => simple!(Instruction::AThrow),
		"checkcast" => {
			let class = expect_class_ref_type(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::CheckCast(class));
		}
		"instanceof" => {
			let class = expect_class_ref_type(p)?;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::InstanceOf(class));
		}
		"monitorenter" => simple!(Instruction::MonitorEnter),
		"monitorexit" => simple!(Instruction::MonitorExit),
		"multianewarray" => {
			let ty = p.expect_type()?;
			if !matches!(ty, Type::Array(_, _)) {
				return Err(p.err("multianewarray requires an array type"));
			}
			let class = constant::type_to_class_name(p, ty)?;
			let dims = p.expect_number()? as i64 as u8;
			p.expect_punct(';')?;
			emit(code, alloc, Instruction::MultiANewArray(class, dims));
		}
		other => return Err(p.err(format!("unknown instruction {other:?}"))),
	}
	Ok(())
}
