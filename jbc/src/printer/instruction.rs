//! Formats a [`Code`]'s instruction stream (spec §4.7, §4.8, §4.9); the mirror image of
//! `parser::instruction`.
//!
//! Labels never carry their own textual name in the tree: [`super::labels::Labels`] hands out a
//! fresh `labelN` for every position a branch, exception range, line number or local-variable
//! range refers to, and this module decides, for each such position, what to print before the
//! instruction that sits there (or at the tail position, [`Code::last_label`]).

use std::collections::HashMap;
use duke::tree::method::code::{ArrayType, Code, Exception, Instruction, Label, Lv, StackMapData, VerificationTypeInfo};
use crate::error::PrintError;
use super::Out;
use super::annotation::format_type_annotation_code;
use super::constant::{format_class_name_as_type, format_field_ref, format_invoke_dynamic, format_loadable, format_method_ref};
use super::labels::Labels;
use super::{format_class_name, format_type};

/// Events to render textually at a given label position, gathered once up front so the main
/// instruction loop only has to look them up by id.
#[derive(Default)]
struct Pending {
	catches: Vec<String>,
	lines: Vec<u16>,
	ends: Vec<String>,
	starts: Vec<String>,
}

pub(crate) fn print_code(out: &mut Out, code: &Code) -> Result<(), PrintError> {
	let labels = Labels::build(code);
	print_code_type_annotations(out, "RuntimeVisibleTypeAnnotations", &code.runtime_visible_type_annotations, &labels)?;
	print_code_type_annotations(out, "RuntimeInvisibleTypeAnnotations", &code.runtime_invisible_type_annotations, &labels)?;

	let mut pending: HashMap<u16, Pending> = HashMap::new();

	for exc in &code.exception_table {
		let entry = pending.entry(exc.handler.id()).or_default();
		entry.catches.push(format_catch(exc, &labels)?);
	}
	if let Some(lines) = &code.line_numbers {
		for (label, n) in lines {
			pending.entry(label.id()).or_default().lines.push(*n);
		}
	}
	if let Some(lvs) = &code.local_variables {
		for lv in lvs {
			let (starts, ends) = format_lv_directives(lv)?;
			let start_entry = pending.entry(lv.range.start.id()).or_default();
			start_entry.starts.extend(starts);
			let end_entry = pending.entry(lv.range.end.id()).or_default();
			end_entry.ends.extend(ends);
		}
	}

	for entry in &code.instructions {
		if let Some(label) = entry.label {
			print_position(out, &labels, label, &pending)?;
		}
		if let Some(frame) = &entry.frame {
			out.line(format_frame(frame, &labels)?);
		}
		out.line(format_instruction(&entry.instruction, &labels)?);
	}
	if let Some(last) = code.last_label {
		print_position(out, &labels, last, &pending)?;
	}

	Ok(())
}

fn print_position(out: &mut Out, labels: &Labels, label: Label, pending: &HashMap<u16, Pending>) -> Result<(), PrintError> {
	out.line(format!("{}:", labels.name(label)?));
	if let Some(p) = pending.get(&label.id()) {
		for line in &p.lines {
			out.line(format!("line {line};"));
		}
		for catch in &p.catches {
			out.line(catch);
		}
		for end in &p.ends {
			out.line(end);
		}
		for start in &p.starts {
			out.line(start);
		}
	}
	Ok(())
}

/// The only attribute keywords valid inside a method body's `[ ... ]` block (see
/// `parser::attribute::parse_code_attributes`); printed once, up front, since the grammar doesn't
/// tie them to a particular instruction position.
fn print_code_type_annotations(
	out: &mut Out,
	keyword: &str,
	annotations: &[duke::tree::type_annotation::TypeAnnotation<duke::tree::type_annotation::TargetInfoCode>],
	labels: &Labels,
) -> Result<(), PrintError> {
	if annotations.is_empty() {
		return Ok(());
	}
	out.line("[");
	out.indent();
	out.line(format!("{keyword} {{"));
	out.indent();
	for ta in annotations {
		out.line(format_type_annotation_code(ta, labels)?);
	}
	out.dedent();
	out.line("}");
	out.dedent();
	out.line("]");
	Ok(())
}

/// Inverts `parser::instruction::parse_frame`: only emitted when a `StackMapTable` entry was
/// already present on this instruction (round-tripped, never generated — see `DESIGN.md`).
fn format_frame(frame: &StackMapData, labels: &Labels) -> Result<String, PrintError> {
	Ok(match frame {
		StackMapData::Same => "frame same;".to_string(),
		StackMapData::SameLocals1StackItem { stack } => {
			format!("frame same_locals_1_stack_item {};", format_verification_type_info(stack, labels)?)
		}
		StackMapData::Chop { absent } => format!("frame chop {absent};"),
		StackMapData::Append { locals } => format!("frame append {};", format_verification_type_list(locals, labels)?),
		StackMapData::Full { locals, stack } => format!(
			"frame full locals {} stack {};",
			format_verification_type_list(locals, labels)?,
			format_verification_type_list(stack, labels)?,
		),
	})
}

fn format_verification_type_list(list: &[VerificationTypeInfo], labels: &Labels) -> Result<String, PrintError> {
	let mut s = String::from("{");
	for v in list {
		s.push(' ');
		s.push_str(&format_verification_type_info(v, labels)?);
	}
	s.push_str(" }");
	Ok(s)
}

fn format_verification_type_info(v: &VerificationTypeInfo, labels: &Labels) -> Result<String, PrintError> {
	Ok(match v {
		VerificationTypeInfo::Top => "top".to_string(),
		VerificationTypeInfo::Integer => "integer".to_string(),
		VerificationTypeInfo::Float => "float".to_string(),
		VerificationTypeInfo::Double => "double".to_string(),
		VerificationTypeInfo::Long => "long".to_string(),
		VerificationTypeInfo::Null => "null".to_string(),
		VerificationTypeInfo::UninitializedThis => "uninitialized_this".to_string(),
		VerificationTypeInfo::Object(c) => format!("object {}", format_class_name_as_type(c)),
		VerificationTypeInfo::Uninitialized(l) => format!("uninitialized {}", labels.name(*l)?),
	})
}

fn format_catch(exc: &Exception, labels: &Labels) -> Result<String, PrintError> {
	let ty = match &exc.catch {
		Some(c) => format_class_name(c),
		None => "any".to_string(),
	};
	Ok(format!("catch {} {} {};", ty, labels.name(exc.start)?, labels.name(exc.end)?))
}

fn format_lv_directives(lv: &Lv) -> Result<(Vec<String>, Vec<String>), PrintError> {
	let mut starts = Vec::new();
	let mut ends = Vec::new();
	if let Some(descriptor) = &lv.descriptor {
		let ty = descriptor.as_slice().parse().map_err(|e: anyhow::Error| PrintError::other(e.to_string()))?.0;
		starts.push(format!("startlocalvar {} {} {};", lv.index.index, lv.name, format_type(&ty)));
		ends.push(format!("endlocalvar {};", lv.index.index));
	}
	if let Some(signature) = &lv.signature {
		starts.push(format!("startlocalvartype {} {} {};", lv.index.index, lv.name, super::format_string_literal(&signature.to_string())));
		ends.push(format!("endlocalvartype {};", lv.index.index));
	}
	Ok((starts, ends))
}


fn format_array_type_keyword(ty: &ArrayType) -> &'static str {
	match ty {
		ArrayType::Boolean => "boolean",
		ArrayType::Char => "char",
		ArrayType::Float => "float",
		ArrayType::Double => "double",
		ArrayType::Byte => "byte",
		ArrayType::Short => "short",
		ArrayType::Int => "int",
		ArrayType::Long => "long",
	}
}

/// Inverts `parser::instruction::parse_mnemonic`: produces the complete textual instruction,
/// including its trailing `;` where the grammar requires one (every mnemonic does, except
/// `tableswitch`/`lookupswitch`, whose body already closes on its own `}`).
fn format_instruction(instr: &Instruction, labels: &Labels) -> Result<String, PrintError> {
	macro_rules! simple {
		($mnemonic:literal) => {
			return Ok(format!("{};", $mnemonic))
		};
	}
	macro_rules! lv {
		($mnemonic:literal, $index:expr) => {
			return Ok(format!("{} {};", $mnemonic, $index.index))
		};
	}
	macro_rules! branch {
		($mnemonic:literal, $label:expr) => {
			return Ok(format!("{} {};", $mnemonic, labels.name(*$label)?))
		};
	}

	match instr {
		Instruction::Nop => simple!("nop"),
		Instruction::AConstNull => simple!("aconst_null"),
		Instruction::IConstM1 => simple!("iconst_m1"),
		Instruction::IConst0 => simple!("iconst_0"),
		Instruction::IConst1 => simple!("iconst_1"),
		Instruction::IConst2 => simple!("iconst_2"),
		Instruction::IConst3 => simple!("iconst_3"),
		Instruction::IConst4 => simple!("iconst_4"),
		Instruction::IConst5 => simple!("iconst_5"),
		Instruction::LConst0 => simple!("lconst_0"),
		Instruction::LConst1 => simple!("lconst_1"),
		Instruction::FConst0 => simple!("fconst_0"),
		Instruction::FConst1 => simple!("fconst_1"),
		Instruction::FConst2 => simple!("fconst_2"),
		Instruction::DConst0 => simple!("dconst_0"),
		Instruction::DConst1 => simple!("dconst_1"),
		Instruction::BiPush(n) => Ok(format!("bipush {n};")),
		Instruction::SiPush(n) => Ok(format!("sipush {n};")),
		Instruction::Ldc(constant) => Ok(format!("ldc {};", format_loadable(constant)?)),
		Instruction::ILoad(i) => lv!("iload", i),
		Instruction::LLoad(i) => lv!("lload", i),
		Instruction::FLoad(i) => lv!("fload", i),
		Instruction::DLoad(i) => lv!("dload", i),
		Instruction::ALoad(i) => lv!("aload", i),
		Instruction::IALoad => simple!("iaload"),
		Instruction::LALoad => simple!("laload"),
		Instruction::FALoad => simple!("faload"),
		Instruction::DALoad => simple!("daload"),
		Instruction::AALoad => simple!("aaload"),
		Instruction::BALoad => simple!("baload"),
		Instruction::CALoad => simple!("caload"),
		Instruction::SALoad => simple!("saload"),
		Instruction::IStore(i) => lv!("istore", i),
		Instruction::LStore(i) => lv!("lstore", i),
		Instruction::FStore(i) => lv!("fstore", i),
		Instruction::DStore(i) => lv!("dstore", i),
		Instruction::AStore(i) => lv!("astore", i),
		Instruction::IAStore => simple!("iastore"),
		Instruction::LAStore => simple!("lastore"),
		Instruction::FAStore => simple!("fastore"),
		Instruction::DAStore => simple!("dastore"),
		Instruction::AAStore => simple!("aastore"),
		Instruction::BAStore => simple!("bastore"),
		Instruction::CAStore => simple!("castore"),
		Instruction::SAStore => simple!("sastore"),
		Instruction::Pop => simple!("pop"),
		Instruction::Pop2 => simple!("pop2"),
		Instruction::Dup => simple!("dup"),
		Instruction::DupX1 => simple!("dup_x1"),
		Instruction::DupX2 => simple!("dup_x2"),
		Instruction::Dup2 => simple!("dup2"),
		Instruction::Dup2X1 => simple!("dup2_x1"),
		Instruction::Dup2X2 => simple!("dup2_x2"),
		Instruction::Swap => simple!("swap"),
		Instruction::IAdd => simple!("iadd"),
		Instruction::LAdd => simple!("ladd"),
		Instruction::FAdd => simple!("fadd"),
		Instruction::DAdd => simple!("dadd"),
		Instruction::ISub => simple!("isub"),
		Instruction::LSub => simple!("lsub"),
		Instruction::FSub => simple!("fsub"),
		Instruction::DSub => simple!("dsub"),
		Instruction::IMul => simple!("imul"),
		Instruction::LMul => simple!("lmul"),
		Instruction::FMul => simple!("fmul"),
		Instruction::DMul => simple!("dmul"),
		Instruction::IDiv => simple!("idiv"),
		Instruction::LDiv => simple!("ldiv"),
		Instruction::FDiv => simple!("fdiv"),
		Instruction::DDiv => simple!("ddiv"),
		Instruction::IRem => simple!("irem"),
		Instruction::LRem => simple!("lrem"),
		Instruction::FRem => simple!("frem"),
		Instruction::DRem => simple!("drem"),
		Instruction::INeg => simple!("ineg"),
		Instruction::LNeg => simple!("lneg"),
		Instruction::FNeg => simple!("fneg"),
		Instruction::DNeg => simple!("dneg"),
		Instruction::IShl => simple!("ishl"),
		Instruction::LShl => simple!("lshl"),
		Instruction::IShr => simple!("ishr"),
		Instruction::LShr => simple!("lshr"),
		Instruction::IUShr => simple!("iushr"),
		Instruction::LUShr => simple!("lushr"),
		Instruction::IAnd => simple!("iand"),
		Instruction::LAnd => simple!("land"),
		Instruction::IOr => simple!("ior"),
		Instruction::LOr => simple!("lor"),
		Instruction::IXor => simple!("ixor"),
		Instruction::LXor => simple!("lxor"),
		Instruction::IInc(index, delta) => Ok(format!("iinc {} {delta};", index.index)),
		Instruction::I2L => simple!("i2l"),
		Instruction::I2F => simple!("i2f"),
		Instruction::I2D => simple!("i2d"),
		Instruction::L2I => simple!("l2i"),
		Instruction::L2F => simple!("l2f"),
		Instruction::L2D => simple!("l2d"),
		Instruction::F2I => simple!("f2i"),
		Instruction::F2L => simple!("f2l"),
		Instruction::F2D => simple!("f2d"),
		Instruction::D2I => simple!("d2i"),
		Instruction::D2L => simple!("d2l"),
		Instruction::D2F => simple!("d2f"),
		Instruction::I2B => simple!("i2b"),
		Instruction::I2C => simple!("i2c"),
		Instruction::I2S => simple!("i2s"),
		Instruction::LCmp => simple!("lcmp"),
		Instruction::FCmpL => simple!("fcmpl"),
		Instruction::FCmpG => simple!("fcmpg"),
		Instruction::DCmpL => simple!("dcmpl"),
		Instruction::DCmpG => simple!("dcmpg"),
		Instruction::IfEq(l) => branch!("ifeq", l),
		Instruction::IfNe(l) => branch!("ifne", l),
		Instruction::IfLt(l) => branch!("iflt", l),
		Instruction::IfGe(l) => branch!("ifge", l),
		Instruction::IfGt(l) => branch!("ifgt", l),
		Instruction::IfLe(l) => branch!("ifle", l),
		Instruction::IfICmpEq(l) => branch!("if_icmpeq", l),
		Instruction::IfICmpNe(l) => branch!("if_icmpne", l),
		Instruction::IfICmpLt(l) => branch!("if_icmplt", l),
		Instruction::IfICmpGe(l) => branch!("if_icmpge", l),
		Instruction::IfICmpGt(l) => branch!("if_icmpgt", l),
		Instruction::IfICmpLe(l) => branch!("if_icmple", l),
		Instruction::IfACmpEq(l) => branch!("if_acmpeq", l),
		Instruction::IfACmpNe(l) => branch!("if_acmpne", l),
		Instruction::Goto(l) => branch!("goto", l),
		Instruction::Jsr(l) => branch!("jsr", l),
		Instruction::Ret(i) => lv!("ret", i),
		Instruction::TableSwitch { default, low, high, table } => {
			let mut s = String::from("tableswitch {");
			for (offset, label) in table.iter().enumerate() {
				s.push_str(&format!(" case {}: {};", *low + offset as i32, labels.name(*label)?));
			}
			let _ = high;
			s.push_str(&format!(" default: {}; }}", labels.name(*default)?));
			Ok(s)
		}
		Instruction::LookupSwitch { default, pairs } => {
			let mut s = String::from("lookupswitch {");
			for (key, label) in pairs {
				s.push_str(&format!(" case {key}: {};", labels.name(*label)?));
			}
			s.push_str(&format!(" default: {}; }}", labels.name(*default)?));
			Ok(s)
		}
		Instruction::IReturn => simple!("ireturn"),
		Instruction::LReturn => simple!("lreturn"),
		Instruction::FReturn => simple!("freturn"),
		Instruction::DReturn => simple!("dreturn"),
		Instruction::AReturn => simple!("areturn"),
		Instruction::Return => simple!("return"),
		Instruction::GetStatic(f) => Ok(format!("getstatic {};", format_field_ref(f)?)),
		Instruction::PutStatic(f) => Ok(format!("putstatic {};", format_field_ref(f)?)),
		Instruction::GetField(f) => Ok(format!("getfield {};", format_field_ref(f)?)),
		Instruction::PutField(f) => Ok(format!("putfield {};", format_field_ref(f)?)),
		Instruction::InvokeVirtual(m) => Ok(format!("invokevirtual {};", format_method_ref(m)?)),
		Instruction::InvokeSpecial(m, is_interface) => {
			Ok(format!("invokespecial {}{};", if *is_interface { "interface " } else { "" }, format_method_ref(m)?))
		}
		Instruction::InvokeStatic(m, is_interface) => {
			Ok(format!("invokestatic {}{};", if *is_interface { "interface " } else { "" }, format_method_ref(m)?))
		}
		Instruction::InvokeInterface(m) => Ok(format!("invokeinterface {};", format_method_ref(m)?)),
		Instruction::InvokeDynamic(id) => Ok(format!("invokedynamic {};", format_invoke_dynamic(id)?)),
		Instruction::New(c) => Ok(format!("new {};", format_class_name(c))),
		Instruction::NewArray(ty) => Ok(format!("newarray {};", format_array_type_keyword(ty))),
		Instruction::ANewArray(c) => Ok(format!("anewarray {};", format_class_name_as_type(c))),
		Instruction::ArrayLength => simple!("arraylength"),
		Instruction::AThrow => simple!("athrow"),
		Instruction::CheckCast(c) => Ok(format!("checkcast {};", format_class_name_as_type(c))),
		Instruction::InstanceOf(c) => Ok(format!("instanceof {};", format_class_name_as_type(c))),
		Instruction::MonitorEnter => simple!("monitorenter"),
		Instruction::MonitorExit => simple!("monitorexit"),
		Instruction::MultiANewArray(c, dims) => Ok(format!("multianewarray {} {dims};", format_class_name_as_type(c))),
		Instruction::IfNull(l) => branch!("ifnull", l),
		Instruction::IfNonNull(l) => branch!("ifnonnull", l),
	}
}
