//! Keyword vocabularies shared between the parser and the printer, so that both sides agree on
//! the same spelling without duplicating string literals.

/// Generic access-flag modifier words, reused (with irrelevant ones ignored) across class,
/// field, method, parameter and module declarations.
///
/// `enum` is included here (in addition to being class-kind sugar, see [`ClassKind`]) so that a
/// field can be marked as an enum constant; the two uses don't conflict, since the class-kind
/// sugar is only recognised in the leading position of a `classDecl`.
pub(crate) const FLAG_WORDS: &[&str] = &[
	"public", "private", "protected", "static", "final", "super", "synchronized",
	"volatile", "transient", "bridge", "varargs", "native", "abstract", "strictfp",
	"synthetic", "mandated", "open", "transitive", "static_phase", "enum",
];

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct RawFlags {
	pub(crate) public: bool,
	pub(crate) private: bool,
	pub(crate) protected: bool,
	pub(crate) static_: bool,
	pub(crate) final_: bool,
	pub(crate) super_: bool,
	pub(crate) synchronized: bool,
	pub(crate) volatile: bool,
	pub(crate) transient: bool,
	pub(crate) bridge: bool,
	pub(crate) varargs: bool,
	pub(crate) native: bool,
	pub(crate) abstract_: bool,
	pub(crate) strictfp: bool,
	pub(crate) synthetic: bool,
	pub(crate) mandated: bool,
	pub(crate) open: bool,
	pub(crate) transitive: bool,
	pub(crate) static_phase: bool,
	pub(crate) enum_: bool,
	pub(crate) interface: bool,
	pub(crate) abstract_annotation: bool,
	pub(crate) module: bool,
}

impl RawFlags {
	pub(crate) fn set(&mut self, word: &str) -> bool {
		match word {
			"public" => self.public = true,
			"private" => self.private = true,
			"protected" => self.protected = true,
			"static" => self.static_ = true,
			"final" => self.final_ = true,
			"super" => self.super_ = true,
			"synchronized" => self.synchronized = true,
			"volatile" => self.volatile = true,
			"transient" => self.transient = true,
			"bridge" => self.bridge = true,
			"varargs" => self.varargs = true,
			"native" => self.native = true,
			"abstract" => self.abstract_ = true,
			"strictfp" => self.strictfp = true,
			"synthetic" => self.synthetic = true,
			"mandated" => self.mandated = true,
			"open" => self.open = true,
			"transitive" => self.transitive = true,
			"static_phase" => self.static_phase = true,
			"enum" => self.enum_ = true,
			_ => return false,
		}
		true
	}
}

/// The class-kind sugar words, recognised only in the leading position of a `classDecl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
	Class,
	Enum,
	Interface,
	Module,
	AnnotationInterface,
}

/// Keyword -> attribute kind dispatch table, see spec §6.
pub(crate) const ATTRIBUTE_KEYWORDS: &[&str] = &[
	"SourceFile", "SourceDir", "InnerClasses", "EnclosingMethod", "NestHost", "NestMembers",
	"Deprecated", "Synthetic", "Signature", "Code",
	"RuntimeVisibleAnnotations", "RuntimeInvisibleAnnotations",
	"RuntimeVisibleParameterAnnotations", "RuntimeInvisibleParameterAnnotations",
	"RuntimeVisibleTypeAnnotations", "RuntimeInvisibleTypeAnnotations",
	"AnnotationDefault", "Module", "ModuleMainClass", "ModulePackages",
];

pub(crate) const TARGET_INFO_KEYWORDS: &[&str] = &[
	"parameter_generic_class", "parameter_generic_method", "extends",
	"bound_generic_class", "bound_generic_method", "field", "return", "receiver",
	"parameter", "throws", "local_variable", "resource_variable", "catch",
	"instance_of", "new", "method_reference_new", "method_reference", "cast",
	"argument_generic_method_new", "argument_generic_method",
	"argument_generic_method_reference_new", "argument_generic_method_reference",
];

pub(crate) const TYPE_PATH_KEYWORDS: &[&str] = &["array", "inner_type", "wildcard", "type_argument"];

/// `StackMapTable` frame kinds (spec §6, JVMS 4.7.4), round-tripped verbatim when written
/// explicitly in the source rather than generated by a preverifier.
pub(crate) const FRAME_KIND_KEYWORDS: &[&str] = &["same", "same_locals_1_stack_item", "chop", "append", "full"];

pub(crate) const VERIFICATION_TYPE_KEYWORDS: &[&str] = &[
	"top", "integer", "float", "double", "long", "null", "uninitialized_this", "object", "uninitialized",
];

pub(crate) const REFERENCE_KIND_KEYWORDS: &[&str] = &[
	"getfield", "getstatic", "putfield", "putstatic",
	"invokevirtual", "invokestatic", "invokespecial", "newinvokespecial", "invokeinterface",
];
