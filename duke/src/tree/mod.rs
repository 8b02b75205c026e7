pub mod class;
pub mod field;
pub mod method;
pub mod attribute;
pub mod version;
pub mod module;
pub mod annotation;
pub mod descriptor;
pub mod record;
pub mod type_annotation;

mod names {
	use java_string::JavaStr;

	/// Checks if a class name is valid according to JVMS 4.2.1 (also accepting array class names).
	pub(super) fn is_valid_class_name(x: &JavaStr) -> bool {
		if x.starts_with('[') {
			// TODO: max 255 [ are allowed, and what follows must be a field descriptor
			true
		} else {
			// a list of identifiers split by /, each of which must be an unqualified name
			!x.is_empty() && x.split('/').all(is_valid_unqualified_name)
		}
	}

	/// Checks if a name is an unqualified name according to JVMS 4.2.2.
	///
	/// This is used for field names, formal parameter names, local variable names.
	pub(super) fn is_valid_unqualified_name(x: &JavaStr) -> bool {
		!x.is_empty() &&
			x.chars().all(|c| !matches!(c, '.' | ';' | '[' | '/'))
	}

	/// Checks if a method name is valid according to JVMS 4.2.2.
	pub(super) fn is_valid_method_name(x: &JavaStr) -> bool {
		x == "<init>" || x == "<clinit>" || (
			!x.is_empty() &&
				x.chars().all(|c| !matches!(c, '.' | ';' | '[' | '/' | '<' | '>'))
		)
	}

	#[cfg(test)]
	mod testing {
		use java_string::JavaStr;
		use crate::tree::names::*;

		fn j(s: &str) -> &JavaStr {
			JavaStr::from_str(s)
		}

		#[test]
		fn class_names() {
			assert!(is_valid_class_name(j("java/lang/Object")));
			assert!(is_valid_class_name(j("java/lang/Thread")));
			assert!(is_valid_class_name(j("[[[D")));
			assert!(is_valid_class_name(j("An$Inner$Class")));

			assert!(!is_valid_class_name(j(""))); // an empty class name is not valid
			assert!(!is_valid_class_name(j("/")));
			assert!(!is_valid_class_name(j("/a")));
			assert!(!is_valid_class_name(j("a/")));
			assert!(!is_valid_class_name(j("//a")));
			assert!(!is_valid_class_name(j("a//")));
			assert!(!is_valid_class_name(j("a.b")));
			assert!(!is_valid_class_name(j("a;b")));
			assert!(!is_valid_class_name(j("a[b")));
		}

		#[test]
		fn unqualified_names() {
			assert!(is_valid_unqualified_name(j("foo")));
			assert!(is_valid_unqualified_name(j("bar")));
			assert!(is_valid_unqualified_name(j("FOO")));
			assert!(is_valid_unqualified_name(j("1234567"))); // numbers are valid here, unlike java source
			assert!(is_valid_unqualified_name(j("---")));
			assert!(is_valid_unqualified_name(j("a$name")));

			assert!(!is_valid_unqualified_name(j("")));
			assert!(!is_valid_unqualified_name(j(".")));
			assert!(!is_valid_unqualified_name(j(";")));
			assert!(!is_valid_unqualified_name(j("[")));
			assert!(!is_valid_unqualified_name(j("/")));
		}

		#[test]
		fn method_names() {
			assert!(is_valid_method_name(j("foo")));
			assert!(is_valid_method_name(j("bar")));
			assert!(is_valid_method_name(j("<init>")));
			assert!(is_valid_method_name(j("<clinit>")));

			assert!(!is_valid_method_name(j("")));
			assert!(!is_valid_method_name(j(".")));
			assert!(!is_valid_method_name(j(";")));
			assert!(!is_valid_method_name(j("[")));
			assert!(!is_valid_method_name(j("/")));
			assert!(!is_valid_method_name(j("<NotClinit>")));
			assert!(!is_valid_method_name(j("<>")));
			assert!(!is_valid_method_name(j("<")));
			assert!(!is_valid_method_name(j(">")));
		}
	}
}
