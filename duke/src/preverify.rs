//! Stack-map-frame preverification hook (spec §4.11).
//!
//! Computing `StackMapTable` frames via control-flow data-flow analysis is out of scope for this
//! crate; what's in scope is the interface a caller plugs a preverifier into after assembly, and
//! a no-op default that leaves methods exactly as assembled.

use anyhow::Result;
use crate::tree::class::{ClassFile, ClassName};

/// A source of already-compiled library classes, consulted by a [`Preverifier`] to resolve the
/// supertypes and interfaces of the class being verified.
pub trait LibraryClasspath {
	/// Looks up a class by its internal name, returning its parsed form if this classpath has it.
	fn resolve(&self, name: &ClassName) -> Result<Option<ClassFile>>;
}

/// Attaches `StackMapTable` frames to a class's methods after assembly.
///
/// Only relevant for methods in classes targeting class file version 50 (Java 6) or later, and
/// only ever invoked when a library classpath was supplied to the caller; see the `cli` crate's
/// assembly path.
pub trait Preverifier {
	fn preverify(&self, class: &mut ClassFile, classpath: &dyn LibraryClasspath) -> Result<()>;
}

/// Computes nothing: a class assembled with this preverifier keeps whatever `StackMapTable`
/// frames its methods already had (from an explicit `frame` directive in the JBC source) and
/// gains no others, exactly as if no preverifier were configured at all.
pub struct NoopPreverifier;

impl Preverifier for NoopPreverifier {
	fn preverify(&self, _class: &mut ClassFile, _classpath: &dyn LibraryClasspath) -> Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use java_string::JavaString;
	use crate::tree::class::{ClassAccess, ClassFile};
	use crate::tree::version::Version;
	use super::*;

	struct EmptyClasspath;
	impl LibraryClasspath for EmptyClasspath {
		fn resolve(&self, _name: &ClassName) -> Result<Option<ClassFile>> {
			Ok(None)
		}
	}

	fn sample_class() -> ClassFile {
		ClassFile::new(
			Version::V1_8,
			ClassAccess { is_public: true, is_super: true, ..ClassAccess::default() },
			ClassName::new(JavaString::from("Foo")).unwrap(),
			Some(ClassName::JAVA_LANG_OBJECT.to_owned()),
			Vec::new(),
		)
	}

	#[test]
	fn noop_preverifier_leaves_class_untouched() {
		let original = sample_class();
		let mut class = sample_class();

		NoopPreverifier.preverify(&mut class, &EmptyClasspath).unwrap();

		assert_eq!(class, original);
	}
}
