//! Pre-resolved references to classes and their members.
//!
//! The lowering layer resolves everything it wants to touch ahead of time and
//! hands these value objects to the [`MethodWriter`][crate::MethodWriter];
//! the assembler never inspects a live type system. The operand-stack effect
//! of a call is fully determined by the [`ValueCategory`] of each parameter
//! and of the return value.

/// A binary class name in internal form, e.g. `java/lang/Object`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassName(pub String);

impl ClassName {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ClassName {
	fn from(value: &str) -> ClassName {
		ClassName(value.to_owned())
	}
}

/// How many operand stack slots a value of some type occupies.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueCategory {
	/// No value at all; only valid as a return category.
	Void,
	/// `int`, references and everything else that takes one slot.
	Single,
	/// `long` and `double` take two slots.
	Wide,
}

impl ValueCategory {
	pub(crate) fn slots(self) -> u16 {
		match self {
			ValueCategory::Void => 0,
			ValueCategory::Single => 1,
			ValueCategory::Wide => 2,
		}
	}
}

/// Sums the stack slots of a parameter list.
pub(crate) fn parameter_slots(parameters: &[ValueCategory]) -> u16 {
	parameters.iter().map(|category| category.slots()).sum()
}

/// A resolved field reference.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FieldRef {
	pub class: ClassName,
	pub name: String,
	/// Field descriptor, e.g. `Ljava/lang/Object;`.
	pub desc: String,
	pub is_static: bool,
}

/// A resolved method reference.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct MethodRef {
	pub class: ClassName,
	pub name: String,
	/// Method descriptor, e.g. `(Ljava/lang/Object;)V`.
	pub desc: String,
	pub parameters: Vec<ValueCategory>,
	pub return_category: ValueCategory,
	pub is_static: bool,
}

/// A resolved constructor reference.
///
/// Constructors are always instance members and never return a value, so only
/// the parameter list is needed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ConstructorRef {
	pub class: ClassName,
	/// Method descriptor of the `<init>` method, e.g. `()V`.
	pub desc: String,
	pub parameters: Vec<ValueCategory>,
}
