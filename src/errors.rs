//! Failure conditions of the method assembler.
//!
//! Every variant is an invariant violation in the code generator driving the
//! [`MethodWriter`][crate::MethodWriter], or an input program that exceeds a
//! hard limit of the class file format. None of them are recoverable within
//! the current method body; compilation of the enclosing module aborts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
	/// An instruction popped more values than the operand stack held.
	#[error("operand stack underflow")]
	StackUnderflow,

	/// The operand stack grew beyond what `max_stack` can declare.
	#[error("operand stack depth exceeds the encodable limit")]
	StackLimitExceeded,

	/// Two paths reach the same label with different stack depths.
	#[error("stack depth {actual} at label, but a jump to it expects depth {expected}")]
	InconsistentStackAtLabel {
		expected: u16,
		actual: u16,
	},

	/// A 16-bit branch target ended up further away than an `i16` can express.
	#[error("branch offset {offset} does not fit in a signed 16-bit field")]
	BranchOutOfRange {
		offset: i32,
	},

	/// A label was referenced by a jump but never marked.
	#[error("cannot resolve label: it was referenced but never marked")]
	UnresolvedLabel,

	/// Switch case values were not strictly ascending, or the values and
	/// targets did not line up.
	#[error("invalid switch table: {reason}")]
	InvalidSwitchTable {
		reason: &'static str,
	},

	/// A sequence point was recorded while values were on the operand stack.
	#[error("sequence point with non-empty operand stack (depth {depth})")]
	InvalidSequencePoint {
		depth: u16,
	},

	/// A static member was used with an instance operation or vice versa.
	#[error("{0}")]
	MemberKindMismatch(&'static str),

	/// The method body grew beyond the representable code length.
	#[error("method body of {length} bytes exceeds the code length limit")]
	CodeSizeLimitExceeded {
		length: usize,
	},

	/// More local variable slots were referenced than `max_locals` can declare.
	#[error("too many local variable slots")]
	LocalLimitExceeded,

	/// The same label was used to mark two positions.
	#[error("label was already used to mark a position")]
	DoubleMarkOfLabel,

	/// A jump backwards to a label that only permits forward jumps.
	#[error("backward jump to a forward-only label")]
	BackwardJumpToForwardOnlyLabel,
}
