//! Branch targets and the patch records that point at them.

/// A branch target inside one method body.
///
/// A label is an opaque handle into the arena of the [`MethodWriter`] that
/// created it; using it with any other writer is a caller bug. It starts out
/// unpositioned, can be referenced by jumps, and is fixed to a bytecode
/// offset by [`MethodWriter::mark`] or [`MethodWriter::mark_forward_jumps_only`]
/// (at most once).
///
/// [`MethodWriter`]: crate::MethodWriter
/// [`MethodWriter::mark`]: crate::MethodWriter::mark
/// [`MethodWriter::mark_forward_jumps_only`]: crate::MethodWriter::mark_forward_jumps_only
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Label {
	pub(crate) id: u16,
}

/// The authoritative record behind a [`Label`] handle.
#[derive(Debug)]
pub(crate) struct LabelInfo {
	/// Bytecode offset this label was marked at, once it is marked.
	pub(crate) marked_position: Option<usize>,
	/// Operand stack depth every jump to this label must arrive with.
	///
	/// Fixed by the first reachable reference or by the mark, whichever comes
	/// first.
	pub(crate) expected_stack_depth: Option<u16>,
	/// Backward jumps are only permitted while this is true; marking via
	/// `mark_forward_jumps_only` clears it.
	pub(crate) allows_backward_jump: bool,
}

impl LabelInfo {
	pub(crate) fn new() -> LabelInfo {
		LabelInfo {
			marked_position: None,
			expected_stack_depth: None,
			allows_backward_jump: true,
		}
	}
}

/// A placeholder in the instruction buffer that must be patched with the
/// branch offset to a label once that label's position is known.
#[derive(Debug)]
pub(crate) struct LabelReference {
	/// Position of the 2- or 4-byte placeholder in the buffer.
	pub(crate) source_offset: usize,
	/// Offsets are relative to the opcode owning the reference.
	pub(crate) base_position: usize,
	pub(crate) target: Label,
	/// 4-byte offset (switch targets) instead of the 2-byte one.
	pub(crate) wide: bool,
}
