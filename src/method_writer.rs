//! Emitting the bytecode of one method body.

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, trace};

use crate::BytesWrite;
use crate::class_constants::{opcode, attribute, MAX_CODE_LENGTH};
use crate::debug::{LineNumberTable, LocalVariableTable};
use crate::errors::CodegenError;
use crate::label::{Label, LabelInfo, LabelReference};
use crate::member::{parameter_slots, ClassName, ConstructorRef, FieldRef, MethodRef};
use crate::pool::ConstantPool;
use crate::stack::{StackState, StackTracker};

/// The finished binary `Code` attribute of one method.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
	pub max_stack: u16,
	/// Needed by the caller to number parameter and local slots consistently
	/// across methods.
	pub max_locals: u16,
	/// The attribute content: `max_stack`, `max_locals`, code length, code,
	/// the empty exception table and the enabled debug sub-attributes.
	pub bytes: Vec<u8>,
}

/// Assembles the byte code in the body of one method.
///
/// One writer is driven by exactly one caller for the lifetime of one method
/// body. The writer tracks the operand stack depth for every instruction it
/// emits; after an unconditional control transfer the depth is unknown and
/// all emission is skipped until a label mark fixes the depth again.
///
/// Branch targets are [`Label`]s created through [`create_label`]; jumps to a
/// label may be emitted before it is positioned, the placeholders are patched
/// during [`finish`].
///
/// [`create_label`]: MethodWriter::create_label
/// [`finish`]: MethodWriter::finish
pub struct MethodWriter<'a, P> {
	pool: &'a mut P,

	/// The raw instruction bytes emitted so far.
	code: Vec<u8>,

	stack: StackTracker,

	/// Arena of label records; a [`Label`] is an index into this.
	labels: Vec<LabelInfo>,
	/// Placeholder positions to patch once all labels are marked.
	label_references: Vec<LabelReference>,

	is_instance_method: bool,
	/// Number of local variable slots, including parameters and the receiver.
	///
	/// Kept as `u32` so that growing past the `u16` limit is representable
	/// and can be rejected.
	num_locals: u32,

	line_number_table: Option<LineNumberTable>,
	local_variable_table: Option<LocalVariableTable>,
}

impl<'a, P: ConstantPool> MethodWriter<'a, P> {
	pub fn new(pool: &'a mut P, is_instance_method: bool, parameter_count: u16) -> MethodWriter<'a, P> {
		MethodWriter {
			pool,
			code: Vec::new(),
			stack: StackTracker::new(),
			labels: Vec::new(),
			label_references: Vec::new(),
			is_instance_method,
			num_locals: parameter_count as u32 + if is_instance_method { 1 } else { 0 },
			line_number_table: None,
			local_variable_table: None,
		}
	}

	/// Creates a fresh, unpositioned label for this method body.
	pub fn create_label(&mut self) -> Result<Label> {
		let id = u16::try_from(self.labels.len())
			.context("too many labels in one method body")?;
		self.labels.push(LabelInfo::new());
		Ok(Label { id })
	}

	fn label_info_mut(labels: &mut [LabelInfo], label: Label) -> Result<&mut LabelInfo> {
		labels.get_mut(label.id as usize)
			.ok_or_else(|| anyhow!("label {} does not belong to this method writer", label.id))
	}

	/// True while the current emission point can only be reached through an
	/// unconditional control transfer whose successor has not been fixed yet.
	fn in_dead_code(&self) -> bool {
		self.stack.is_unreachable()
	}

	fn reachable_depth(&self) -> Result<u16> {
		match self.stack.state() {
			StackState::Reachable(depth) => Ok(depth),
			StackState::Unreachable => bail!("no stack depth in unreachable code"),
		}
	}

	fn check_local_count(&mut self, index: u16) -> Result<()> {
		let required = index as u32 + 1;
		if required > self.num_locals {
			if required > u16::MAX as u32 {
				bail!(CodegenError::LocalLimitExceeded);
			}
			self.num_locals = required;
		}
		Ok(())
	}

	/// Emits a 2- or 4-byte placeholder for `label` and records the patch.
	///
	/// The first reachable reference fixes the stack depth the label demands;
	/// every later reference must agree.
	fn emit_label_reference(&mut self, label: Label, base_position: usize, wide: bool) -> Result<()> {
		let depth = self.reachable_depth()?;
		let info = Self::label_info_mut(&mut self.labels, label)?;

		if !info.allows_backward_jump {
			bail!(CodegenError::BackwardJumpToForwardOnlyLabel);
		}
		match info.expected_stack_depth {
			None => info.expected_stack_depth = Some(depth),
			Some(expected) if expected != depth => {
				bail!(CodegenError::InconsistentStackAtLabel { expected, actual: depth });
			}
			Some(_) => {}
		}

		let source_offset = self.code.len();
		if wide {
			self.code.write_i32(0)?;
		} else {
			self.code.write_u16(0)?;
		}
		self.label_references.push(LabelReference {
			source_offset,
			base_position,
			target: label,
			wide,
		});
		Ok(())
	}

	fn emit_jump(&mut self, jump_opcode: u8, label: Label) -> Result<()> {
		let base_position = self.code.len();
		self.code.write_u8(jump_opcode)?;
		self.emit_label_reference(label, base_position, false)
	}

	fn emit_ldc(&mut self, constant_index: u16) -> Result<()> {
		if let Ok(index) = u8::try_from(constant_index) {
			self.code.write_u8(opcode::LDC)?;
			self.code.write_u8(index)
		} else {
			self.code.write_u8(opcode::LDC_W)?;
			self.code.write_u16(constant_index)
		}
	}

	/// Emits a load/store of a local variable slot, choosing among the
	/// compact (`aload_0` style), one-byte-index and `wide` forms.
	fn emit_local_op(&mut self, base_opcode: u8, compact_base: u8, index: u16) -> Result<()> {
		if index < 4 {
			self.code.write_u8(compact_base + index as u8)
		} else if index <= 255 {
			self.code.write_u8(base_opcode)?;
			self.code.write_u8(index as u8)
		} else {
			self.code.write_u8(opcode::WIDE)?;
			self.code.write_u8(base_opcode)?;
			self.code.write_u16(index)
		}
	}

	/// Pushes a constant integer.
	///
	/// Stack: `..` => `.., value`
	pub fn load_integer_constant(&mut self, value: i32) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		// iconst_m1 through iconst_5 are contiguous opcodes
		let compact = opcode::ICONST_0 as i32 + value;
		if ((opcode::ICONST_M1 as i32)..=(opcode::ICONST_5 as i32)).contains(&compact) {
			self.code.write_u8(compact as u8)
		} else if let Ok(value) = i8::try_from(value) {
			self.code.write_u8(opcode::BIPUSH)?;
			self.code.write_i8(value)
		} else {
			let index = self.pool.put_integer(value)?;
			self.emit_ldc(index)
		}
	}

	/// Pushes a constant string, or the null reference for `None`.
	///
	/// Stack: `..` => `.., value`
	pub fn load_string_constant(&mut self, value: Option<&str>) -> Result<()> {
		let Some(value) = value else {
			return self.load_null();
		};
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		let index = self.pool.put_string(value)?;
		self.emit_ldc(index)
	}

	/// Pushes a constant double (two stack slots).
	///
	/// Stack: `..` => `.., value`
	pub fn load_double_constant(&mut self, value: f64) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 2)?;
		if value == 0.0 {
			self.code.write_u8(opcode::DCONST_0)
		} else if value == 1.0 {
			self.code.write_u8(opcode::DCONST_1)
		} else {
			self.code.write_u8(opcode::LDC2_W)?;
			let index = self.pool.put_double(value)?;
			self.code.write_u16(index)
		}
	}

	/// Pushes a constant long (two stack slots).
	///
	/// Stack: `..` => `.., value`
	pub fn load_long_constant(&mut self, value: i64) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 2)?;
		if value == 0 {
			self.code.write_u8(opcode::LCONST_0)
		} else if value == 1 {
			self.code.write_u8(opcode::LCONST_1)
		} else {
			self.code.write_u8(opcode::LDC2_W)?;
			let index = self.pool.put_long(value)?;
			self.code.write_u16(index)
		}
	}

	/// Pushes the null reference.
	///
	/// Stack: `..` => `.., null`
	pub fn load_null(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		self.code.write_u8(opcode::ACONST_NULL)
	}

	/// Pushes the receiver; only valid in instance methods.
	///
	/// Stack: `..` => `.., this`
	pub fn load_this(&mut self) -> Result<()> {
		if !self.is_instance_method {
			bail!("cannot load 'this' in a static method");
		}
		self.load_variable(0)
	}

	/// Pushes the reference held by a local variable slot.
	///
	/// Stack: `..` => `.., value`
	pub fn load_variable(&mut self, index: u16) -> Result<()> {
		self.check_local_count(index)?;
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		self.emit_local_op(opcode::ALOAD, opcode::ALOAD_0, index)
	}

	/// Pushes the int held by a local variable slot.
	///
	/// Stack: `..` => `.., value`
	pub fn load_int_variable(&mut self, index: u16) -> Result<()> {
		self.check_local_count(index)?;
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		self.emit_local_op(opcode::ILOAD, opcode::ILOAD_0, index)
	}

	/// Stores the top reference into a local variable slot.
	///
	/// Stack: `.., value` => `..`
	pub fn store_variable(&mut self, index: u16) -> Result<()> {
		self.check_local_count(index)?;
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.emit_local_op(opcode::ASTORE, opcode::ASTORE_0, index)
	}

	/// Stores the top int into a local variable slot.
	///
	/// Stack: `.., value` => `..`
	pub fn store_int_variable(&mut self, index: u16) -> Result<()> {
		self.check_local_count(index)?;
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.emit_local_op(opcode::ISTORE, opcode::ISTORE_0, index)
	}

	/// Increments an int variable by a constant, without touching the stack.
	///
	/// Stack: `..` => `..`
	pub fn inc_variable(&mut self, index: u16, amount: i16) -> Result<()> {
		self.check_local_count(index)?;
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 0)?;
		match (u8::try_from(index), i8::try_from(amount)) {
			(Ok(index), Ok(amount)) => {
				self.code.write_u8(opcode::IINC)?;
				self.code.write_u8(index)?;
				self.code.write_i8(amount)
			}
			_ => {
				self.code.write_u8(opcode::WIDE)?;
				self.code.write_u8(opcode::IINC)?;
				self.code.write_u16(index)?;
				self.code.write_i16(amount)
			}
		}
	}

	pub fn nop(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.code.write_u8(opcode::NOP)
	}

	/// Discards the top value.
	///
	/// Stack: `.., x` => `..`
	pub fn pop(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.code.write_u8(opcode::POP)
	}

	/// Duplicates the top value.
	///
	/// Stack: `.., x` => `.., x, x`
	pub fn dup(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 2)?;
		self.code.write_u8(opcode::DUP)
	}

	/// Duplicates the top two values.
	///
	/// Stack: `.., y, x` => `.., y, x, y, x`
	pub fn dup2(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(2, 4)?;
		self.code.write_u8(opcode::DUP2)
	}

	/// Duplicates the top value below the second one.
	///
	/// Stack: `.., y, x` => `.., x, y, x`
	pub fn dup_x1(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(2, 3)?;
		self.code.write_u8(opcode::DUP_X1)
	}

	/// Duplicates the top value below the third one.
	///
	/// Stack: `.., z, y, x` => `.., x, z, y, x`
	pub fn dup_x2(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(3, 4)?;
		self.code.write_u8(opcode::DUP_X2)
	}

	/// Duplicates the top two values below the third one.
	///
	/// Stack: `.., z, y, x` => `.., y, x, z, y, x`
	pub fn dup2_x1(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(3, 5)?;
		self.code.write_u8(opcode::DUP2_X1)
	}

	/// Swaps the top two values.
	///
	/// Stack: `.., x, y` => `.., y, x`
	pub fn swap(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(2, 2)?;
		self.code.write_u8(opcode::SWAP)
	}

	/// Unconditional jump; the code that follows is unreachable until a label
	/// is marked.
	pub fn jump(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.emit_jump(opcode::GOTO, label)?;
		self.stack.make_unreachable();
		Ok(())
	}

	/// Jumps if the top int is zero.
	///
	/// Stack: `.., int` => `..`
	pub fn jump_if_zero(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.emit_jump(opcode::IFEQ, label)
	}

	/// Jumps if the top int is not zero.
	///
	/// Stack: `.., int` => `..`
	pub fn jump_if_non_zero(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.emit_jump(opcode::IFNE, label)
	}

	/// Jumps if the top reference is null.
	///
	/// Stack: `.., objectref` => `..`
	pub fn jump_if_null(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.emit_jump(opcode::IFNULL, label)
	}

	/// Jumps if the top reference is not null.
	///
	/// Stack: `.., objectref` => `..`
	pub fn jump_if_non_null(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.emit_jump(opcode::IFNONNULL, label)
	}

	/// Jumps if the top two references point to the same object.
	///
	/// Stack: `.., obj1, obj2` => `..`
	pub fn jump_if_reference_equal(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(2, 0)?;
		self.emit_jump(opcode::IF_ACMPEQ, label)
	}

	/// Jumps if the top two references point to different objects.
	///
	/// Stack: `.., obj1, obj2` => `..`
	pub fn jump_if_reference_not_equal(&mut self, label: Label) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(2, 0)?;
		self.emit_jump(opcode::IF_ACMPNE, label)
	}

	/// Emits a multi-way switch on the top int.
	///
	/// `case_values` must be strictly ascending and line up with `targets`.
	/// A `tableswitch` is emitted when the value range is contiguous, a
	/// `lookupswitch` otherwise; both align their payload to a four-byte
	/// boundary from the start of the method body.
	///
	/// Stack: `.., int` => `..`
	pub fn lookup_switch(&mut self, case_values: &[i32], targets: &[Label], default: Label) -> Result<()> {
		if case_values.len() != targets.len() {
			bail!(CodegenError::InvalidSwitchTable { reason: "case values and targets differ in length" });
		}
		if case_values.is_empty() {
			bail!(CodegenError::InvalidSwitchTable { reason: "empty switch" });
		}
		if !case_values.windows(2).all(|pair| pair[0] < pair[1]) {
			bail!(CodegenError::InvalidSwitchTable { reason: "case values must be strictly ascending without duplicates" });
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;

		let base_position = self.code.len();
		let low = case_values[0];
		let high = case_values[case_values.len() - 1];
		// i64: the range of an ascending i32 sequence can overflow i32
		let contiguous = low as i64 + case_values.len() as i64 - 1 == high as i64;

		if contiguous {
			self.code.write_u8(opcode::TABLESWITCH)?;
			while self.code.len() % 4 != 0 {
				self.code.write_u8(0)?;
			}
			self.emit_label_reference(default, base_position, true)?;
			self.code.write_i32(low)?;
			self.code.write_i32(high)?;
			for &target in targets {
				self.emit_label_reference(target, base_position, true)?;
			}
		} else {
			self.code.write_u8(opcode::LOOKUPSWITCH)?;
			while self.code.len() % 4 != 0 {
				self.code.write_u8(0)?;
			}
			self.emit_label_reference(default, base_position, true)?;
			self.code.write_i32(i32::try_from(case_values.len()).context("too many switch cases")?)?;
			for (&value, &target) in case_values.iter().zip(targets) {
				self.code.write_i32(value)?;
				self.emit_label_reference(target, base_position, true)?;
			}
		}
		self.stack.make_unreachable();
		Ok(())
	}

	/// Fixes `label` to the current position; only forward jumps to it are
	/// permitted, so all references must already have been emitted.
	///
	/// If the current position is unreachable, the stack depth promised to
	/// the label's jump sites is adopted; otherwise the current depth must
	/// agree with that promise.
	pub fn mark_forward_jumps_only(&mut self, label: Label) -> Result<()> {
		let position = self.code.len();
		let state = self.stack.state();
		let info = Self::label_info_mut(&mut self.labels, label)?;
		if info.marked_position.is_some() {
			bail!(CodegenError::DoubleMarkOfLabel);
		}
		info.marked_position = Some(position);
		info.allows_backward_jump = false;

		match (state, info.expected_stack_depth) {
			(StackState::Unreachable, Some(depth)) => self.stack.restore(depth),
			// no reachable jump site yet, the code here stays unreachable
			(StackState::Unreachable, None) => {}
			(StackState::Reachable(depth), None) => info.expected_stack_depth = Some(depth),
			(StackState::Reachable(actual), Some(expected)) => {
				if actual != expected {
					bail!(CodegenError::InconsistentStackAtLabel { expected, actual });
				}
			}
		}
		Ok(())
	}

	/// Fixes `label` to the current position, permitting both forward and
	/// backward jumps.
	///
	/// Merging stack depth across an arbitrary edge set is only sound when
	/// the merge point's stack is empty, so both the current depth and the
	/// depth promised to jump sites must be zero.
	pub fn mark(&mut self, label: Label) -> Result<()> {
		let position = self.code.len();
		let state = self.stack.state();
		let info = Self::label_info_mut(&mut self.labels, label)?;
		if info.marked_position.is_some() {
			bail!(CodegenError::DoubleMarkOfLabel);
		}
		if let StackState::Reachable(actual) = state {
			if actual > 0 {
				bail!(CodegenError::InconsistentStackAtLabel { expected: 0, actual });
			}
		}
		if let Some(expected) = info.expected_stack_depth {
			if expected > 0 {
				bail!(CodegenError::InconsistentStackAtLabel { expected, actual: 0 });
			}
		}
		info.marked_position = Some(position);
		info.expected_stack_depth = Some(0);
		self.stack.restore(0);
		Ok(())
	}

	/// Returns from a method without a return value.
	pub fn return_from_procedure(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.code.write_u8(opcode::RETURN)?;
		self.stack.make_unreachable();
		Ok(())
	}

	/// Returns the top int from the method.
	///
	/// Stack: `.., returnvalue` => (empty)
	pub fn return_int_from_function(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.code.write_u8(opcode::IRETURN)?;
		self.stack.make_unreachable();
		Ok(())
	}

	/// Returns the top reference from the method.
	///
	/// Stack: `.., returnvalue` => (empty)
	pub fn return_object_from_function(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.code.write_u8(opcode::ARETURN)?;
		self.stack.make_unreachable();
		Ok(())
	}

	/// Reads an instance field.
	///
	/// Stack: `.., objectref` => `.., value`
	pub fn load_instance_field(&mut self, field: &FieldRef) -> Result<()> {
		if field.is_static {
			bail!(CodegenError::MemberKindMismatch("expected an instance field, found a static field"));
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 1)?;
		self.code.write_u8(opcode::GETFIELD)?;
		let index = self.pool.put_field_ref(field)?;
		self.code.write_u16(index)
	}

	/// Writes an instance field.
	///
	/// Stack: `.., objectref, value` => `..`
	pub fn store_instance_field(&mut self, field: &FieldRef) -> Result<()> {
		if field.is_static {
			bail!(CodegenError::MemberKindMismatch("expected an instance field, found a static field"));
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(2, 0)?;
		self.code.write_u8(opcode::PUTFIELD)?;
		let index = self.pool.put_field_ref(field)?;
		self.code.write_u16(index)
	}

	/// Reads a static field.
	///
	/// Stack: `..` => `.., value`
	pub fn load_static_field(&mut self, field: &FieldRef) -> Result<()> {
		if !field.is_static {
			bail!(CodegenError::MemberKindMismatch("expected a static field, found an instance field"));
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		self.code.write_u8(opcode::GETSTATIC)?;
		let index = self.pool.put_field_ref(field)?;
		self.code.write_u16(index)
	}

	/// Writes a static field.
	///
	/// Stack: `.., value` => `..`
	pub fn store_static_field(&mut self, field: &FieldRef) -> Result<()> {
		if !field.is_static {
			bail!(CodegenError::MemberKindMismatch("expected a static field, found an instance field"));
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 0)?;
		self.code.write_u8(opcode::PUTSTATIC)?;
		let index = self.pool.put_field_ref(field)?;
		self.code.write_u16(index)
	}

	/// Calls an instance method.
	///
	/// Stack: `.., objectref[, parameter1, parameter2]` => `..[, returnvalue]`
	pub fn invoke_instance(&mut self, method: &MethodRef) -> Result<()> {
		if method.is_static {
			bail!(CodegenError::MemberKindMismatch("cannot use invoke_instance for a static method"));
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1 + parameter_slots(&method.parameters), method.return_category.slots())?;
		self.code.write_u8(opcode::INVOKEVIRTUAL)?;
		let index = self.pool.put_method_ref(method)?;
		self.code.write_u16(index)
	}

	/// Calls a static method.
	///
	/// Stack: `..[, parameter1, parameter2]` => `..[, returnvalue]`
	pub fn invoke_static(&mut self, method: &MethodRef) -> Result<()> {
		if !method.is_static {
			bail!(CodegenError::MemberKindMismatch("cannot use invoke_static for an instance method"));
		}
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(parameter_slots(&method.parameters), method.return_category.slots())?;
		self.code.write_u8(opcode::INVOKESTATIC)?;
		let index = self.pool.put_method_ref(method)?;
		self.code.write_u16(index)
	}

	/// Allocates an object without running a constructor.
	///
	/// Stack: `..` => `.., objectref`
	pub fn new_object(&mut self, class: &ClassName) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(0, 1)?;
		self.code.write_u8(opcode::NEW)?;
		let index = self.pool.put_class(class)?;
		self.code.write_u16(index)
	}

	/// Runs a constructor on a freshly allocated object.
	///
	/// Stack: `.., objectref[, parameter1, parameter2]` => `..`
	pub fn invoke_constructor(&mut self, constructor: &ConstructorRef) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1 + parameter_slots(&constructor.parameters), 0)?;
		self.code.write_u8(opcode::INVOKESPECIAL)?;
		let index = self.pool.put_constructor_ref(constructor)?;
		self.code.write_u16(index)
	}

	/// Creates a new array of references.
	///
	/// Stack: `.., size` => `.., arrayref`
	pub fn new_array(&mut self, element_class: &ClassName) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 1)?;
		self.code.write_u8(opcode::ANEWARRAY)?;
		let index = self.pool.put_class(element_class)?;
		self.code.write_u16(index)
	}

	/// Stores a reference into an array.
	///
	/// Stack: `.., arrayref, index, value` => `..`
	pub fn store_object_to_array(&mut self) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(3, 0)?;
		self.code.write_u8(opcode::AASTORE)
	}

	/// Checked cast of the top reference.
	///
	/// Stack: `.., objectref` => `.., objectref`
	pub fn check_cast(&mut self, class: &ClassName) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 1)?;
		self.code.write_u8(opcode::CHECKCAST)?;
		let index = self.pool.put_class(class)?;
		self.code.write_u16(index)
	}

	/// Type test of the top reference, pushing an int.
	///
	/// Stack: `.., objectref` => `.., int`
	pub fn instance_of(&mut self, class: &ClassName) -> Result<()> {
		if self.in_dead_code() {
			return Ok(());
		}
		self.stack.pop_push(1, 1)?;
		self.code.write_u8(opcode::INSTANCEOF)?;
		let index = self.pool.put_class(class)?;
		self.code.write_u16(index)
	}

	/// Enables the `LineNumberTable` attribute, so that later
	/// [`sequence_point`][Self::sequence_point] calls are recorded.
	pub fn enable_line_number_table(&mut self) -> Result<()> {
		if self.line_number_table.is_some() {
			bail!("line number table is already enabled");
		}
		let name_index = self.pool.put_utf8(attribute::LINE_NUMBER_TABLE)?;
		self.line_number_table = Some(LineNumberTable::new(name_index));
		Ok(())
	}

	/// Records the start of a statement.
	///
	/// Statement boundaries occur at empty-stack points; a sequence point
	/// with values on the operand stack is a lowering bug.
	pub fn sequence_point(&mut self, line_number: u16) -> Result<()> {
		if let StackState::Reachable(depth) = self.stack.state() {
			if depth > 0 {
				bail!(CodegenError::InvalidSequencePoint { depth });
			}
		}
		if let Some(table) = &mut self.line_number_table {
			let start_pc = u16::try_from(self.code.len())
				.map_err(|_| CodegenError::CodeSizeLimitExceeded { length: self.code.len() })?;
			table.add_entry(start_pc, line_number);
		}
		Ok(())
	}

	/// Names a local variable slot in the `LocalVariableTable` attribute, for
	/// debuggers. The table is created on the first call.
	pub fn define_local_variable(&mut self, index: u16, name: &str, descriptor: &str) -> Result<()> {
		if self.local_variable_table.is_none() {
			let name_index = self.pool.put_utf8(attribute::LOCAL_VARIABLE_TABLE)?;
			self.local_variable_table = Some(LocalVariableTable::new(name_index));
		}
		let name_index = self.pool.put_utf8(name)?;
		let descriptor_index = self.pool.put_utf8(descriptor)?;
		if let Some(table) = &mut self.local_variable_table {
			table.add_entry(index, name_index, descriptor_index);
		}
		Ok(())
	}

	/// Patches all label placeholders with the resolved branch offsets.
	fn resolve_labels(&mut self) -> Result<()> {
		trace!("resolving {} label references", self.label_references.len());
		for reference in self.label_references.drain(..) {
			let info = self.labels.get(reference.target.id as usize)
				.ok_or_else(|| anyhow!("label {} does not belong to this method writer", reference.target.id))?;
			let Some(marked_position) = info.marked_position else {
				bail!(CodegenError::UnresolvedLabel);
			};

			// positions are bounded by the buffer length, so this fits an i32
			let offset = marked_position as i32 - reference.base_position as i32;
			let patch = &mut self.code[reference.source_offset..];
			if reference.wide {
				patch[..4].copy_from_slice(&offset.to_be_bytes());
			} else {
				let Ok(offset) = i16::try_from(offset) else {
					bail!(CodegenError::BranchOutOfRange { offset });
				};
				patch[..2].copy_from_slice(&offset.to_be_bytes());
			}
		}
		Ok(())
	}

	/// Finishes the method body: resolves all branch targets, checks the code
	/// length limit and serializes the `Code` attribute content.
	///
	/// Consumes the writer; nothing can be emitted afterwards.
	pub fn finish(mut self) -> Result<CodeAttribute> {
		self.resolve_labels()?;

		let code_length = self.code.len();
		if code_length > MAX_CODE_LENGTH {
			bail!(CodegenError::CodeSizeLimitExceeded { length: code_length });
		}
		let code_length = code_length as u16;

		let max_stack = self.stack.max_depth();
		let max_locals = u16::try_from(self.num_locals)
			.map_err(|_| CodegenError::LocalLimitExceeded)?;

		let mut bytes = Vec::with_capacity(12 + self.code.len());
		bytes.write_u16(max_stack)?;
		bytes.write_u16(max_locals)?;
		bytes.write_u32(code_length as u32)?;
		bytes.write_u8_slice(&self.code)?;
		bytes.write_u16(0)?; // exception_table_length

		let attribute_count =
			self.line_number_table.is_some() as u16 + self.local_variable_table.is_some() as u16;
		bytes.write_u16(attribute_count)?;
		if let Some(table) = &self.line_number_table {
			let payload = table.to_bytes()?;
			bytes.write_u16(table.attribute_name_index)?;
			bytes.write_u32(u32::try_from(payload.len())?)?;
			bytes.write_u8_slice(&payload)?;
		}
		if let Some(table) = &self.local_variable_table {
			let payload = table.to_bytes(code_length)?;
			bytes.write_u16(table.attribute_name_index)?;
			bytes.write_u32(u32::try_from(payload.len())?)?;
			bytes.write_u8_slice(&payload)?;
		}

		debug!("assembled method body: {code_length} bytes of code, max_stack={max_stack}, max_locals={max_locals}");
		Ok(CodeAttribute { max_stack, max_locals, bytes })
	}
}
