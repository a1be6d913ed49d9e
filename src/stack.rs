//! Operand stack depth tracking.

use anyhow::{bail, Result};

use crate::class_constants::MAX_STACK_DEPTH;
use crate::errors::CodegenError;

/// The tracked operand stack depth at the current emission point.
///
/// Code directly after an unconditional control transfer is [`Unreachable`]:
/// its depth is only determined once a label targeting that point is marked.
///
/// [`Unreachable`]: StackState::Unreachable
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum StackState {
	Reachable(u16),
	Unreachable,
}

/// Tracks the running operand stack depth and its high-water mark.
#[derive(Debug)]
pub(crate) struct StackTracker {
	state: StackState,
	max_depth: u16,
}

impl StackTracker {
	pub(crate) fn new() -> StackTracker {
		StackTracker {
			state: StackState::Reachable(0),
			max_depth: 0,
		}
	}

	pub(crate) fn state(&self) -> StackState {
		self.state
	}

	pub(crate) fn is_unreachable(&self) -> bool {
		self.state == StackState::Unreachable
	}

	/// The highest depth observed so far; becomes the `max_stack` field.
	pub(crate) fn max_depth(&self) -> u16 {
		self.max_depth
	}

	/// Applies the static stack effect of one instruction.
	///
	/// Callers check reachability before emitting any bytes, so this is never
	/// called in the unreachable state.
	pub(crate) fn pop_push(&mut self, pop: u16, push: u16) -> Result<()> {
		let StackState::Reachable(depth) = self.state else {
			bail!("stack effect applied to unreachable code");
		};

		let Some(depth) = depth.checked_sub(pop) else {
			bail!(CodegenError::StackUnderflow);
		};
		let depth = depth.checked_add(push)
			.filter(|&depth| depth <= MAX_STACK_DEPTH);
		let Some(depth) = depth else {
			bail!(CodegenError::StackLimitExceeded);
		};

		self.state = StackState::Reachable(depth);
		self.max_depth = self.max_depth.max(depth);
		Ok(())
	}

	/// Enters the unreachable state, directly after an unconditional control
	/// transfer.
	pub(crate) fn make_unreachable(&mut self) {
		self.state = StackState::Unreachable;
	}

	/// Restores reachability at the given depth, when a label mark fixes the
	/// depth of the instruction stream again.
	pub(crate) fn restore(&mut self, depth: u16) {
		self.state = StackState::Reachable(depth);
		self.max_depth = self.max_depth.max(depth);
	}
}

#[cfg(test)]
mod testing {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn high_water_mark_follows_running_depth() -> Result<()> {
		let mut tracker = StackTracker::new();
		tracker.pop_push(0, 2)?;
		tracker.pop_push(1, 0)?;
		tracker.pop_push(0, 3)?;
		tracker.pop_push(4, 1)?;

		assert_eq!(tracker.state(), StackState::Reachable(1));
		assert_eq!(tracker.max_depth(), 4);
		Ok(())
	}

	#[test]
	fn popping_an_empty_stack_underflows() {
		let mut tracker = StackTracker::new();
		let err = tracker.pop_push(1, 0).unwrap_err();
		assert_eq!(err.downcast_ref(), Some(&CodegenError::StackUnderflow));
	}

	#[test]
	fn pop_is_checked_before_push() -> Result<()> {
		let mut tracker = StackTracker::new();
		tracker.pop_push(0, 1)?;
		// pop 2 push 2 must not be treated as a no-op
		let err = tracker.pop_push(2, 2).unwrap_err();
		assert_eq!(err.downcast_ref(), Some(&CodegenError::StackUnderflow));
		Ok(())
	}

	#[test]
	fn depth_beyond_the_encodable_limit_is_rejected() -> Result<()> {
		let mut tracker = StackTracker::new();
		tracker.pop_push(0, MAX_STACK_DEPTH)?;
		let err = tracker.pop_push(0, 1).unwrap_err();
		assert_eq!(err.downcast_ref(), Some(&CodegenError::StackLimitExceeded));
		Ok(())
	}

	#[test]
	fn restore_after_control_transfer() {
		let mut tracker = StackTracker::new();
		tracker.make_unreachable();
		assert!(tracker.is_unreachable());
		tracker.restore(3);
		assert_eq!(tracker.state(), StackState::Reachable(3));
		assert_eq!(tracker.max_depth(), 3);
	}
}
