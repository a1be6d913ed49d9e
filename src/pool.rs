//! The constant pool service consumed by the method assembler.
//!
//! The class-file writer owns the pool; this crate only asks it for indices.
//! Implementations must deduplicate: putting an equal constant twice returns
//! the same index, regardless of call order.

use anyhow::Result;

use crate::member::{ClassName, ConstructorRef, FieldRef, MethodRef};

/// An append-only, deduplicating constant pool.
///
/// Every method returns the `u16` index of the (possibly pre-existing) entry.
/// Implementations fail when the pool outgrows the 16-bit index space.
pub trait ConstantPool {
	fn put_integer(&mut self, value: i32) -> Result<u16>;
	fn put_string(&mut self, value: &str) -> Result<u16>;
	fn put_double(&mut self, value: f64) -> Result<u16>;
	fn put_long(&mut self, value: i64) -> Result<u16>;
	fn put_class(&mut self, class: &ClassName) -> Result<u16>;
	fn put_field_ref(&mut self, field: &FieldRef) -> Result<u16>;
	fn put_method_ref(&mut self, method: &MethodRef) -> Result<u16>;
	fn put_constructor_ref(&mut self, constructor: &ConstructorRef) -> Result<u16>;
	/// Puts a modified-UTF-8 entry, used for attribute names and descriptors.
	fn put_utf8(&mut self, value: &str) -> Result<u16>;
}
