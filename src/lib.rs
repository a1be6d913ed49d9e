//! Bytecode assembly for method bodies of compiled medical logic modules.
//!
//! The compiler front end lowers a logic module into a sequence of
//! instruction-emission calls on a [`MethodWriter`]. The writer tracks the
//! operand stack depth (including its high-water mark), the number of local
//! variable slots, and all pending branch targets, and finally packages the
//! instruction bytes into the binary `Code` attribute of a class file.
//!
//! Constants are allocated through the [`ConstantPool`] trait; the class-file
//! writer owns the actual pool, this crate only consumes indices.
//!
//! ```no_run
//! # use mlm_codegen::{MethodWriter, ConstantPool};
//! # fn example(pool: &mut impl ConstantPool) -> anyhow::Result<()> {
//! let mut method = MethodWriter::new(pool, true, 1);
//! method.load_this()?;
//! method.load_variable(1)?;
//! method.return_object_from_function()?;
//! let code = method.finish()?;
//! # let _ = code.bytes;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;

pub mod class_constants;
pub mod errors;
pub mod member;
pub mod pool;
mod stack;
mod label;
mod debug;
mod method_writer;

pub use errors::CodegenError;
pub use label::Label;
pub use member::{ClassName, ConstructorRef, FieldRef, MethodRef, ValueCategory};
pub use method_writer::{CodeAttribute, MethodWriter};
pub use pool::ConstantPool;

/// Big-endian serialization helpers for the byte buffers this crate builds.
///
/// All multi-byte quantities in a class file are big-endian.
pub(crate) trait BytesWrite {
	fn write_u8(&mut self, value: u8) -> Result<()>;
	fn write_i8(&mut self, value: i8) -> Result<()>;
	fn write_u16(&mut self, value: u16) -> Result<()>;
	fn write_i16(&mut self, value: i16) -> Result<()>;
	fn write_u32(&mut self, value: u32) -> Result<()>;
	fn write_i32(&mut self, value: i32) -> Result<()>;
	fn write_u8_slice(&mut self, slice: &[u8]) -> Result<()>;
}

impl BytesWrite for Vec<u8> {
	fn write_u8(&mut self, value: u8) -> Result<()> {
		self.push(value);
		Ok(())
	}
	fn write_i8(&mut self, value: i8) -> Result<()> {
		self.push(value as u8);
		Ok(())
	}
	fn write_u16(&mut self, value: u16) -> Result<()> {
		self.extend_from_slice(&value.to_be_bytes());
		Ok(())
	}
	fn write_i16(&mut self, value: i16) -> Result<()> {
		self.extend_from_slice(&value.to_be_bytes());
		Ok(())
	}
	fn write_u32(&mut self, value: u32) -> Result<()> {
		self.extend_from_slice(&value.to_be_bytes());
		Ok(())
	}
	fn write_i32(&mut self, value: i32) -> Result<()> {
		self.extend_from_slice(&value.to_be_bytes());
		Ok(())
	}
	fn write_u8_slice(&mut self, slice: &[u8]) -> Result<()> {
		self.extend_from_slice(slice);
		Ok(())
	}
}
