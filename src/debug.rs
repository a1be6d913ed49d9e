//! Debug side-tables of the `Code` attribute.
//!
//! Both tables are append-only and serialize to the length-prefixed payloads
//! of the `LineNumberTable` and `LocalVariableTable` attributes.

use anyhow::Result;

use crate::BytesWrite;

/// Maps bytecode offsets to source line numbers, for stack traces and
/// debuggers.
#[derive(Debug)]
pub(crate) struct LineNumberTable {
	/// The pool index of the `LineNumberTable` utf8 entry.
	pub(crate) attribute_name_index: u16,
	entries: Vec<(u16, u16)>,
}

impl LineNumberTable {
	pub(crate) fn new(attribute_name_index: u16) -> LineNumberTable {
		LineNumberTable {
			attribute_name_index,
			entries: Vec::new(),
		}
	}

	pub(crate) fn add_entry(&mut self, start_pc: u16, line_number: u16) {
		self.entries.push((start_pc, line_number));
	}

	pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
		let mut w = Vec::with_capacity(2 + 4 * self.entries.len());
		w.write_u16(u16::try_from(self.entries.len())?)?;
		for &(start_pc, line_number) in &self.entries {
			w.write_u16(start_pc)?;
			w.write_u16(line_number)?;
		}
		Ok(w)
	}
}

#[derive(Debug)]
struct LocalVariableEntry {
	index: u16,
	name_index: u16,
	descriptor_index: u16,
}

/// Names the local variable slots of a method, for debuggers only.
#[derive(Debug)]
pub(crate) struct LocalVariableTable {
	/// The pool index of the `LocalVariableTable` utf8 entry.
	pub(crate) attribute_name_index: u16,
	entries: Vec<LocalVariableEntry>,
}

impl LocalVariableTable {
	pub(crate) fn new(attribute_name_index: u16) -> LocalVariableTable {
		LocalVariableTable {
			attribute_name_index,
			entries: Vec::new(),
		}
	}

	pub(crate) fn add_entry(&mut self, index: u16, name_index: u16, descriptor_index: u16) {
		self.entries.push(LocalVariableEntry { index, name_index, descriptor_index });
	}

	/// Serializes the table; every entry spans the whole method body.
	pub(crate) fn to_bytes(&self, code_length: u16) -> Result<Vec<u8>> {
		let mut w = Vec::with_capacity(2 + 10 * self.entries.len());
		w.write_u16(u16::try_from(self.entries.len())?)?;
		for entry in &self.entries {
			w.write_u16(0)?; // start_pc
			w.write_u16(code_length)?;
			w.write_u16(entry.name_index)?;
			w.write_u16(entry.descriptor_index)?;
			w.write_u16(entry.index)?;
		}
		Ok(w)
	}
}
