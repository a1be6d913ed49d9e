//! Constants from the class file format specification.

/// Opcode byte values, as assigned by the JVM specification.
///
/// Only the instructions the logic-module lowering actually emits are listed.
pub mod opcode {
	pub const NOP: u8 = 0;
	pub const ACONST_NULL: u8 = 1;
	pub const ICONST_M1: u8 = 2;
	pub const ICONST_0: u8 = 3;
	pub const ICONST_5: u8 = 8;
	pub const LCONST_0: u8 = 9;
	pub const LCONST_1: u8 = 10;
	pub const DCONST_0: u8 = 14;
	pub const DCONST_1: u8 = 15;
	pub const BIPUSH: u8 = 16;
	pub const LDC: u8 = 18;
	pub const LDC_W: u8 = 19;
	pub const LDC2_W: u8 = 20;
	pub const ILOAD: u8 = 21;
	pub const ALOAD: u8 = 25;
	pub const ILOAD_0: u8 = 26;
	pub const ALOAD_0: u8 = 42;
	pub const ISTORE: u8 = 54;
	pub const ASTORE: u8 = 58;
	pub const ISTORE_0: u8 = 59;
	pub const ASTORE_0: u8 = 75;
	pub const AASTORE: u8 = 83;
	pub const POP: u8 = 87;
	pub const DUP: u8 = 89;
	pub const DUP_X1: u8 = 90;
	pub const DUP_X2: u8 = 91;
	pub const DUP2: u8 = 92;
	pub const DUP2_X1: u8 = 93;
	pub const SWAP: u8 = 95;
	pub const IINC: u8 = 132;
	pub const IFEQ: u8 = 153;
	pub const IFNE: u8 = 154;
	pub const IF_ACMPEQ: u8 = 165;
	pub const IF_ACMPNE: u8 = 166;
	pub const GOTO: u8 = 167;
	pub const TABLESWITCH: u8 = 170;
	pub const LOOKUPSWITCH: u8 = 171;
	pub const IRETURN: u8 = 172;
	pub const ARETURN: u8 = 176;
	pub const RETURN: u8 = 177;
	pub const GETSTATIC: u8 = 178;
	pub const PUTSTATIC: u8 = 179;
	pub const GETFIELD: u8 = 180;
	pub const PUTFIELD: u8 = 181;
	pub const INVOKEVIRTUAL: u8 = 182;
	pub const INVOKESPECIAL: u8 = 183;
	pub const INVOKESTATIC: u8 = 184;
	pub const NEW: u8 = 187;
	pub const ANEWARRAY: u8 = 189;
	pub const CHECKCAST: u8 = 192;
	pub const INSTANCEOF: u8 = 193;
	pub const WIDE: u8 = 196;
	pub const IFNULL: u8 = 198;
	pub const IFNONNULL: u8 = 199;
}

/// Attribute names.
pub mod attribute {
	pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";
	pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
}

/// The `code` array of a method may at most be this long.
///
/// The class file format stores `code_length` in a `u4`, but the verifier
/// additionally requires it to be less than 65536; branch offsets and debug
/// table entries only hold a `u16`.
pub const MAX_CODE_LENGTH: usize = 65534;

/// Highest operand stack depth that can be declared in the `max_stack` field.
pub const MAX_STACK_DEPTH: u16 = 65534;
