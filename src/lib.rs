//! Two-pass assembler for the SASM virtual machine.
//!
//! The main entry points are [`assemble`](fn.assemble.html) and
//! [`assemble_traced`](fn.assemble_traced.html), which accept a program
//! written in the sectioned SASM assembly language and return the flat
//! bytecode image: a metadata header followed by the encoded
//! instruction stream, big-endian throughout. `assemble_traced`
//! additionally reports pipeline checkpoints to a [`Trace`](struct.Trace.html)
//! sink for the external visualizer.
//!
//! # SASM Assembly Language
//!
//! A program consists of the three sections `meta`, `data` and `text`,
//! each introduced by a `section.<name>` header line. All three are
//! mandatory. Comments start with a semicolon `;` and continue to the
//! end of the line; whitespace within a line is insignificant.
//!
//! ## `meta` Section
//!
//! Configuration entries, one `key=value` per line. Entries are layered
//! over the built-in defaults (`mem_amt=4`) and emitted verbatim into
//! the metadata header. Unknown keys are passed through untouched.
//!
//! ## `data` Section
//!
//! Variable declarations, one `NAME VAR TYPE INITIAL` per line, where
//! `TYPE` is one of the seven data types below. Each declaration
//! reserves storage behind the encoded text region (packed in
//! declaration order) and assembles to a MOV of the initial value into
//! that address.
//!
//!  Type    | Width | Type     | Width
//! ---------|-------|----------|-------
//! `char`   | 1     | `uchar`  | 1
//! `short`  | 2     | `ushort` | 2
//! `int`    | 4     | `uint`   | 4
//! `float`  | 4     |          |
//!
//! ## `text` Section
//!
//! Instructions of the form `[LABEL] MNEMONIC [TYPE|WIDTH] [OP1 [OP2]]`.
//! A leading token that is not a mnemonic names a label for the
//! instruction's address. The optional type keyword (or width alias
//! `1B`/`2B`/`4B`) selects the operand width; without one, the width of
//! the widest operand decides.
//!
//! Mnemonics: `HLT`, `CMP`, `JMP`, `JE`, `JNE`, `JLT`, `JLE`, `JGT`,
//! `JGE`, `MOV`, `LEA`, `ADD`, `SUB`, `MUL`, `IDIV`, `MOD`, `EDIV`,
//! `AND`, `OR`, `XOR`, `NOT`, `LSH`, `RSH`.
//!
//! Operands are one of four kinds:
//!
//!  Kind       | Syntax                           | Example
//! ------------|----------------------------------|--------------
//!  register   | register name                    | `eax`
//!  immediate  | decimal integer or float literal | `-300`, `1.5`
//!  address    | variable or label name           | `counter`
//!  arithmetic | `[a]`, `[a*b]`, `[a+b]`, `[a*b+c]`, `[a+b*c]` | `[eax*4+ebx]`
//!
//! Arithmetic terms are register names or the scale constants 1, 2, 4
//! and 8. Registers: `eax ebx ecx edx esi edi ebp esp`, the 16-bit
//! forms `ax bx cx dx`, the 8-bit halves `ah..dh` / `al..dl`, and the
//! I/O pseudo-registers `out` and `in`.

mod bytes;
mod config;
mod data;
mod encode;
mod error;
mod instruction;
mod layout;
mod normalize;
mod opcodes;
mod operand;
mod registers;
mod sections;
mod text;
mod trace;

#[cfg(test)]
mod test;

pub use crate::config::Config;
pub use crate::error::{AssemblyError, ErrorKind, Result, GLOBAL_LINE};
pub use crate::instruction::{DataEntry, Encode, Initial, Instruction, TextEntry};
pub use crate::layout::SymbolTable;
pub use crate::normalize::normalize;
pub use crate::opcodes::{opcode_for, DataType, Mnemonic};
pub use crate::operand::{Address, Arithmetic, Immediate, Operand, Shape};
pub use crate::registers::Register;
pub use crate::trace::Trace;

use log::debug;
use serde_json::json;

/// Byte order of every multi-byte value in the emitted image.
pub type Endian = byteorder::BigEndian;

/// Assemble a SASM program into its bytecode image.
pub fn assemble(input: &str) -> Result<Vec<u8>> {
    assemble_traced(input, &mut Trace::disabled())
}

/// Assemble a SASM program, reporting pipeline checkpoints to `trace`.
pub fn assemble_traced(input: &str, trace: &mut Trace) -> Result<Vec<u8>> {
    trace.emit("start_text", || json!([input]));

    let lines = normalize::normalize_lines(input, trace);
    let sections = sections::split_sections(&lines, trace)?;
    let config = config::parse_meta(&sections.meta, trace)?;

    let mut instructions = Vec::new();
    data::parse_data(&sections.data, &mut instructions, trace)?;
    text::parse_text(&sections.text, &mut instructions, trace)?;
    debug!("parsed {} instructions", instructions.len());

    let symbols = layout::build_symbol_table(&instructions, trace)?;
    layout::patch_addresses(&mut instructions, &symbols)?;
    debug!("laid out {} symbols", symbols.len());

    encode::encode_program(&config, &instructions, &symbols, trace)
}
