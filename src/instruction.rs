//! Instruction list elements and their byte encodings.
//!
//! Both instruction kinds answer two queries: their encoded length,
//! which must be computable from local fields alone, and their encoded
//! bytes, which may consult the symbol table. The one-pass layout in
//! `layout` depends on the length never needing symbols.

use crate::bytes;
use crate::error::ErrorKind;
use crate::layout::SymbolTable;
use crate::opcodes::{self, DataType, Mnemonic};
use crate::operand::Operand;
use std::fmt;

pub trait Encode {
    /// Number of bytes `encode_into` will produce. Symbol-independent.
    fn encoded_len(&self) -> u32;

    /// Append the instruction's bytes to `out`.
    fn encode_into(&self, out: &mut Vec<u8>, symbols: &SymbolTable) -> Result<(), ErrorKind>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Data(DataEntry),
    Text(TextEntry),
}

impl Instruction {
    /// Source line the instruction was parsed from.
    pub fn line(&self) -> u32 {
        match self {
            Instruction::Data(entry) => entry.line,
            Instruction::Text(entry) => entry.line,
        }
    }

    /// Byte lengths of the two operand fields, for the event stream.
    pub fn operand_lens(&self) -> (u32, u32) {
        match self {
            Instruction::Data(entry) => (4, entry.data_type.size()),
            Instruction::Text(entry) => (
                entry.op1.as_ref().map_or(0, Operand::encoded_len),
                entry.op2.as_ref().map_or(0, Operand::encoded_len),
            ),
        }
    }
}

impl Encode for Instruction {
    fn encoded_len(&self) -> u32 {
        match self {
            Instruction::Data(entry) => entry.encoded_len(),
            Instruction::Text(entry) => entry.encoded_len(),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>, symbols: &SymbolTable) -> Result<(), ErrorKind> {
        match self {
            Instruction::Data(entry) => entry.encode_into(out, symbols),
            Instruction::Text(entry) => entry.encode_into(out, symbols),
        }
    }
}

/// Initial value of a variable declaration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Initial {
    Int(i64),
    Float(f32),
}

impl fmt::Display for Initial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Initial::Int(value) => write!(f, "{}", value),
            Initial::Float(value) => write!(f, "{}", value),
        }
    }
}

/// A `NAME VAR TYPE INITIAL` declaration from the data section. It
/// encodes as a MOV-immediate of the initial value into the variable's
/// resolved address.
#[derive(Clone, Debug, PartialEq)]
pub struct DataEntry {
    pub index: usize,
    pub line: u32,
    pub name: String,
    pub data_type: DataType,
    pub initial: Initial,
}

impl Encode for DataEntry {
    fn encoded_len(&self) -> u32 {
        // Opcode byte + operand byte + 4-byte destination address,
        // then the immediate at the declared type's width.
        6 + self.data_type.size()
    }

    fn encode_into(&self, out: &mut Vec<u8>, symbols: &SymbolTable) -> Result<(), ErrorKind> {
        let width = self.data_type.size();
        let opcode = opcodes::opcode_for(Mnemonic::MOV, Some(self.data_type)).ok_or_else(|| {
            ErrorKind::OpcodeTypeMismatch {
                mnemonic: Mnemonic::MOV.to_string(),
                data_type: self.data_type.to_string(),
            }
        })?;
        out.push(opcode);

        // Destination designation 5 (absolute address) in the high
        // nibble, immediate-of-width designation in the low nibble.
        let immediate = match width {
            1 => 2,
            2 => 3,
            _ => 4,
        };
        out.push(5 << 4 | immediate);

        let address = symbols
            .get(&self.name)
            .copied()
            .ok_or_else(|| ErrorKind::UndefinedSymbol(self.name.clone()))?;
        bytes::push_u32(out, address);

        match self.initial {
            Initial::Float(value) => bytes::push_f32(out, value),
            Initial::Int(value) => match width {
                1 => out.push(value as u8),
                2 => bytes::push_u16(out, value as u16),
                _ => bytes::push_u32(out, value as u32),
            },
        }
        Ok(())
    }
}

/// A text-section instruction: optional label, mnemonic, optional data
/// type (inferred from operand widths when not written out) and up to
/// two operands.
#[derive(Clone, Debug, PartialEq)]
pub struct TextEntry {
    pub index: usize,
    pub line: u32,
    pub label: String,
    pub mnemonic: Mnemonic,
    pub data_type: Option<DataType>,
    pub op1: Option<Operand>,
    pub op2: Option<Operand>,
}

impl TextEntry {
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.op1.iter().chain(self.op2.iter())
    }

    fn opcode_byte(&self) -> Result<u8, ErrorKind> {
        opcodes::opcode_for(self.mnemonic, self.data_type).ok_or_else(|| {
            ErrorKind::OpcodeTypeMismatch {
                mnemonic: self.mnemonic.to_string(),
                data_type: self
                    .data_type
                    .map(|data_type| data_type.to_string())
                    .unwrap_or_default(),
            }
        })
    }
}

impl Encode for TextEntry {
    fn encoded_len(&self) -> u32 {
        2 + self.operands().map(Operand::encoded_len).sum::<u32>()
    }

    fn encode_into(&self, out: &mut Vec<u8>, _symbols: &SymbolTable) -> Result<(), ErrorKind> {
        out.push(self.opcode_byte()?);
        let high = self.op1.as_ref().map_or(0, Operand::designation);
        let low = self.op2.as_ref().map_or(0, Operand::designation);
        out.push(high << 4 | low);
        for operand in self.operands() {
            operand.encode_into(out)?;
        }
        Ok(())
    }
}
