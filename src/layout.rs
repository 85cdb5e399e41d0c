//! First-pass layout and address back-patching.
//!
//! The layout walk computes every instruction's start address and every
//! variable's offset in the variable region, then folds both into one
//! symbol table of absolute addresses. Variables live directly behind
//! the encoded text region, packed in declaration order with no
//! padding. The walk only ever asks instructions for their encoded
//! length, never their bytes, so a single sweep suffices.

use crate::error::{AssemblyError, ErrorKind, Result};
use crate::instruction::{Encode, Instruction};
use crate::operand::{Address, Operand};
use crate::trace::Trace;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

/// Every name (variable or label) mapped to its absolute address in
/// the emitted image.
pub type SymbolTable = HashMap<String, u32>;

pub fn build_symbol_table(instructions: &[Instruction], trace: &mut Trace) -> Result<SymbolTable> {
    trace.checkpoint("start_lv_detect");

    let mut starts = Vec::with_capacity(instructions.len());
    let mut text_region_size = 0u32;
    for instruction in instructions {
        starts.push(text_region_size);
        text_region_size += instruction.encoded_len();
    }

    let mut symbols = SymbolTable::new();
    let mut var_offset = 0u32;

    for (index, instruction) in instructions.iter().enumerate() {
        match instruction {
            Instruction::Data(entry) => {
                trace.emit("found_var", || {
                    json!([entry.name, var_offset, entry.data_type.to_string()])
                });
                define(
                    &mut symbols,
                    &entry.name,
                    text_region_size + var_offset,
                    entry.line,
                )?;
                var_offset += entry.data_type.size();
            }
            Instruction::Text(entry) => {
                if !entry.label.is_empty() {
                    trace.emit("found_label", || json!([entry.label, index]));
                    define(&mut symbols, &entry.label, starts[index], entry.line)?;
                }
            }
        }
    }

    trace.emit("mem_offsets", || {
        json!([symbols.iter().collect::<BTreeMap<_, _>>()])
    });
    Ok(symbols)
}

fn define(symbols: &mut SymbolTable, name: &str, address: u32, line: u32) -> Result<()> {
    if symbols.insert(name.to_owned(), address).is_some() {
        return Err(AssemblyError::new(
            line,
            ErrorKind::DuplicateSymbol(name.to_owned()),
        ));
    }
    Ok(())
}

/// Replace every symbolic address operand with its resolved numeric
/// address. Data entries are left alone; their destination address is
/// looked up by name at encode time.
pub fn patch_addresses(instructions: &mut [Instruction], symbols: &SymbolTable) -> Result<()> {
    for instruction in instructions.iter_mut() {
        if let Instruction::Text(entry) = instruction {
            let line = entry.line;
            patch_operand(&mut entry.op1, symbols, line)?;
            patch_operand(&mut entry.op2, symbols, line)?;
        }
    }
    Ok(())
}

fn patch_operand(slot: &mut Option<Operand>, symbols: &SymbolTable, line: u32) -> Result<()> {
    if let Some(Operand::Address(address)) = slot {
        if let Address::Symbol(name) = address {
            let resolved = symbols.get(name.as_str()).copied().ok_or_else(|| {
                AssemblyError::new(line, ErrorKind::UndefinedSymbol(name.clone()))
            })?;
            *address = Address::Resolved(resolved);
        }
    }
    Ok(())
}
