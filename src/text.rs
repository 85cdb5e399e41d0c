//! Text-section parsing.
//!
//! Line shape: `[LABEL] MNEMONIC [TYPE|WIDTH] [OP1 [OP2]]`. A leading
//! token that is not a known mnemonic is the label. An explicit type
//! or width keyword fixes the instruction's data type; otherwise the
//! type is inferred from the widest operand.

use crate::error::{AssemblyError, ErrorKind, Result};
use crate::instruction::{Instruction, TextEntry};
use crate::normalize::Line;
use crate::opcodes::{DataType, Mnemonic};
use crate::operand::Operand;
use crate::trace::Trace;
use serde_json::json;

pub fn parse_text(
    lines: &[Line],
    instructions: &mut Vec<Instruction>,
    trace: &mut Trace,
) -> Result<()> {
    trace.checkpoint("start_proc_text");

    for line in lines {
        trace.emit("read_text_line", || json!([line.text]));
        let entry = parse_line(line, instructions.len())?;
        trace.emit("ustd_text_line", || {
            let data_type = entry
                .data_type
                .map(|data_type| data_type.to_string())
                .unwrap_or_default();
            let op1 = entry.op1.as_ref().map_or("None".to_owned(), |op| op.to_string());
            let op2 = entry.op2.as_ref().map_or("None".to_owned(), |op| op.to_string());
            json!([
                format!(
                    "Instruction {}. Opcode={}, type={}, label={}, op1={}, op2={}",
                    entry.index, entry.mnemonic, data_type, entry.label, op1, op2
                ),
                entry.label,
                entry.mnemonic.to_string(),
                data_type,
                op1,
                op2
            ])
        });
        instructions.push(Instruction::Text(entry));
    }
    Ok(())
}

fn parse_line(line: &Line, index: usize) -> Result<TextEntry> {
    let err = |kind: ErrorKind| AssemblyError::new(line.number, kind);
    let mut tokens: Vec<&str> = line.text.split_whitespace().collect();

    let first = match tokens.first() {
        Some(token) => *token,
        None => return Err(err(ErrorKind::UnknownMnemonic(String::new()))),
    };

    let mut label = String::new();
    let mnemonic = match Mnemonic::parse(first) {
        Some(mnemonic) => {
            tokens.remove(0);
            mnemonic
        }
        None => {
            label = tokens.remove(0).to_owned();
            let next = tokens.first().copied().unwrap_or("");
            match Mnemonic::parse(next) {
                Some(mnemonic) => {
                    tokens.remove(0);
                    mnemonic
                }
                None => return Err(err(ErrorKind::UnknownMnemonic(next.to_owned()))),
            }
        }
    };

    // Optional explicit data type or width keyword. Anything else in
    // this position is treated as the first operand.
    let mut data_type = None;
    if let Some(token) = tokens.first() {
        data_type = DataType::parse(token).or_else(|| DataType::from_width_keyword(token));
        if data_type.is_some() {
            tokens.remove(0);
        }
    }

    if tokens.len() > 2 {
        return Err(err(ErrorKind::TooManyOperands(tokens.len())));
    }
    let op1 = match tokens.get(0) {
        Some(token) => Some(Operand::classify(token).map_err(&err)?),
        None => None,
    };
    let op2 = match tokens.get(1) {
        Some(token) => Some(Operand::classify(token).map_err(&err)?),
        None => None,
    };

    match data_type {
        None => {
            // Infer from the widest operand. A width with no inference
            // target (no operands, or a three-byte index expression)
            // leaves the type unset.
            let width = op1
                .iter()
                .chain(op2.iter())
                .map(Operand::encoded_len)
                .max()
                .unwrap_or(0);
            data_type = DataType::from_operand_width(width);
        }
        Some(declared) => {
            // An explicit width must hold every immediate operand;
            // never truncate silently.
            for operand in op1.iter().chain(op2.iter()) {
                if let Operand::Immediate(immediate) = operand {
                    if immediate.width() > declared.size() {
                        return Err(err(ErrorKind::ValueOutOfRange {
                            value: immediate.to_string(),
                            width: declared.size(),
                        }));
                    }
                }
            }
        }
    }

    Ok(TextEntry {
        index,
        line: line.number,
        label,
        mnemonic,
        data_type,
        op1,
        op2,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::operand::{Address, Immediate};
    use crate::registers::Register;
    use matches::assert_matches;

    fn parse(text: &str) -> Result<TextEntry> {
        parse_line(
            &Line {
                number: 3,
                text: text.to_owned(),
            },
            0,
        )
    }

    #[test]
    fn plain_instruction() {
        let entry = parse("MOV eax 1").unwrap();
        assert_eq!(entry.label, "");
        assert_eq!(entry.mnemonic, Mnemonic::MOV);
        assert_eq!(entry.op1, Some(Operand::Register(Register::Eax)));
        assert_eq!(
            entry.op2,
            Some(Operand::Immediate(Immediate::Int { value: 1, width: 1 }))
        );
    }

    #[test]
    fn leading_label_is_detected() {
        let entry = parse("start MOV eax 1").unwrap();
        assert_eq!(entry.label, "start");
        assert_eq!(entry.mnemonic, Mnemonic::MOV);
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        let entry = parse("mov eax 1").unwrap();
        assert_eq!(entry.mnemonic, Mnemonic::MOV);
        assert_eq!(entry.label, "");
    }

    #[test]
    fn explicit_type_keyword_is_consumed() {
        let entry = parse("ADD uint eax ebx").unwrap();
        assert_eq!(entry.data_type, Some(DataType::UInt));
        assert_eq!(entry.op1, Some(Operand::Register(Register::Eax)));
    }

    #[test]
    fn width_keywords_map_to_canonical_types() {
        assert_eq!(parse("MOV 1B eax 5").unwrap().data_type, Some(DataType::Char));
        assert_eq!(parse("MOV 2B eax 5").unwrap().data_type, Some(DataType::Short));
        assert_eq!(parse("MOV 4B eax 5").unwrap().data_type, Some(DataType::Int));
    }

    #[test]
    fn type_is_inferred_from_the_widest_operand() {
        assert_eq!(parse("MOV eax 300").unwrap().data_type, Some(DataType::Short));
        assert_eq!(parse("MOV eax ebx").unwrap().data_type, Some(DataType::Char));
        assert_eq!(parse("JMP target").unwrap().data_type, Some(DataType::Int));
    }

    #[test]
    fn no_operands_leaves_the_type_unset() {
        assert_eq!(parse("HLT").unwrap().data_type, None);
    }

    #[test]
    fn three_byte_expressions_have_no_inference_target() {
        let entry = parse("MOV eax [eax*4+ebx]").unwrap();
        assert_eq!(entry.data_type, None);
    }

    #[test]
    fn labels_referencing_symbols() {
        let entry = parse("loop JMP loop").unwrap();
        assert_eq!(entry.label, "loop");
        assert_eq!(
            entry.op1,
            Some(Operand::Address(Address::Symbol("loop".to_owned())))
        );
    }

    #[test]
    fn unknown_mnemonic_after_label() {
        let err = parse("start FROB eax").unwrap_err();
        assert_eq!(err.line, 3);
        assert_matches!(err.kind, ErrorKind::UnknownMnemonic(ref token) if token == "FROB");
    }

    #[test]
    fn lone_label_is_an_error() {
        assert_matches!(
            parse("start").unwrap_err().kind,
            ErrorKind::UnknownMnemonic(_)
        );
    }

    #[test]
    fn operand_count_is_capped_at_two() {
        assert_matches!(
            parse("ADD eax ebx ecx").unwrap_err().kind,
            ErrorKind::TooManyOperands(3)
        );
    }

    #[test]
    fn explicit_width_must_hold_immediates() {
        assert_matches!(
            parse("MOV 1B eax 65000").unwrap_err().kind,
            ErrorKind::ValueOutOfRange { .. }
        );
        assert_matches!(
            parse("MOV 2B eax 1.5").unwrap_err().kind,
            ErrorKind::ValueOutOfRange { .. }
        );
        assert!(parse("MOV 4B eax 65000").is_ok());
    }
}
