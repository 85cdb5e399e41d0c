//! Data-section parsing.
//!
//! Each line declares one variable: `NAME VAR TYPE INITIAL`. The
//! declaration becomes a `DataEntry`, a MOV-immediate of the initial
//! value into the variable's eventual address.

use crate::error::{AssemblyError, ErrorKind, Result};
use crate::instruction::{DataEntry, Initial, Instruction};
use crate::normalize::Line;
use crate::opcodes::DataType;
use crate::operand::fits_width;
use crate::trace::Trace;
use matches::debug_assert_matches;
use serde_json::json;

pub fn parse_data(
    lines: &[Line],
    instructions: &mut Vec<Instruction>,
    trace: &mut Trace,
) -> Result<()> {
    trace.checkpoint("start_proc_data");

    for line in lines {
        trace.emit("read_data_line", || json!([line.text]));
        let entry = parse_line(line, instructions.len())?;
        debug_assert_matches!(
            (entry.data_type, &entry.initial),
            (DataType::Float, Initial::Float(_)) | (_, Initial::Int(_))
        );
        trace.emit("ustd_data_line", || {
            json!([
                format!(
                    "Variable '{}' has type '{}' and initial value '{}'",
                    entry.name, entry.data_type, entry.initial
                ),
                entry.name,
                entry.data_type.to_string(),
                entry.initial.to_string()
            ])
        });
        instructions.push(Instruction::Data(entry));
    }
    Ok(())
}

fn parse_line(line: &Line, index: usize) -> Result<DataEntry> {
    let err = |kind: ErrorKind| AssemblyError::new(line.number, kind);

    let mut split = line.text.splitn(2, " VAR ");
    let name = split.next().unwrap_or("").trim();
    let rest = match split.next() {
        Some(rest) => rest,
        None => {
            return Err(err(ErrorKind::MalformedData(format!(
                "Data line has no VAR token: {}",
                line.text
            ))));
        }
    };

    let mut tokens = rest.split_whitespace();
    let type_token = tokens.next().ok_or_else(|| {
        err(ErrorKind::MalformedData(format!(
            "Variable {} has no data type",
            name
        )))
    })?;
    let initial_token = tokens.next().ok_or_else(|| {
        err(ErrorKind::MalformedData(format!(
            "Variable {} has no initial value",
            name
        )))
    })?;
    if tokens.next().is_some() {
        return Err(err(ErrorKind::MalformedData(format!(
            "Trailing tokens after the initial value of {}",
            name
        ))));
    }

    // Only the seven named types declare variables; width keywords
    // have no signedness and are rejected here.
    let data_type = DataType::parse(type_token)
        .ok_or_else(|| err(ErrorKind::UnknownType(type_token.to_owned())))?;

    let initial = if data_type == DataType::Float {
        let value: f32 = initial_token.parse().map_err(|_| {
            err(ErrorKind::MalformedData(format!(
                "Initial value {} is not a float",
                initial_token
            )))
        })?;
        Initial::Float(value)
    } else {
        let value: i64 = initial_token.parse().map_err(|_| {
            err(ErrorKind::MalformedData(format!(
                "Initial value {} is not an integer",
                initial_token
            )))
        })?;
        if !fits_width(value, data_type.size()) {
            return Err(err(ErrorKind::ValueOutOfRange {
                value: initial_token.to_owned(),
                width: data_type.size(),
            }));
        }
        Initial::Int(value)
    };

    Ok(DataEntry {
        index,
        line: line.number,
        name: name.to_owned(),
        data_type,
        initial,
    })
}
