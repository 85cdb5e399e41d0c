//! Final serialization: the metadata header followed by the encoded
//! instruction stream.

use crate::config::Config;
use crate::error::{AssemblyError, Result};
use crate::instruction::{Encode, Instruction};
use crate::layout::SymbolTable;
use crate::trace::Trace;
use serde_json::json;

/// `key=value&` pairs in insertion order, terminated by four zero
/// bytes.
pub fn encode_metadata(config: &Config, out: &mut Vec<u8>) {
    for (key, value) in config.iter() {
        out.extend_from_slice(key.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value.as_bytes());
        out.push(b'&');
    }
    out.extend_from_slice(&[0, 0, 0, 0]);
}

pub fn encode_program(
    config: &Config,
    instructions: &[Instruction],
    symbols: &SymbolTable,
    trace: &mut Trace,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_metadata(config, &mut out);
    trace.emit("conv_meta", || json!(out));

    for instruction in instructions {
        let start = out.len();
        instruction
            .encode_into(&mut out, symbols)
            .map_err(|kind| AssemblyError::new(instruction.line(), kind))?;
        debug_assert_eq!((out.len() - start) as u32, instruction.encoded_len());

        trace.emit("conv_instr", || {
            let encoded = &out[start..];
            let (op1_len, _) = instruction.operand_lens();
            let op1_end = 2 + op1_len as usize;
            json!([
                encoded[0],
                encoded[1],
                &encoded[2..op1_end],
                &encoded[op1_end..]
            ])
        });
    }

    trace.emit("end", || json!(out));
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn metadata_is_pairs_then_terminator() {
        let mut config = Config::default();
        config.set("flag", "on");
        let mut out = Vec::new();
        encode_metadata(&config, &mut out);
        assert_eq!(&out[..], &b"mem_amt=4&flag=on&\0\0\0\0"[..]);
    }
}
