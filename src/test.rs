use crate::instruction::Encode;
use crate::*;
use matches::assert_matches;

const META_DEFAULT: &[u8] = b"mem_amt=4&\0\0\0\0";

fn assemble_text_region(input: &str) -> Vec<u8> {
    let bytecode = assemble(input).unwrap();
    assert_eq!(&bytecode[..META_DEFAULT.len()], META_DEFAULT);
    bytecode[META_DEFAULT.len()..].to_vec()
}

fn minimal(text: &str) -> String {
    format!("section.meta\nsection.data\nsection.text\n{}", text)
}

#[test]
fn empty_program() {
    let bytecode = assemble("section.meta\nsection.data\nsection.text\n").unwrap();
    assert_eq!(&bytecode[..], META_DEFAULT);
}

#[test]
fn single_variable() {
    let text = assemble_text_region("section.meta\nsection.data\nx VAR char 5\nsection.text\n");
    // One 7-byte MOV_1B; the variable lives right behind it.
    assert_eq!(text, [0x10, 0x52, 0x00, 0x00, 0x00, 0x07, 0x05]);
}

#[test]
fn label_and_jump() {
    let text = assemble_text_region(&minimal("loop JMP loop\n"));
    assert_eq!(text, [0x08, 0x50, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn type_inferred_from_operands() {
    // 300 needs two bytes, so the MOV becomes MOV_2B.
    let text = assemble_text_region(&minimal("MOV eax 300\n"));
    assert_eq!(text, [0x11, 0x13, 0xA0, 0x01, 0x2C]);
}

#[test]
fn arithmetic_operand_encoding() {
    let text = assemble_text_region(&minimal("MOV 4B eax [eax*4+ebx]\n"));
    assert_eq!(text, [0x12, 0x19, 0xA0, 0xA0, 0x04, 0xB0]);
}

#[test]
fn width_fallback_selects_the_4b_opcode() {
    let text = assemble_text_region(&minimal("AND 4B eax ebx\n"));
    assert_eq!(text, [0x52, 0x11, 0xA0, 0xB0]);
}

#[test]
fn jump_to_a_later_label() {
    let text = assemble_text_region(&minimal("JMP end\nMOV eax 1\nend HLT\n"));
    // The jump is 6 bytes and the MOV 4, so `end` sits at offset 10.
    assert_eq!(
        text,
        [0x08, 0x50, 0x00, 0x00, 0x00, 0x0A, 0x10, 0x12, 0xA0, 0x01, 0x00, 0x00]
    );
}

#[test]
fn variables_and_references_together() {
    let source = "section.meta\nsection.data\nx VAR int 70000\nsection.text\nMOV x eax\n";
    let text = assemble_text_region(source);
    // Data entry: 10 bytes. MOV x eax: 2 + 4 + 1 = 7. x lives at 17.
    assert_eq!(
        text,
        [
            0x12, 0x54, 0x00, 0x00, 0x00, 0x11, 0x00, 0x01, 0x11, 0x70, // x VAR int 70000
            0x12, 0x51, 0x00, 0x00, 0x00, 0x11, 0xA0 // MOV x eax
        ]
    );
}

#[test]
fn float_variable_encodes_ieee754() {
    let text =
        assemble_text_region("section.meta\nsection.data\npi VAR float 3.5\nsection.text\n");
    let mut expected = vec![0x12, 0x54, 0x00, 0x00, 0x00, 0x0A];
    expected.extend_from_slice(&3.5f32.to_be_bytes());
    assert_eq!(text, expected);
}

#[test]
fn data_entry_designations_follow_the_declared_width() {
    let source =
        "section.meta\nsection.data\na VAR char 1\nb VAR ushort 2\nc VAR uint 3\nsection.text\n";
    let text = assemble_text_region(source);
    assert_eq!(text[0], 0x10); // MOV_1B
    assert_eq!(text[1], 0x52);
    assert_eq!(text[7], 0x11); // MOV_2B
    assert_eq!(text[8], 0x53);
    assert_eq!(text[15], 0x12); // MOV_4B
    assert_eq!(text[16], 0x54);
}

#[test]
fn metadata_reflects_meta_entries_in_order() {
    let source = "section.meta\nmem_amt=16\nname=prog\nsection.data\nsection.text\n";
    let bytecode = assemble(source).unwrap();
    assert_eq!(&bytecode[..], &b"mem_amt=16&name=prog&\0\0\0\0"[..]);
}

// Errors surface as single typed diagnostics with a line number.

#[test]
fn missing_section_is_global() {
    let err = assemble("section.meta\nsection.text\n").unwrap_err();
    assert_eq!(err.line, GLOBAL_LINE);
    assert_matches!(err.kind, ErrorKind::MissingSection(ref name) if name == "data");
}

#[test]
fn undefined_symbol_reports_the_referencing_line() {
    let err = assemble(&minimal("HLT\nJMP nowhere\n")).unwrap_err();
    assert_eq!(err.line, 5);
    assert_matches!(err.kind, ErrorKind::UndefinedSymbol(ref name) if name == "nowhere");
}

#[test]
fn duplicate_symbols_are_rejected() {
    let source = "section.meta\nsection.data\nx VAR char 0\nsection.text\nx JMP x\n";
    let err = assemble(source).unwrap_err();
    assert_matches!(err.kind, ErrorKind::DuplicateSymbol(ref name) if name == "x");
}

#[test]
fn narrow_width_with_wide_immediate_is_out_of_range() {
    let err = assemble(&minimal("MOV 1B eax 65000\n")).unwrap_err();
    assert_matches!(err.kind, ErrorKind::ValueOutOfRange { .. });
}

#[test]
fn mnemonic_without_usable_type_is_a_mismatch() {
    // A three-byte index expression gives inference nothing to map.
    let err = assemble(&minimal("MOV eax [eax*4+ebx]\n")).unwrap_err();
    assert_matches!(err.kind, ErrorKind::OpcodeTypeMismatch { .. });
}

#[test]
fn error_display_format() {
    let err = assemble(&minimal("MOV eax 5 6\n")).unwrap_err();
    assert_eq!(
        format!("{}", err),
        "Error on line 4: Expected at most 2 operands, found 3"
    );
}

// Structural invariants.

#[test]
fn encoded_length_matches_encoding_for_every_instruction() {
    let source = "section.meta\nsection.data\nx VAR int 9\ny VAR char 3\nsection.text\n\
                  loop ADD float eax ebx\nMOV eax [esp+8]\nCMP eax 70000\nJNE loop\nLEA eax x\nHLT\n";
    let lines = normalize::normalize_lines(source, &mut Trace::disabled());
    let sections = sections::split_sections(&lines, &mut Trace::disabled()).unwrap();
    let mut instructions = Vec::new();
    data::parse_data(&sections.data, &mut instructions, &mut Trace::disabled()).unwrap();
    text::parse_text(&sections.text, &mut instructions, &mut Trace::disabled()).unwrap();

    let symbols = layout::build_symbol_table(&instructions, &mut Trace::disabled()).unwrap();
    layout::patch_addresses(&mut instructions, &symbols).unwrap();

    let mut total = 0;
    for instruction in &instructions {
        let mut out = Vec::new();
        instruction.encode_into(&mut out, &symbols).unwrap();
        assert_eq!(out.len() as u32, instruction.encoded_len());
        total += out.len() as u32;
    }

    // The first declared variable starts exactly where the text region
    // ends; the second follows without padding.
    assert_eq!(symbols["x"], total);
    assert_eq!(symbols["y"], total + 4);
}

#[test]
fn address_operands_are_always_four_bytes() {
    for target in &["a", "abcdefghijklmnop"] {
        let operand = Operand::classify(target).unwrap();
        assert_eq!(operand.encoded_len(), 4);
    }
    let mut out = Vec::new();
    Operand::Address(Address::Resolved(7))
        .encode_into(&mut out)
        .unwrap();
    Operand::Address(Address::Resolved(0xFFFF_FFFF))
        .encode_into(&mut out)
        .unwrap();
    assert_eq!(out.len(), 8);
}

#[test]
fn register_tokens_round_trip_to_their_codes() {
    use strum::IntoEnumIterator;

    for register in Register::iter() {
        let operand = Operand::classify(&register.to_string()).unwrap();
        assert_eq!(operand, Operand::Register(register));
        let mut out = Vec::new();
        operand.encode_into(&mut out).unwrap();
        assert_eq!(out, [register.code()]);
    }
}

#[test]
fn trace_checkpoints_appear_in_pipeline_order() {
    let source =
        "section.meta\nmem_amt=8\nsection.data\nx VAR char 1\nsection.text\nloop JMP loop\n";
    let mut buffer = Vec::new();
    {
        let mut trace = Trace::to_writer(&mut buffer);
        assemble_traced(source, &mut trace).unwrap();
    }
    let output = String::from_utf8(buffer).unwrap();
    let labels: Vec<&str> = output
        .lines()
        .map(|line| line.split(' ').next().unwrap())
        .collect();
    assert_eq!(
        labels,
        [
            "start_text",
            "remove_comments",
            "remove_empty_lines",
            "remove_dup_wspace",
            "split",
            "start_proc_meta",
            "read_meta_line",
            "ustd_meta_line",
            "start_proc_data",
            "read_data_line",
            "ustd_data_line",
            "start_proc_text",
            "read_text_line",
            "ustd_text_line",
            "start_lv_detect",
            "found_var",
            "found_label",
            "mem_offsets",
            "conv_meta",
            "conv_instr",
            "conv_instr",
            "end"
        ]
    );
}

#[test]
fn trace_payloads_are_json_arrays() {
    let source = "section.meta\nsection.data\nsection.text\nHLT\n";
    let mut buffer = Vec::new();
    {
        let mut trace = Trace::to_writer(&mut buffer);
        assemble_traced(source, &mut trace).unwrap();
    }
    let output = String::from_utf8(buffer).unwrap();
    for line in output.lines() {
        if let Some(at) = line.find(' ') {
            let payload: serde_json::Value = serde_json::from_str(&line[at + 1..]).unwrap();
            assert!(payload.is_array(), "payload of {} is not an array", line);
        }
    }
}
