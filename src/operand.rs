//! Operand classification and encoding.
//!
//! A text-section operand token is one of four kinds, tried in order:
//! a register name, an immediate value, a symbol reference, or an
//! arithmetic expression in square brackets. Every operand knows its
//! 4-bit designation code and its encoded width in bytes; two
//! designations are packed into the instruction's operand-descriptor
//! byte.

use crate::bytes;
use crate::error::ErrorKind;
use crate::registers::Register;
use lazy_regex::regex_captures;
use std::fmt;
use std::num::IntErrorKind;

/// Signed-or-unsigned bounds check for an integer packed into `width`
/// bytes. The machine does not distinguish signedness at the encoding
/// level, so both ranges are acceptable.
pub fn fits_width(value: i64, width: u32) -> bool {
    match width {
        1 => (-128..=255).contains(&value),
        2 => (-32768..=65535).contains(&value),
        _ => (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value),
    }
}

/// An immediate value. Integers carry the smallest width of {1, 2, 4}
/// bytes that holds them; floats are always 4 bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Immediate {
    Int { value: i64, width: u32 },
    Float(f32),
}

impl Immediate {
    pub fn from_int(value: i64) -> Result<Immediate, ErrorKind> {
        let width = if fits_width(value, 1) {
            1
        } else if fits_width(value, 2) {
            2
        } else if fits_width(value, 4) {
            4
        } else {
            return Err(ErrorKind::ValueOutOfRange {
                value: value.to_string(),
                width: 4,
            });
        };
        Ok(Immediate::Int { value, width })
    }

    pub fn width(&self) -> u32 {
        match *self {
            Immediate::Int { width, .. } => width,
            Immediate::Float(_) => 4,
        }
    }

    pub fn designation(&self) -> u8 {
        match *self {
            Immediate::Int { width: 1, .. } => 2,
            Immediate::Int { width: 2, .. } => 3,
            _ => 4,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match *self {
            Immediate::Int { value, width } => {
                debug_assert!(fits_width(value, width));
                match width {
                    1 => out.push(value as u8),
                    2 => bytes::push_u16(out, value as u16),
                    _ => bytes::push_u32(out, value as u32),
                }
            }
            Immediate::Float(value) => bytes::push_f32(out, value),
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Immediate::Int { value, .. } => write!(f, "{}", value),
            Immediate::Float(value) => write!(f, "{}", value),
        }
    }
}

/// A symbol reference. Parsing produces the symbolic form; the address
/// patcher replaces it with the resolved absolute address. Either way
/// it encodes as exactly four bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Address {
    Symbol(String),
    Resolved(u32),
}

/// The five recognized index-expression shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Single,     // a
    Product,    // a*b
    Sum,        // a+b
    ProductSum, // a*b+c
    SumProduct, // a+b*c
}

impl Shape {
    fn designation(self) -> u8 {
        match self {
            Shape::Single => 6,
            Shape::Product => 7,
            Shape::Sum => 8,
            Shape::ProductSum => 9,
            Shape::SumProduct => 10,
        }
    }

    fn term_count(self) -> usize {
        match self {
            Shape::Single => 1,
            Shape::Product | Shape::Sum => 2,
            Shape::ProductSum | Shape::SumProduct => 3,
        }
    }
}

/// An index expression in square brackets. Terms are stored already
/// encoded: a register's numeric code, or one of the scale constants
/// 1, 2, 4, 8 as itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Arithmetic {
    shape: Shape,
    terms: [u8; 3],
    text: String,
}

impl Arithmetic {
    fn parse(expr: &str) -> Result<Arithmetic, ErrorKind> {
        // Three-term shapes first so they are not truncated by the
        // two-term patterns.
        let (shape, a, b, c) = if let Some((_, a, b, c)) =
            regex_captures!(r"^([a-zA-Z0-9]+)\*([a-zA-Z0-9]+)\+([a-zA-Z0-9]+)$", expr)
        {
            (Shape::ProductSum, a, b, Some(c))
        } else if let Some((_, a, b, c)) =
            regex_captures!(r"^([a-zA-Z0-9]+)\+([a-zA-Z0-9]+)\*([a-zA-Z0-9]+)$", expr)
        {
            (Shape::SumProduct, a, b, Some(c))
        } else if let Some((_, a, b)) =
            regex_captures!(r"^([a-zA-Z0-9]+)\+([a-zA-Z0-9]+)$", expr)
        {
            (Shape::Sum, a, b, None)
        } else if let Some((_, a, b)) =
            regex_captures!(r"^([a-zA-Z0-9]+)\*([a-zA-Z0-9]+)$", expr)
        {
            (Shape::Product, a, b, None)
        } else if let Some((_, a)) = regex_captures!(r"^([a-zA-Z0-9]+)$", expr) {
            (Shape::Single, a, "", None)
        } else {
            return Err(ErrorKind::InvalidArithmetic(format!(
                "Incorrect format for arithmetic operand: {}",
                expr
            )));
        };

        let mut terms = [0u8; 3];
        terms[0] = resolve_term(a)?;
        if shape.term_count() > 1 {
            terms[1] = resolve_term(b)?;
        }
        if let Some(c) = c {
            terms[2] = resolve_term(c)?;
        }

        Ok(Arithmetic {
            shape,
            terms,
            text: expr.to_owned(),
        })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.terms[..self.shape.term_count()]);
    }
}

/// A term is a register (encoded by its code) or a scale constant.
fn resolve_term(term: &str) -> Result<u8, ErrorKind> {
    if let Some(register) = Register::parse(term) {
        return Ok(register.code());
    }
    match term.parse::<u32>() {
        Ok(value) if value == 1 || value == 2 || value == 4 || value == 8 => Ok(value as u8),
        _ => Err(ErrorKind::InvalidArithmetic(format!(
            "Term {} is neither a register nor one of 1, 2, 4, 8",
            term
        ))),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Register(Register),
    Immediate(Immediate),
    Address(Address),
    Arithmetic(Arithmetic),
}

impl Operand {
    /// Classify a single operand token. Precedence: register name,
    /// integer immediate, float immediate, identifier, bracketed
    /// expression.
    pub fn classify(token: &str) -> Result<Operand, ErrorKind> {
        if let Some(register) = Register::parse(token) {
            return Ok(Operand::Register(register));
        }
        match token.parse::<i64>() {
            Ok(value) => return Immediate::from_int(value).map(Operand::Immediate),
            Err(err)
                if matches!(
                    err.kind(),
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                ) =>
            {
                return Err(ErrorKind::ValueOutOfRange {
                    value: token.to_owned(),
                    width: 4,
                });
            }
            Err(_) => {}
        }
        if let Ok(value) = token.parse::<f32>() {
            return Ok(Operand::Immediate(Immediate::Float(value)));
        }
        if is_identifier(token) {
            return Ok(Operand::Address(Address::Symbol(token.to_owned())));
        }
        if token.len() >= 2 && token.starts_with('[') && token.ends_with(']') {
            return Arithmetic::parse(&token[1..token.len() - 1]).map(Operand::Arithmetic);
        }
        Err(ErrorKind::InvalidOperand(token.to_owned()))
    }

    /// 4-bit code identifying the operand kind and sub-shape.
    pub fn designation(&self) -> u8 {
        match self {
            Operand::Register(_) => 1,
            Operand::Immediate(imm) => imm.designation(),
            Operand::Address(_) => 5,
            Operand::Arithmetic(expr) => expr.shape.designation(),
        }
    }

    /// Encoded width in bytes. Must not depend on the symbol table;
    /// the one-pass layout relies on that.
    pub fn encoded_len(&self) -> u32 {
        match self {
            Operand::Register(_) => 1,
            Operand::Immediate(imm) => imm.width(),
            Operand::Address(_) => 4,
            Operand::Arithmetic(expr) => expr.shape.term_count() as u32,
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), ErrorKind> {
        match self {
            Operand::Register(register) => out.push(register.code()),
            Operand::Immediate(imm) => imm.encode_into(out),
            Operand::Address(Address::Resolved(address)) => bytes::push_u32(out, *address),
            Operand::Address(Address::Symbol(name)) => {
                return Err(ErrorKind::UndefinedSymbol(name.clone()));
            }
            Operand::Arithmetic(expr) => expr.encode_into(out),
        }
        Ok(())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{}", register),
            Operand::Immediate(imm) => write!(f, "{}", imm),
            Operand::Address(Address::Symbol(name)) => write!(f, "{}", name),
            Operand::Address(Address::Resolved(address)) => write!(f, "{}", address),
            Operand::Arithmetic(expr) => write!(f, "[{}]", expr.text),
        }
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
