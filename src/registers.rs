use strum::{Display, EnumIter, EnumString};

/// Register file of the target machine.
///
/// The four general-purpose 32-bit registers each expose a 16-bit, a
/// high-8 and a low-8 sub-register at code offsets +1, +2 and +3.
/// `out` and `in` are I/O pseudo-registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Register {
    Eax,
    Ebx,
    Ecx,
    Edx,
    Esi,
    Edi,
    Ebp,
    Esp,
    Ax,
    Bx,
    Cx,
    Dx,
    Ah,
    Bh,
    Ch,
    Dh,
    Al,
    Bl,
    Cl,
    Dl,
    Out,
    In,
}

impl Register {
    /// Numeric code of the register in the emitted bytecode.
    pub fn code(self) -> u8 {
        match self {
            Register::Eax => 0xA0,
            Register::Ebx => 0xB0,
            Register::Ecx => 0xC0,
            Register::Edx => 0xD0,
            Register::Esi => 0xE1,
            Register::Edi => 0xE2,
            Register::Ebp => 0xE3,
            Register::Esp => 0xE4,
            Register::Ax => 0xA1,
            Register::Bx => 0xB1,
            Register::Cx => 0xC1,
            Register::Dx => 0xD1,
            Register::Ah => 0xA2,
            Register::Bh => 0xB2,
            Register::Ch => 0xC2,
            Register::Dh => 0xD2,
            Register::Al => 0xA3,
            Register::Bl => 0xB3,
            Register::Cl => 0xC3,
            Register::Dl => 0xD3,
            Register::Out => 0xF0,
            Register::In => 0xF1,
        }
    }

    /// Case-insensitive lookup of a register name.
    pub fn parse(token: &str) -> Option<Register> {
        token.to_lowercase().parse().ok()
    }
}
