//! Buffer helpers for the emitters. Everything in the image is
//! big-endian, so all writers go through the crate's `Endian` alias.

use crate::Endian;
use byteorder::ByteOrder;

pub fn push_u16(out: &mut Vec<u8>, value: u16) {
    let start = out.len();
    out.resize(start + 2, 0);
    Endian::write_u16(&mut out[start..], value);
}

pub fn push_u32(out: &mut Vec<u8>, value: u32) {
    let start = out.len();
    out.resize(start + 4, 0);
    Endian::write_u32(&mut out[start..], value);
}

pub fn push_f32(out: &mut Vec<u8>, value: f32) {
    let start = out.len();
    out.resize(start + 4, 0);
    Endian::write_f32(&mut out[start..], value);
}
