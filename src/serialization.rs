//! Big-endian, length-prefixed encoding of the primitive atoms every page
//! and tuple is built from: bools, 32-bit ints, raw byte strings and UTF-8
//! strings.
//!
//! Writers append to a `Vec<u8>` and cannot fail.  Readers consume from any
//! `Read` (in practice a `Cursor` over page bytes) and fail with
//! `ShortBuffer` when the input ends before the declared element does, or
//! `Corrupt` when the bytes cannot mean anything (a bool byte that is
//! neither 0 nor 1, a string that is not UTF-8).

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("input ended while reading a {0}")]
    ShortBuffer(&'static str),
    #[error("corrupt encoding: {0}")]
    Corrupt(String),
}

pub fn put_bool(out: &mut Vec<u8>, v: bool) {
    out.push(v as u8);
}

pub fn put_int(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// 4-byte length prefix followed by the raw bytes.
pub fn put_bytes(out: &mut Vec<u8>, v: &[u8]) {
    put_int(out, v.len() as i32);
    out.extend_from_slice(v);
}

pub fn put_string(out: &mut Vec<u8>, v: &str) {
    put_bytes(out, v.as_bytes());
}

pub fn read_bool<R: Read>(r: &mut R) -> Result<bool, Error> {
    match r.read_u8().map_err(|_| Error::ShortBuffer("bool"))? {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(Error::Corrupt(format!("invalid bool byte: {b:#04x}"))),
    }
}

pub fn read_int<R: Read>(r: &mut R) -> Result<i32, Error> {
    r.read_i32::<BigEndian>()
        .map_err(|_| Error::ShortBuffer("int"))
}

pub fn read_bytes<R: Read>(r: &mut R) -> Result<Vec<u8>, Error> {
    let len = read_int(r)?;
    if len < 0 {
        return Err(Error::Corrupt(format!("negative length prefix: {len}")));
    }
    let mut buf = vec![0_u8; len as usize];
    r.read_exact(&mut buf)
        .map_err(|_| Error::ShortBuffer("bytes"))?;
    Ok(buf)
}

pub fn read_string<R: Read>(r: &mut R) -> Result<String, Error> {
    let bytes = read_bytes(r)?;
    String::from_utf8(bytes).map_err(|e| Error::Corrupt(format!("invalid utf-8 string: {e}")))
}
