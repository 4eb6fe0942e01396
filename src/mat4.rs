//! Decoding of MATLAB level 4 MAT files.
//!
//! A level 4 file is a plain sequence of matrices.  Each one starts
//! with five 32-bit integers `(type, mrows, ncols, imagf, namlen)`,
//! then the NUL-terminated name, then the real part stored column
//! major and, if `imagf` is set, the imaginary part.
//!
//! The `type` word reads `M*1000 + O*100 + P*10 + T` where `M` is the
//! byte order (0 little endian, 1 big endian), `O` is always 0, `P`
//! the element type and `T` the matrix kind (0 numeric, 1 text,
//! 2 sparse).

use std::{
    collections::HashMap,
    io::{self, Cursor, Read},
};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, trace};
use ndarray::{Array2, ShapeBuilder};
use crate::Error;

const HEADER_LEN: usize = 20;

/// Byte order of a matrix as announced by its type word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Element type of the stored data (the `P` digit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    F64,
    F32,
    I32,
    I16,
    U16,
    U8,
}

impl Precision {
    fn from_digit(p: i32) -> Option<Self> {
        use Precision::*;
        Some(match p {
            0 => F64,
            1 => F32,
            2 => I32,
            3 => I16,
            4 => U16,
            5 => U8,
            _ => return None,
        })
    }

    fn size(self) -> usize {
        match self {
            Precision::F64 => 8,
            Precision::F32 | Precision::I32 => 4,
            Precision::I16 | Precision::U16 => 2,
            Precision::U8 => 1,
        }
    }
}

/// Decoded fields of a type word.
#[derive(Debug, Clone, Copy)]
struct TypeCode {
    endian: Endian,
    precision: Precision,
    text: bool,
}

impl TypeCode {
    /// Decode `mopt`, returning `None` if it is not a valid level 4
    /// type or if its `M` digit does not agree with `endian`.
    fn decode(mopt: i32, endian: Endian) -> Option<TypeCode> {
        if !(0..5000).contains(&mopt) {
            return None;
        }
        let m = mopt / 1000;
        let o = (mopt / 100) % 10;
        let p = (mopt / 10) % 10;
        let t = mopt % 10;
        let m_ok = match endian {
            Endian::Little => m == 0,
            Endian::Big => m == 1,
        };
        if !m_ok || o != 0 || t > 1 {
            return None;
        }
        Some(TypeCode { endian, precision: Precision::from_digit(p)?,
                        text: t == 1 })
    }

    /// Find out the byte order from the first four bytes of a header.
    fn sniff(word: [u8; 4]) -> Result<TypeCode, Error> {
        let le = LittleEndian::read_i32(&word);
        if let Some(tc) = TypeCode::decode(le, Endian::Little) {
            return Ok(tc);
        }
        let be = BigEndian::read_i32(&word);
        if let Some(tc) = TypeCode::decode(be, Endian::Big) {
            return Ok(tc);
        }
        Err(Error::Format(format!(
            "invalid MAT v4 type word {le} (only full numeric and text \
             matrices in IEEE byte order are supported)")))
    }
}

/// One matrix of a MAT v4 file, widened to `f64`.
#[derive(Debug, Clone)]
pub struct Matrix {
    pub name: String,
    /// Whether the matrix was flagged as text (`T = 1`).
    pub text: bool,
    /// Values in logical `(row, column)` shape.
    pub data: Array2<f64>,
}

fn decode_str<'a>(chars: impl Iterator<Item = &'a f64>) -> String {
    // Negative and NaN codes saturate to NUL, which is trimmed below.
    let s: String = chars
        .map(|&c| char::from_u32(c as u32).unwrap_or('\u{FFFD}'))
        .collect();
    s.trim_end_matches(|c| c == ' ' || c == '\0').to_string()
}

impl Matrix {
    pub fn nrows(&self) -> usize { self.data.nrows() }

    pub fn ncols(&self) -> usize { self.data.ncols() }

    /// Interpret the matrix as one string per row.
    pub fn row_strings(&self) -> Vec<String> {
        self.data.rows().into_iter().map(|r| decode_str(r.iter())).collect()
    }

    /// Interpret the matrix as one string per column.
    pub fn column_strings(&self) -> Vec<String> {
        self.data.columns().into_iter()
            .map(|c| decode_str(c.iter())).collect()
    }
}

fn truncated(what: &'static str, name: &str) -> impl Fn(io::Error) -> Error {
    let name = name.to_string();
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Format(format!("truncated {what} of matrix {name:?}"))
        } else {
            Error::Io(e)
        }
    }
}

fn read_values<B: ByteOrder>(
    cur: &mut Cursor<&[u8]>, precision: Precision, n: usize,
) -> io::Result<Vec<f64>> {
    let mut v = Vec::with_capacity(n);
    for _ in 0 .. n {
        let x = match precision {
            Precision::F64 => cur.read_f64::<B>()?,
            Precision::F32 => cur.read_f32::<B>()? as f64,
            Precision::I32 => cur.read_i32::<B>()? as f64,
            Precision::I16 => cur.read_i16::<B>()? as f64,
            Precision::U16 => cur.read_u16::<B>()? as f64,
            Precision::U8 => cur.read_u8()? as f64,
        };
        v.push(x);
    }
    Ok(v)
}

fn read_matrix<B: ByteOrder>(
    cur: &mut Cursor<&[u8]>, tc: TypeCode,
) -> Result<Matrix, Error> {
    let header = truncated("header", "");
    let _mopt = cur.read_i32::<B>().map_err(&header)?;
    let mrows = cur.read_i32::<B>().map_err(&header)?;
    let ncols = cur.read_i32::<B>().map_err(&header)?;
    let imagf = cur.read_i32::<B>().map_err(&header)?;
    let namlen = cur.read_i32::<B>().map_err(&header)?;
    if mrows < 0 || ncols < 0 || namlen < 0 {
        return Err(Error::Format(format!(
            "negative dimension in MAT v4 header \
             (mrows={mrows}, ncols={ncols}, namlen={namlen})")));
    }
    let (mrows, ncols) = (mrows as usize, ncols as usize);

    if namlen as u64 > cur.get_ref().len() as u64 - cur.position() {
        return Err(Error::Format("truncated name of MAT v4 matrix".into()));
    }
    let mut raw_name = vec![0; namlen as usize];
    cur.read_exact(&mut raw_name).map_err(truncated("name", ""))?;
    let end = raw_name.iter().position(|&b| b == 0)
        .unwrap_or(raw_name.len());
    let name = String::from_utf8_lossy(&raw_name[.. end]).into_owned();

    let n = mrows.checked_mul(ncols)
        .ok_or_else(|| Error::Format(format!(
            "matrix {name:?} is too large ({mrows} x {ncols})")))?;
    let parts = if imagf != 0 { 2 } else { 1 };
    let remaining = cur.get_ref().len() as u64 - cur.position();
    let needed = n.checked_mul(tc.precision.size() * parts);
    if needed.map_or(true, |b| b as u64 > remaining) {
        return Err(Error::Format(format!(
            "truncated data of matrix {name:?} \
             ({mrows} x {ncols}, {remaining} bytes left)")));
    }
    let values = read_values::<B>(cur, tc.precision, n)
        .map_err(truncated("data", &name))?;
    if imagf != 0 {
        // Only the real part is kept.
        cur.set_position(cur.position() + (n * tc.precision.size()) as u64);
    }
    let data = Array2::from_shape_vec((mrows, ncols).f(), values)
        .map_err(|e| Error::Format(format!("matrix {name:?}: {e}")))?;
    trace!("MAT v4 matrix {name:?}: {mrows} x {ncols}, {:?}, {:?}",
           tc.precision, tc.endian);
    Ok(Matrix { name, text: tc.text, data })
}

/// Decode all matrices of a MAT v4 file, keyed by name.
///
/// When several matrices share a name, the last one wins.
pub fn parse(bytes: &[u8]) -> Result<HashMap<String, Matrix>, Error> {
    let mut cur = Cursor::new(bytes);
    let mut matrices = HashMap::new();
    while (cur.position() as usize) < bytes.len() {
        let pos = cur.position() as usize;
        if bytes.len() - pos < HEADER_LEN {
            return Err(Error::Format(format!(
                "truncated MAT v4 header at offset {pos}")));
        }
        let mut word = [0; 4];
        word.copy_from_slice(&bytes[pos .. pos + 4]);
        let tc = TypeCode::sniff(word)?;
        let m = match tc.endian {
            Endian::Little => read_matrix::<LittleEndian>(&mut cur, tc)?,
            Endian::Big => read_matrix::<BigEndian>(&mut cur, tc)?,
        };
        matrices.insert(m.name.clone(), m);
    }
    debug!("decoded {} MAT v4 matrices", matrices.len());
    Ok(matrices)
}
