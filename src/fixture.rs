//! Test-only writer for MAT v4 files and Dymola result layouts.

use std::{fs, path::Path};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use crate::mat4::Endian;

#[derive(Debug, Clone, Copy)]
pub enum Elem {
    F64,
    F32,
    I32,
    I16,
    U8,
}

impl Elem {
    fn digit(self) -> i32 {
        match self {
            Elem::F64 => 0,
            Elem::F32 => 1,
            Elem::I32 => 2,
            Elem::I16 => 3,
            Elem::U8 => 5,
        }
    }
}

pub struct MatWriter {
    endian: Endian,
    buf: Vec<u8>,
}

impl MatWriter {
    pub fn new(endian: Endian) -> Self {
        MatWriter { endian, buf: vec![] }
    }

    fn i32(&mut self, x: i32) {
        let r = match self.endian {
            Endian::Little => self.buf.write_i32::<LittleEndian>(x),
            Endian::Big => self.buf.write_i32::<BigEndian>(x),
        };
        r.unwrap()
    }

    fn elem(&mut self, ty: Elem, x: f64) {
        let b = &mut self.buf;
        let r = match (self.endian, ty) {
            (_, Elem::U8) => b.write_u8(x as u8),
            (Endian::Little, Elem::F64) => b.write_f64::<LittleEndian>(x),
            (Endian::Little, Elem::F32) =>
                b.write_f32::<LittleEndian>(x as f32),
            (Endian::Little, Elem::I32) =>
                b.write_i32::<LittleEndian>(x as i32),
            (Endian::Little, Elem::I16) =>
                b.write_i16::<LittleEndian>(x as i16),
            (Endian::Big, Elem::F64) => b.write_f64::<BigEndian>(x),
            (Endian::Big, Elem::F32) => b.write_f32::<BigEndian>(x as f32),
            (Endian::Big, Elem::I32) => b.write_i32::<BigEndian>(x as i32),
            (Endian::Big, Elem::I16) => b.write_i16::<BigEndian>(x as i16),
        };
        r.unwrap()
    }

    fn matrix(&mut self, name: &str, rows: usize, cols: usize, ty: Elem,
              text: bool, column_major: &[f64]) {
        assert_eq!(rows * cols, column_major.len());
        let m = match self.endian { Endian::Little => 0, Endian::Big => 1 };
        self.i32(m * 1000 + ty.digit() * 10 + text as i32);
        self.i32(rows as i32);
        self.i32(cols as i32);
        self.i32(0);
        self.i32(name.len() as i32 + 1);
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(0);
        for &x in column_major {
            self.elem(ty, x);
        }
    }

    /// Numeric matrix given in column-major order.
    pub fn numeric(&mut self, name: &str, rows: usize, cols: usize,
                   ty: Elem, column_major: &[f64]) {
        self.matrix(name, rows, cols, ty, false, column_major)
    }

    /// Text matrix with one (blank padded) string per row.
    pub fn text_rows(&mut self, name: &str, strings: &[&str]) {
        let width = strings.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut data = vec![b' ' as f64; strings.len() * width];
        for (r, s) in strings.iter().enumerate() {
            for (c, ch) in s.bytes().enumerate() {
                data[r + c * strings.len()] = ch as f64;
            }
        }
        self.matrix(name, strings.len(), width, Elem::U8, true, &data)
    }

    /// Text matrix with one (NUL padded) string per column.
    pub fn text_columns(&mut self, name: &str, strings: &[&str]) {
        let width = strings.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut data = vec![0.; strings.len() * width];
        for (c, s) in strings.iter().enumerate() {
            for (r, ch) in s.bytes().enumerate() {
                data[r + c * width] = ch as f64;
            }
        }
        self.matrix(name, width, strings.len(), Elem::U8, true, &data)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// One variable of a synthetic Dymola result.
pub struct Var<'a> {
    pub name: &'a str,
    pub description: &'a str,
    /// `(block, signed 1-based column)`.
    pub info: (i32, i32),
}

/// A synthetic Dymola result file.  `data_1` and `data_2` are given
/// signal by signal, the first signal of each being its time vector.
pub struct DymolaFile<'a> {
    pub endian: Endian,
    pub transposed: bool,
    pub elem: Elem,
    pub vars: Vec<Var<'a>>,
    pub data_1: Vec<Vec<f64>>,
    pub data_2: Vec<Vec<f64>>,
}

impl<'a> DymolaFile<'a> {
    /// Time `[0, 1]`, `A` = [1, 2], `B` = [1, 3], `-B` as an alias
    /// `negB` and a parameter `p` = 5.
    pub fn simple() -> Self {
        DymolaFile {
            endian: Endian::Little,
            transposed: true,
            elem: Elem::F64,
            vars: vec![
                Var { name: "Time", description: "Simulation time [s]",
                      info: (0, 1) },
                Var { name: "p", description: "A parameter",
                      info: (1, 2) },
                Var { name: "A", description: "First signal",
                      info: (2, 2) },
                Var { name: "B", description: "Second signal",
                      info: (2, 3) },
                Var { name: "negB", description: "", info: (2, -3) },
            ],
            data_1: vec![vec![0., 1.], vec![5., 5.]],
            data_2: vec![vec![0., 1.], vec![1., 2.], vec![1., 3.]],
        }
    }

    fn signals(&self, w: &mut MatWriter, name: &str, signals: &[Vec<f64>]) {
        let n = signals.first().map_or(0, |s| s.len());
        if self.transposed {
            // One signal per row.
            let mut data = Vec::with_capacity(n * signals.len());
            for t in 0 .. n {
                for s in signals {
                    data.push(s[t]);
                }
            }
            w.numeric(name, signals.len(), n, self.elem, &data);
        } else {
            let data: Vec<f64> = signals.iter().flatten().copied().collect();
            w.numeric(name, n, signals.len(), self.elem, &data);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = MatWriter::new(self.endian);
        let order = if self.transposed { "binTrans" } else { "binNormal" };
        w.text_rows("Aclass", &["Atrajectory", "1.1", "", order]);
        let names: Vec<&str> = self.vars.iter().map(|v| v.name).collect();
        let descr: Vec<&str> =
            self.vars.iter().map(|v| v.description).collect();
        let mut info = vec![];
        if self.transposed {
            w.text_columns("name", &names);
            w.text_columns("description", &descr);
            for v in &self.vars {
                info.extend([v.info.0 as f64, v.info.1 as f64, 0., 0.]);
            }
            w.numeric("dataInfo", 4, self.vars.len(), Elem::I32, &info);
        } else {
            w.text_rows("name", &names);
            w.text_rows("description", &descr);
            for k in 0 .. 4 {
                for v in &self.vars {
                    info.push(match k {
                        0 => v.info.0 as f64,
                        1 => v.info.1 as f64,
                        _ => 0.,
                    });
                }
            }
            w.numeric("dataInfo", self.vars.len(), 4, Elem::I32, &info);
        }
        self.signals(&mut w, "data_1", &self.data_1);
        self.signals(&mut w, "data_2", &self.data_2);
        w.finish()
    }

    pub fn write(&self, path: impl AsRef<Path>) {
        fs::write(path, self.to_bytes()).unwrap()
    }
}
