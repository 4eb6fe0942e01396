//! Trajectories of Dymola and OpenModelica result files.
//!
//! Both tools write their results as a MAT v4 file with the matrices
//! `Aclass`, `name`, `description`, `dataInfo`, `data_1` and `data_2`.
//! `Aclass` states the storage order: with `binTrans` every signal is
//! a row of its data block, with `binNormal` a column.  The first
//! signal of each data block is its time vector.

use std::{
    collections::HashMap,
    fmt::{self, Display},
    fs,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};
use log::{debug, info};
use ndarray::Array2;
use crate::{mat4, Error};

/// Tool that produced the result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simulator {
    Dymola,
    OpenModelica,
}

impl FromStr for Simulator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "dymola" => Ok(Simulator::Dymola),
            "openmodelica" => Ok(Simulator::OpenModelica),
            _ => Err(Error::Format(format!(
                "unknown simulator {s:?} (expected \"dymola\" or \
                 \"openmodelica\")"))),
        }
    }
}

impl Display for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Simulator::Dymola => f.write_str("dymola"),
            Simulator::OpenModelica => f.write_str("openmodelica"),
        }
    }
}

/// Samples of one variable.  `time` and `values` always have the
/// same length.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    time: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(
        name: impl Into<String>, time: Vec<f64>, values: Vec<f64>,
    ) -> Result<Self, Error> {
        let name = name.into();
        if time.len() != values.len() {
            return Err(Error::Format(format!(
                "variable {name:?} has {} values for {} time points",
                values.len(), time.len())));
        }
        Ok(TimeSeries { name, time, values })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn time(&self) -> &[f64] { &self.time }

    pub fn values(&self) -> &[f64] { &self.values }

    pub fn len(&self) -> usize { self.time.len() }

    pub fn is_empty(&self) -> bool { self.time.is_empty() }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.time, self.values)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Integral over time with the trapezoidal rule.
    pub fn integral(&self) -> f64 {
        self.time.windows(2).zip(self.values.windows(2))
            .map(|(t, v)| (t[1] - t[0]) * (v[0] + v[1]) / 2.)
            .sum()
    }

    /// Time average of the values.  Falls back to the arithmetic mean
    /// when all samples share the same time stamp.
    pub fn mean(&self) -> Option<f64> {
        let (t0, t1) = (self.time.first()?, self.time.last()?);
        let duration = t1 - t0;
        if duration > 0. {
            Some(self.integral() / duration)
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }
}

#[derive(Debug, Clone)]
struct VarInfo {
    description: String,
    block: usize,
    /// 0-based signal index inside the block.
    signal: usize,
    negated: bool,
}

/// An opened result file.
#[derive(Debug)]
pub struct Reader {
    path: PathBuf,
    simulator: Simulator,
    abscissa: (String, String),
    vars: HashMap<String, VarInfo>,
    /// Data blocks with one signal per row.
    blocks: HashMap<usize, Array2<f64>>,
}

fn matrix<'a>(
    mats: &'a HashMap<String, mat4::Matrix>, name: &str,
) -> Result<&'a mat4::Matrix, Error> {
    mats.get(name).ok_or_else(|| Error::Format(format!(
        "matrix {name:?} missing from result file")))
}

/// One `dataInfo` entry as an integer.
fn data_info_entry(x: f64, name: &str) -> Result<i64, Error> {
    if x.fract() != 0. {
        return Err(Error::Format(format!(
            "non-integral dataInfo entry {x} for {name:?}")));
    }
    i32::try_from(x as i64).map(i64::from).map_err(|_| Error::Format(format!(
        "dataInfo entry {x} for {name:?} out of range")))
}

/// Data block `b` with one signal per row.  The first row is time.
fn load_block(
    mats: &HashMap<String, mat4::Matrix>, b: usize, transposed: bool,
) -> Result<Array2<f64>, Error> {
    let m = matrix(mats, &format!("data_{b}"))?;
    let data = if transposed { m.data.clone() } else { m.data.t().to_owned() };
    if data.nrows() == 0 {
        return Err(Error::Format(format!("data_{b} has no time signal")));
    }
    Ok(data)
}

impl Reader {
    /// Read the result file at `path`.  The file is read at once and
    /// closed before decoding.
    pub fn open(
        path: impl AsRef<Path>, simulator: Simulator,
    ) -> Result<Reader, Error> {
        let path = path.as_ref();
        info!("Reading {} result file {}...", simulator, path.display());
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        debug!("{}: {} bytes", path.display(), bytes.len());
        let mut reader = Reader::from_bytes(&bytes, simulator)?;
        reader.path = path.to_path_buf();
        Ok(reader)
    }

    /// Decode a result file already in memory.
    pub fn from_bytes(
        bytes: &[u8], simulator: Simulator,
    ) -> Result<Reader, Error> {
        let mats = mat4::parse(bytes)?;

        let aclass = matrix(&mats, "Aclass")?.row_strings();
        let transposed = match aclass.as_slice() {
            [_, version, _, order, ..] if version == "1.1" => {
                match order.as_str() {
                    "binTrans" => true,
                    "binNormal" => false,
                    _ => return Err(Error::Format(format!(
                        "unsupported storage order {order:?}"))),
                }
            }
            _ => return Err(Error::Format(format!(
                "unsupported result file class {aclass:?}"))),
        };

        let strings = |m: &mat4::Matrix| {
            if transposed { m.column_strings() } else { m.row_strings() }
        };
        let names = strings(matrix(&mats, "name")?);
        let descriptions = match mats.get("description") {
            Some(m) => strings(m),
            None => vec![],
        };
        let data_info = matrix(&mats, "dataInfo")?;
        let records: Vec<Vec<f64>> = if transposed {
            data_info.data.columns().into_iter().map(|c| c.to_vec()).collect()
        } else {
            data_info.data.rows().into_iter().map(|r| r.to_vec()).collect()
        };
        if records.len() < names.len()
            || records.first().map_or(false, |r| r.len() < 2) {
            return Err(Error::Format(format!(
                "dataInfo describes {} variables, {} names given",
                records.len(), names.len())));
        }

        let mut abscissa = None;
        let mut vars = HashMap::with_capacity(names.len());
        let mut blocks = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            let description = descriptions.get(i).cloned().unwrap_or_default();
            let block = data_info_entry(records[i][0], name)?;
            let column = data_info_entry(records[i][1], name)?;
            if block == 0 || column.abs() == 1 {
                abscissa.get_or_insert((name.clone(), description));
                continue;
            }
            if block < 0 || column == 0 {
                return Err(Error::Format(format!(
                    "invalid dataInfo ({block}, {column}) for {name:?}")));
            }
            let block = block as usize;
            if !blocks.contains_key(&block) {
                blocks.insert(block, load_block(&mats, block, transposed)?);
            }
            let signal = (column.unsigned_abs() - 1) as usize;
            if signal >= blocks[&block].nrows() {
                return Err(Error::Format(format!(
                    "{name:?} refers to signal {} of data_{block} \
                     which has only {}", signal + 1, blocks[&block].nrows())));
            }
            vars.insert(name.clone(), VarInfo {
                description, block, signal, negated: column < 0 });
        }
        // The abscissa is read from data_2 when present.
        for b in [2, 1] {
            if blocks.contains_key(&b) { break }
            if mats.contains_key(&format!("data_{b}")) {
                blocks.insert(b, load_block(&mats, b, transposed)?);
                break;
            }
        }
        let abscissa = abscissa.unwrap_or_else(|| ("Time".into(), "".into()));
        debug!("{} variables, abscissa {:?}", vars.len(), abscissa.0);

        Ok(Reader { path: PathBuf::new(), simulator, abscissa, vars,
                    blocks })
    }

    /// Path the reader was opened from (empty for in-memory data).
    pub fn path(&self) -> &Path { &self.path }

    pub fn simulator(&self) -> Simulator { self.simulator }

    fn time_block(&self) -> Result<&Array2<f64>, Error> {
        self.blocks.get(&2).or_else(|| self.blocks.get(&1))
            .ok_or_else(|| Error::Format("no data block in result file".into()))
    }

    /// Return the time vector and the values of `name`.
    pub fn values(&self, name: &str) -> Result<TimeSeries, Error> {
        if name == self.abscissa.0 {
            let t = self.time_block()?.row(0).to_vec();
            return TimeSeries::new(name, t.clone(), t);
        }
        let var = self.vars.get(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_string()))?;
        let block = &self.blocks[&var.block];
        let time = block.row(0).to_vec();
        let values = block.row(var.signal).iter()
            .map(|&x| if var.negated { -x } else { x })
            .collect();
        TimeSeries::new(name, time, values)
    }

    /// Sorted names of all variables whose name contains `pattern`
    /// (all variables if `None`).
    pub fn var_names(&self, pattern: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = self.vars.keys()
            .chain(std::iter::once(&self.abscissa.0))
            .filter(|n| pattern.map_or(true, |p| n.contains(p)))
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn description(&self, name: &str) -> Result<&str, Error> {
        if name == self.abscissa.0 {
            return Ok(&self.abscissa.1);
        }
        self.vars.get(name).map(|v| v.description.as_str())
            .ok_or_else(|| Error::VariableNotFound(name.to_string()))
    }

    fn no_samples(name: &str) -> Error {
        Error::Format(format!("variable {name:?} has no samples"))
    }

    pub fn min(&self, name: &str) -> Result<f64, Error> {
        self.values(name)?.min().ok_or_else(|| Self::no_samples(name))
    }

    pub fn max(&self, name: &str) -> Result<f64, Error> {
        self.values(name)?.max().ok_or_else(|| Self::no_samples(name))
    }

    pub fn mean(&self, name: &str) -> Result<f64, Error> {
        self.values(name)?.mean().ok_or_else(|| Self::no_samples(name))
    }

    pub fn integral(&self, name: &str) -> Result<f64, Error> {
        Ok(self.values(name)?.integral())
    }
}
