//! Plot trajectories stored in [Dymola][] or [OpenModelica][] result
//! files with [Matplotlib][].
//!
//! Usage
//! -----
//!
//! ```no_run
//! use plot_results::{job, reader::{Reader, Simulator}};
//! let r = Reader::open("Model_res.mat", Simulator::Dymola)?;
//! let x = r.values("x")?;
//! let trace = job::Trace { x: x.time(), y: x.values(),
//!                          label: "x", color: "r" };
//! job::render(&[trace], "time [s]", "x",
//!             std::path::Path::new("x.png"))?;
//! # Ok::<(), plot_results::Error>(())
//! ```
//!
//! [Dymola]: https://www.3ds.com/products/catia/dymola
//! [OpenModelica]: https://openmodelica.org/
//! [Matplotlib]: https://matplotlib.org/

use std::{io, path::PathBuf};
use thiserror::Error;

pub mod mat4;
pub mod reader;
pub mod plot;
pub mod job;

#[cfg(test)]
mod fixture;

pub use job::Job;
pub use reader::{Reader, Simulator, TimeSeries};

/// Errors of reading a result file and plotting it.
#[derive(Debug, Error)]
pub enum Error {
    /// The result file does not exist.
    #[error("result file {} not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a result file this crate can decode.
    #[error("format error: {0}")]
    Format(String),

    #[error("variable {0:?} not found in result file")]
    VariableNotFound(String),

    /// Drawing or writing the image failed.
    #[error("render error: {0}")]
    Render(#[from] plot::Error),
}
