//! Line plots through Python [Matplotlib][]'s explicit interface.
//!
//! Only what result plotting needs is wrapped: a figure with one set
//! of axes, X-Y lines with a label and a colour, axis labels, a legend
//! and saving to a file.  The figure is a plain
//! `matplotlib.figure.Figure`, so no GUI backend is involved.
//!
//! [Matplotlib]: https://matplotlib.org/

use std::{
    fmt::{Display, Formatter},
    path::Path,
};
use lazy_static::lazy_static;
use numpy::PyArray1;
use pyo3::{
    prelude::*,
    exceptions::{PyFileNotFoundError, PyPermissionError},
    types::{PyDict, PyModule},
};

/// Possible errors of the plotting functions.
#[derive(Debug)]
pub enum Error {
    /// The Python library "matplotlib" was not found.
    NoMatplotlib,
    /// The path contains an element that is not a directory or does
    /// not exist.
    FileNotFoundError,
    /// Permission denied to access or create the filesystem path.
    PermissionError,
    /// The abscissas and ordinates of a line differ in length.
    LengthMismatch { x: usize, y: usize },
    /// Other Python errors.
    Python(PyErr),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::NoMatplotlib =>
                write!(f, "The matplotlib library has not been found.\n\
Please install it.  See https://matplotlib.org/\n\
If you use Anaconda, see https://github.com/PyO3/pyo3/issues/1554"),
            Error::FileNotFoundError =>
                write!(f, "A path contains an element that is not a \
                           directory or does not exist"),
            Error::PermissionError =>
                write!(f, "Permission denied to access or create the \
                           filesystem path"),
            Error::LengthMismatch { x, y } =>
                write!(f, "Cannot plot {y} ordinates against {x} \
                           abscissas"),
            Error::Python(e) =>
                write!(f, "Python error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<PyErr> for Error {
    fn from(e: PyErr) -> Self { Error::Python(e) }
}

/// Import and return a handle to the module `$m`.
macro_rules! pyimport { ($m: literal) => {
    Python::with_gil(|py|
        PyModule::import_bound(py, $m).map(|m| m.unbind()))
}}

lazy_static! {
    static ref FIGURE: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.figure")
    };
}

/// Return a handle to the module `$m`.
/// ⚠ This may try to lock Python's GIL.  Make sure it is executed
/// outside a call to `Python::with_gil`.
macro_rules! pymod { ($m: ident) => {
    $m.as_ref().map_err(|_| Error::NoMatplotlib)
}}

/// The top level container for all the plot elements.
#[derive(Debug)]
pub struct Figure {
    fig: PyObject, // instance of matplotlib.figure.Figure
}

/// One set of axes of a [`Figure`].
#[derive(Debug, Clone)]
pub struct Axes {
    ax: PyObject,
}

impl Figure {
    /// Return a new `Figure`.
    ///
    /// Return an error if Matplotlib is not present on the system.
    pub fn new() -> Result<Figure, Error> {
        let figure = pymod!(FIGURE)?;
        Python::with_gil(|py| {
            let fig = figure.bind(py).getattr("Figure")?.call0()?;
            Ok(Figure { fig: fig.unbind() })
        })
    }

    /// Add a set of axes filling the figure (`add_subplot(111)`).
    pub fn add_subplot(&self) -> Result<Axes, Error> {
        Python::with_gil(|py| {
            let ax = self.fig.bind(py).call_method1("add_subplot", (111,))?;
            Ok(Axes { ax: ax.unbind() })
        })
    }

    pub fn save(&self) -> Savefig {
        Python::with_gil(|py| {
            Savefig { fig: self.fig.clone_ref(py), dpi: None }
        })
    }
}

/// Return a new figure with a single set of axes.
pub fn subplots() -> Result<(Figure, Axes), Error> {
    let fig = Figure::new()?;
    let ax = fig.add_subplot()?;
    Ok((fig, ax))
}

pub struct Savefig {
    fig: PyObject,
    dpi: Option<f64>,
}

impl Savefig {
    pub fn dpi(&mut self, dpi: f64) -> &mut Self {
        if dpi > 0. {
            self.dpi = Some(dpi);
        } else {
            self.dpi = None;
        }
        self
    }

    /// Write the figure to `path`, replacing any existing file.  The
    /// image format is deduced from the extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        Python::with_gil(|py| {
            let kwargs = PyDict::new_bound(py);
            if let Some(dpi) = self.dpi {
                kwargs.set_item("dpi", dpi)?;
            }
            self.fig.bind(py)
                .call_method("savefig", (path.as_ref(),), Some(&kwargs))
                .map_err(|e| {
                    if e.is_instance_of::<PyFileNotFoundError>(py) {
                        Error::FileNotFoundError
                    } else if e.is_instance_of::<PyPermissionError>(py) {
                        Error::PermissionError
                    } else {
                        Error::Python(e)
                    }
                })?;
            Ok(())
        })
    }
}

impl Axes {
    fn set(&mut self, method: &str, v: &str) -> Result<&mut Self, Error> {
        Python::with_gil(|py| -> PyResult<()> {
            self.ax.bind(py).call_method1(method, (v,))?;
            Ok(())
        })?;
        Ok(self)
    }

    fn get_str(&self, method: &str) -> Result<String, Error> {
        Python::with_gil(|py| {
            Ok(self.ax.bind(py).call_method0(method)?.extract()?)
        })
    }

    /// Plot `y` versus `x` as a line.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plot_results::plot;
    /// let (fig, mut ax) = plot::subplots()?;
    /// ax.xy(&[1., 2., 3., 4.], &[1., 4., 2., 3.]).color("r").plot()?;
    /// fig.save().to_file("target/XY_plot.png")?;
    /// # Ok::<(), plot::Error>(())
    /// ```
    #[must_use]
    pub fn xy<'a>(&'a mut self, x: &'a [f64], y: &'a [f64]) -> Line<'a> {
        // We mutably borrow `self` to reflect that the final `.plot()`
        // will mutate the underlying Python object.
        Line { axes: self, x, y, options: PlotOptions::new() }
    }

    pub fn set_title(&mut self, v: &str) -> Result<&mut Self, Error> {
        self.set("set_title", v)
    }

    pub fn set_xlabel(&mut self, label: &str) -> Result<&mut Self, Error> {
        self.set("set_xlabel", label)
    }

    pub fn set_ylabel(&mut self, label: &str) -> Result<&mut Self, Error> {
        self.set("set_ylabel", label)
    }

    pub fn grid(&mut self) -> Result<&mut Self, Error> {
        Python::with_gil(|py| -> PyResult<()> {
            self.ax.bind(py).call_method1("grid", (true,))?;
            Ok(())
        })?;
        Ok(self)
    }

    /// Place a legend built from the labels of the plotted lines.
    pub fn legend(&mut self) -> Result<&mut Self, Error> {
        Python::with_gil(|py| -> PyResult<()> {
            self.ax.bind(py).call_method0("legend")?;
            Ok(())
        })?;
        Ok(self)
    }

    pub fn xlabel(&self) -> Result<String, Error> {
        self.get_str("get_xlabel")
    }

    pub fn ylabel(&self) -> Result<String, Error> {
        self.get_str("get_ylabel")
    }

    /// Number of lines drawn on these axes.
    pub fn line_count(&self) -> Result<usize, Error> {
        Python::with_gil(|py| {
            Ok(self.ax.bind(py).call_method0("get_lines")?.len()?)
        })
    }

    /// Texts of the legend entries, empty if there is no legend.
    pub fn legend_labels(&self) -> Result<Vec<String>, Error> {
        Python::with_gil(|py| {
            let legend = self.ax.bind(py).call_method0("get_legend")?;
            if legend.is_none() {
                return Ok(vec![]);
            }
            let mut labels = vec![];
            for t in legend.call_method0("get_texts")?.iter()? {
                labels.push(t?.call_method0("get_text")?.extract()?);
            }
            Ok(labels)
        })
    }
}

#[derive(Clone)]
struct PlotOptions<'a> {
    fmt: &'a str,
    label: &'a str,
    color: Option<&'a str>,
    linewidth: Option<f64>,
}

impl<'a> PlotOptions<'a> {
    fn new() -> PlotOptions<'static> {
        PlotOptions { fmt: "", label: "", color: None, linewidth: None }
    }

    fn kwargs<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let kwargs = PyDict::new_bound(py);
        if !self.label.is_empty() {
            kwargs.set_item("label", self.label)?
        }
        if let Some(c) = self.color {
            kwargs.set_item("color", c)?
        }
        if let Some(w) = self.linewidth {
            kwargs.set_item("linewidth", w)?
        }
        Ok(kwargs)
    }
}

/// A line waiting to be drawn by [`Line::plot`].
#[must_use]
pub struct Line<'a> {
    axes: &'a Axes,
    x: &'a [f64],
    y: &'a [f64],
    options: PlotOptions<'a>,
}

impl<'a> Line<'a> {
    /// Matplotlib format string such as `"r"` or `"b."`.
    pub fn fmt(mut self, fmt: &'a str) -> Self {
        self.options.fmt = fmt;
        self
    }

    /// Legend entry of the line.
    pub fn label(mut self, label: &'a str) -> Self {
        self.options.label = label;
        self
    }

    /// Any Matplotlib colour specification (`"r"`, `"tab:blue"`,...).
    pub fn color(mut self, color: &'a str) -> Self {
        self.options.color = Some(color);
        self
    }

    pub fn linewidth(mut self, w: f64) -> Self {
        self.options.linewidth = Some(w);
        self
    }

    /// Plot the data with the options specified in [`Line`].
    pub fn plot(self) -> Result<(), Error> {
        if self.x.len() != self.y.len() {
            return Err(Error::LengthMismatch { x: self.x.len(),
                                               y: self.y.len() });
        }
        Python::with_gil(|py| {
            let xn = PyArray1::from_slice_bound(py, self.x);
            let yn = PyArray1::from_slice_bound(py, self.y);
            let kwargs = self.options.kwargs(py)?;
            self.axes.ax.bind(py)
                .call_method("plot", (xn, yn, self.options.fmt),
                             Some(&kwargs))?;
            Ok(())
        })
    }
}
