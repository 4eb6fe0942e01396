//! The plotting run: which file, which variables, where the image goes.

use std::path::{Path, PathBuf};
use log::info;
use crate::{
    plot::{self, Axes, Figure},
    reader::{Reader, Simulator, TimeSeries},
    Error,
};

/// A variable to plot and how its line looks.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub variable: String,
    pub label: String,
    /// Matplotlib colour specification.
    pub color: String,
}

impl Selection {
    pub fn new(variable: &str, label: &str, color: &str) -> Self {
        Selection { variable: variable.into(), label: label.into(),
                    color: color.into() }
    }
}

/// Everything one run needs.  [`Job::default`] is the enthalpy flow
/// rate sensor comparison.
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub simulator: Simulator,
    pub selections: Vec<Selection>,
    pub xlabel: String,
    pub ylabel: String,
    pub output: PathBuf,
}

impl Default for Job {
    fn default() -> Self {
        Job {
            input: "Annex60.Fluid.Sensors.Examples.\
                    MoistAirEnthalpyFlowRate_res.mat".into(),
            simulator: Simulator::Dymola,
            selections: vec![
                Selection::new("senHLat_flow.wrong", "wrong", "r"),
                Selection::new("senHLat_flow.hMed_out", "hMed_out", "b"),
            ],
            xlabel: "time [s]".into(),
            ylabel: "h".into(),
            output: "plot.png".into(),
        }
    }
}

/// One line to draw.
#[derive(Debug, Clone, Copy)]
pub struct Trace<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub label: &'a str,
    pub color: &'a str,
}

impl Job {
    /// Fetch the selected variables, in order.
    pub fn extract(&self, reader: &Reader) -> Result<Vec<TimeSeries>, Error> {
        self.selections.iter()
            .map(|s| {
                let series = reader.values(&s.variable)?;
                info!("Extracted {:?} ({} samples)", s.variable, series.len());
                Ok::<_, Error>(series)
            })
            .collect()
    }

    /// Pair extracted series with their labels and colours.
    pub fn traces<'a>(&'a self, series: &'a [TimeSeries]) -> Vec<Trace<'a>> {
        self.selections.iter().zip(series)
            .map(|(s, ts)| Trace { x: ts.time(), y: ts.values(),
                                   label: &s.label, color: &s.color })
            .collect()
    }

    /// Read, extract and plot.
    pub fn run(&self) -> Result<(), Error> {
        let reader = Reader::open(&self.input, self.simulator)?;
        let series = self.extract(&reader)?;
        drop(reader);
        render(&self.traces(&series), &self.xlabel, &self.ylabel,
               &self.output)
    }
}

/// Draw `traces` on one set of axes with axis labels and a legend.
pub fn draw(
    traces: &[Trace], xlabel: &str, ylabel: &str,
) -> Result<(Figure, Axes), Error> {
    let (fig, mut ax) = plot::subplots()?;
    for t in traces {
        ax.xy(t.x, t.y).label(t.label).color(t.color).plot()?;
    }
    ax.set_xlabel(xlabel)?.set_ylabel(ylabel)?.legend()?;
    Ok((fig, ax))
}

/// [`draw`] then save to `path`, overwriting it.
pub fn render(
    traces: &[Trace], xlabel: &str, ylabel: &str, path: &Path,
) -> Result<(), Error> {
    let (fig, _ax) = draw(traces, xlabel, ylabel)?;
    fig.save().to_file(path)?;
    info!("Saved {}", path.display());
    Ok(())
}
