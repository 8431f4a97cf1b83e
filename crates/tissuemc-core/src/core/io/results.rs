use crate::core::detectors::DetectorResult;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultsIoError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML serialization error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::ser::Error,
    },
    #[error("Detector '{name}' has {found} values but its shape {shape:?} needs {expected}")]
    ShapeMismatch {
        name: String,
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },
}

/// One bin of a detector table. Edge columns are empty for axes the detector does not bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorRow {
    pub rho_start: Option<f64>,
    pub rho_end: Option<f64>,
    pub z_start: Option<f64>,
    pub z_end: Option<f64>,
    pub mean: f64,
    pub second_moment: Option<f64>,
    pub std_dev: Option<f64>,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn edge_pair(edges: Option<&Vec<f64>>, index: usize) -> (Option<f64>, Option<f64>) {
    match edges {
        Some(edges) => (edges.get(index).copied(), edges.get(index + 1).copied()),
        None => (None, None),
    }
}

/// Flattens a result into table rows, rho-major for two-dimensional detectors.
pub fn detector_rows(result: &DetectorResult) -> Result<Vec<DetectorRow>, ResultsIoError> {
    let expected: usize = result.shape.iter().product();
    if result.mean.len() != expected {
        return Err(ResultsIoError::ShapeMismatch {
            name: result.name.clone(),
            shape: result.shape.clone(),
            expected,
            found: result.mean.len(),
        });
    }
    let nz = result.shape.get(1).copied().unwrap_or(1);
    let nr = expected / nz;

    Ok((0..nr)
        .cartesian_product(0..nz)
        .enumerate()
        .map(|(index, (ir, iz))| {
            let (rho_start, rho_end) = edge_pair(result.rho_edges.as_ref(), ir);
            let (z_start, z_end) = edge_pair(result.z_edges.as_ref(), iz);
            DetectorRow {
                rho_start,
                rho_end,
                z_start,
                z_end,
                mean: result.mean[index],
                second_moment: result.second_moment.as_ref().map(|v| v[index]),
                std_dev: result.std_dev.as_ref().map(|v| v[index]),
            }
        })
        .collect())
}

pub fn write_detector_table<W: Write>(
    result: &DetectorResult,
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let rows = detector_rows(result).map_err(|e| {
        csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    })?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn read_detector_table(path: &Path) -> Result<Vec<DetectorRow>, ResultsIoError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ResultsIoError::Csv {
        path: path_string(path),
        source: e,
    })?;
    reader
        .deserialize::<DetectorRow>()
        .map(|row| {
            row.map_err(|e| ResultsIoError::Csv {
                path: path_string(path),
                source: e,
            })
        })
        .collect()
}

/// Writes `<dir>/<name>.csv` for every result and returns the written paths in name order.
pub fn write_detector_tables(
    dir: &Path,
    results: &BTreeMap<String, DetectorResult>,
) -> Result<Vec<PathBuf>, ResultsIoError> {
    fs::create_dir_all(dir).map_err(|e| ResultsIoError::Io {
        path: path_string(dir),
        source: e,
    })?;

    results
        .values()
        .map(|result| {
            detector_rows(result)?;
            let path = dir.join(format!("{}.csv", result.name));
            let file = File::create(&path).map_err(|e| ResultsIoError::Io {
                path: path_string(&path),
                source: e,
            })?;
            write_detector_table(result, BufWriter::new(file)).map_err(|e| {
                ResultsIoError::Csv {
                    path: path_string(&path),
                    source: e,
                }
            })?;
            Ok(path)
        })
        .collect()
}

pub fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ResultsIoError> {
    let content = toml::to_string_pretty(value).map_err(|e| ResultsIoError::Toml {
        path: path_string(path),
        source: e,
    })?;
    fs::write(path, content).map_err(|e| ResultsIoError::Io {
        path: path_string(path),
        source: e,
    })
}
