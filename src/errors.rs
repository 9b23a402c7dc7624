use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the process before it can serve a single report.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration value {0} is missing or blank")]
    MissingSetting(&'static str),
    #[error("Could not read settings file {path}: {source}")]
    UnreadableSettings {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("Reference data file {path} could not be opened: {source}")]
    ReferenceDataUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Reference data is malformed: {0}")]
    ReferenceDataMalformed(#[from] quick_xml::de::DeError),
    #[error("Reference data {table} factor for tier {tier} is {value}, expected a finite non-negative number")]
    InvalidFactor {
        table: &'static str,
        tier: &'static str,
        value: f64,
    },
    #[error("Input directory {0} does not exist")]
    WatchDirectoryNotFound(PathBuf),
    #[error("Could not watch input directory {path}: {source}")]
    WatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("Output directory {path} could not be prepared: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A report file that could not be turned into a [`crate::input::GenerationReport`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("report is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("report structure is invalid: {0}")]
    Xml(#[from] quick_xml::de::DeError),
    #[error("{category} generator '{generator}' has {field} of {value}, expected a finite non-negative number")]
    InvalidNumber {
        category: &'static str,
        generator: String,
        field: &'static str,
        value: f64,
    },
    #[error("{category} generator name '{generator}' appears more than once")]
    DuplicateGenerator {
        category: &'static str,
        generator: String,
    },
}

/// A single output row that could not be computed. The rest of the report is unaffected.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ComputationError {
    #[error("Coal generator '{generator}' has an actual net generation of {actual_net_generation}, so its heat rate is undefined")]
    UndefinedHeatRate {
        generator: String,
        actual_net_generation: f64,
    },
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{field} for generator '{generator}' is {value}, which cannot be written out")]
    NonFinite {
        generator: String,
        field: &'static str,
        value: f64,
    },
    #[error("could not serialize output: {0}")]
    Xml(#[from] quick_xml::de::DeError),
}

/// Stages a report file passes through, used to label log events. Aggregation failures are
/// per row and never abandon a file, so [`FileError::stage`] is never `Aggregating`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Reading,
    Decoding,
    Aggregating,
    Encoding,
    Writing,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Reading => "reading",
            Stage::Decoding => "decoding",
            Stage::Aggregating => "aggregating",
            Stage::Encoding => "encoding",
            Stage::Writing => "writing",
        })
    }
}

/// Failure of one report file. The file is skipped and the pipeline carries on.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Could not read report: {0}")]
    Read(#[source] io::Error),
    #[error("Could not decode report: {0}")]
    Decode(#[from] DecodeError),
    #[error("Could not encode results: {0}")]
    Encode(#[from] EncodeError),
    #[error("Could not write results: {0}")]
    Write(#[source] anyhow::Error),
}

impl FileError {
    pub fn stage(&self) -> Stage {
        match self {
            FileError::Read(_) => Stage::Reading,
            FileError::Decode(_) => Stage::Decoding,
            FileError::Encode(_) => Stage::Encoding,
            FileError::Write(_) => Stage::Writing,
        }
    }
}

/// Errors that stop the pipeline once it is running.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("Output location can no longer be written to")]
    OutputUnusable,
    #[error("Report processing task failed: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),
}
