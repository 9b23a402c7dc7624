use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// Settings as they appear in `appsettings.json`. Every value can also be supplied on the command line.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    pub reference_data_path: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Settings that have been checked for presence.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub reference_data_path: PathBuf,
    pub input_directory: Option<PathBuf>,
    pub output_directory: PathBuf,
}

impl AppSettings {
    pub fn from_json(json: impl Read) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(json))?)
    }

    /// Reads settings from the given file. Without a path the default settings file is tried,
    /// and its absence is not an error since the command line may provide every value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_SETTINGS_FILE), false),
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound && !required => {
                return Ok(Self::default())
            }
            Err(error) => {
                return Err(ConfigError::UnreadableSettings {
                    path: path.to_path_buf(),
                    source: error.into(),
                })
            }
        };

        Self::from_json(file).map_err(|source| ConfigError::UnreadableSettings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_overrides(
        self,
        reference_data_path: Option<String>,
        input: Option<String>,
        output: Option<String>,
    ) -> Self {
        Self {
            reference_data_path: reference_data_path.or(self.reference_data_path),
            input: input.or(self.input),
            output: output.or(self.output),
        }
    }

    pub fn resolve(self) -> Result<Settings, ConfigError> {
        Ok(Settings {
            reference_data_path: required(self.reference_data_path, "ReferenceDataPath")?,
            input_directory: non_blank(self.input).map(PathBuf::from),
            output_directory: required(self.output, "Output")?,
        })
    }
}

impl Settings {
    pub fn input_directory(&self) -> Result<&Path, ConfigError> {
        self.input_directory
            .as_deref()
            .ok_or(ConfigError::MissingSetting("Input"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn required(value: Option<String>, name: &'static str) -> Result<PathBuf, ConfigError> {
    non_blank(value)
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingSetting(name))
}
