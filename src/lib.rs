pub mod aggregation;
pub mod config;
pub mod errors;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod reference_data;
pub mod results;
pub mod watcher;


use crate::config::Settings;
use crate::errors::ConfigError;
use crate::output::{FileOutput, OUTPUT_FILE_EXTENSION};
use crate::pipeline::{Pipeline, PipelineStats};
use crate::reference_data::ReferenceData;
use crate::watcher::watch_directory;
use std::fs;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Loads reference data and prepares the output directory. Anything that fails here means no
/// report could ever be processed, so errors are fatal.
pub fn prepare_pipeline(settings: &Settings) -> Result<Pipeline<FileOutput>, ConfigError> {
    let reference_data = ReferenceData::load(&settings.reference_data_path)?;

    fs::create_dir_all(&settings.output_directory).map_err(|source| {
        ConfigError::OutputDirectory {
            path: settings.output_directory.clone(),
            source,
        }
    })?;

    Ok(Pipeline::new(
        Arc::new(reference_data),
        FileOutput::new(
            settings.output_directory.clone(),
            OUTPUT_FILE_EXTENSION.to_string(),
        ),
    ))
}

/// Watches the input directory and processes each report that arrives until `shutdown` completes.
pub async fn watch_and_process(
    settings: &Settings,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<PipelineStats> {
    let pipeline = prepare_pipeline(settings)?;
    let input_directory = settings.input_directory()?;

    let (sender, arrivals) = mpsc::unbounded_channel();
    let _watcher = watch_directory(input_directory, sender)?;
    info!(
        "Watching for new XML files in {}, writing results to {}",
        input_directory.display(),
        pipeline.output().directory_path().display()
    );

    Ok(Arc::new(pipeline).run(arrivals, shutdown).await?)
}
