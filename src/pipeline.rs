use crate::aggregation::{aggregate, Aggregation};
use crate::errors::{FatalError, FileError, Stage};
use crate::input::decode_report;
use crate::output::{Output, OUTPUT_LOCATION_KEY};
use crate::reference_data::ReferenceData;
use crate::results::encode_output;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, info_span, warn};

/// What one successful pass over a report produced.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    pub totals: usize,
    pub max_emission_days: usize,
    pub heat_rates: usize,
    pub rows_left_out: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PipelineStats {
    pub processed: usize,
    pub skipped: usize,
}

/// Drives report files through decode, aggregate, encode and write, one file at a time.
#[derive(Debug)]
pub struct Pipeline<O: Output> {
    reference_data: Arc<ReferenceData>,
    output: O,
}

impl<O: Output> Pipeline<O> {
    pub fn new(reference_data: Arc<ReferenceData>, output: O) -> Self {
        Self {
            reference_data,
            output,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn process_file(&self, path: &Path) -> Result<RunSummary, FileError> {
        debug!(stage = %Stage::Reading, "Reading {}", path.display());
        let bytes = fs::read(path).map_err(FileError::Read)?;

        self.process_report(&bytes)
    }

    /// Runs one report through every stage. The output is only touched once everything before
    /// the write has succeeded.
    pub fn process_report(&self, bytes: &[u8]) -> Result<RunSummary, FileError> {
        debug!(stage = %Stage::Decoding);
        let report = decode_report(bytes)?;

        debug!(stage = %Stage::Aggregating);
        let Aggregation { output, row_errors } = aggregate(&report, &self.reference_data);
        for error in &row_errors {
            warn!("Leaving row out of results: {error}");
        }

        debug!(stage = %Stage::Encoding);
        let encoded = encode_output(&output)?;

        if !self.output.is_noop() {
            debug!(stage = %Stage::Writing);
            self.output
                .publish(OUTPUT_LOCATION_KEY, &encoded)
                .map_err(FileError::Write)?;
        }

        Ok(RunSummary {
            totals: output.totals.generators.len(),
            max_emission_days: output.max_emission_generators.days.len(),
            heat_rates: output.actual_heat_rates.heat_rates.len(),
            rows_left_out: row_errors.len(),
        })
    }
}

impl<O: Output + 'static> Pipeline<O> {
    /// Processes queued report paths in arrival order until the queue closes or `shutdown`
    /// completes. A file already being processed when shutdown is requested is finished first.
    pub async fn run(
        self: Arc<Self>,
        mut arrivals: UnboundedReceiver<PathBuf>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<PipelineStats, FatalError> {
        tokio::pin!(shutdown);
        let mut stats = PipelineStats::default();

        loop {
            let path = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, no further reports will be processed");
                    break;
                }
                arrival = arrivals.recv() => match arrival {
                    Some(path) => path,
                    None => break,
                },
            };

            info!("New file detected: {}", path.display());
            let pipeline = Arc::clone(&self);
            let span = info_span!("report", file = %path.display());
            let worker_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                span.in_scope(|| pipeline.process_file(&worker_path))
            })
            .await?;

            match result {
                Ok(summary) => {
                    stats.processed += 1;
                    info!(
                        "Processed {}: {} totals, {} max emission days, {} heat rates",
                        path.display(),
                        summary.totals,
                        summary.max_emission_days,
                        summary.heat_rates
                    );
                }
                Err(error) => {
                    stats.skipped += 1;
                    warn!(
                        stage = %error.stage(),
                        "Skipping {}: {error}",
                        path.display()
                    );
                    if matches!(error, FileError::Write(_)) && !self.output.is_usable() {
                        return Err(FatalError::OutputUnusable);
                    }
                }
            }
        }

        Ok(stats)
    }
}
