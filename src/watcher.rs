//! Turns filesystem notifications for the input directory into a queue of report paths.

use crate::errors::ConfigError;
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

pub const REPORT_FILE_EXTENSION: &str = "xml";

pub fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| extension.eq_ignore_ascii_case(REPORT_FILE_EXTENSION))
}

/// Report files that an event announces as newly present in the directory, or as finished
/// being written. A report read straight after its creation may still be partial, so the
/// close after writing queues it again where the platform reports one.
pub fn arrived_reports(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::File | CreateKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        | EventKind::Access(AccessKind::Close(AccessMode::Write)) => event
            .paths
            .iter()
            .filter(|path| is_report_file(path))
            .cloned()
            .collect(),
        _ => vec![],
    }
}

/// Starts watching `directory`, queueing each arriving report in the order it is announced.
/// Watching stops when the returned watcher is dropped.
pub fn watch_directory(
    directory: &Path,
    arrivals: UnboundedSender<PathBuf>,
) -> Result<RecommendedWatcher, ConfigError> {
    if !directory.is_dir() {
        return Err(ConfigError::WatchDirectoryNotFound(directory.to_path_buf()));
    }
    let watch_failed = |source| ConfigError::WatchFailed {
        path: directory.to_path_buf(),
        source,
    };

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        match event {
            Ok(event) => {
                for path in arrived_reports(&event) {
                    if arrivals.send(path).is_err() {
                        debug!("Report queue has closed, dropping file event");
                    }
                }
            }
            Err(error) => warn!("Error while watching input directory: {error}"),
        }
    })
    .map_err(watch_failed)?;
    watcher
        .watch(directory, RecursiveMode::NonRecursive)
        .map_err(watch_failed)?;

    Ok(watcher)
}
