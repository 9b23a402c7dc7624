use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const OUTPUT_LOCATION_KEY: &str = "GenerationOutput";
pub const OUTPUT_FILE_EXTENSION: &str = "xml";

pub trait Output: Debug + Sync + Send {
    /// Replaces the artifact stored under the given key with the given contents. A reader
    /// sees either the previous artifact or the new one, never a partial write.
    fn publish(&self, location_key: &str, contents: &[u8]) -> anyhow::Result<()>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
    /// Whether the output can still accept artifacts at all.
    fn is_usable(&self) -> bool {
        true
    }
}

/// Writes artifacts as `<location key>.xml` files in a single directory.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_extension: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_extension: String) -> Self {
        Self {
            directory_path,
            file_extension,
        }
    }

    pub fn directory_path(&self) -> &Path {
        &self.directory_path
    }

    pub fn path_for_location_key(&self, location_key: &str) -> PathBuf {
        self.directory_path
            .join(format!("{location_key}.{}", self.file_extension))
    }
}

impl Output for FileOutput {
    fn publish(&self, location_key: &str, contents: &[u8]) -> anyhow::Result<()> {
        // the temporary file has to share a filesystem with the target for the rename to be atomic
        let mut staged = NamedTempFile::new_in(&self.directory_path)?;
        staged.write_all(contents)?;
        staged.as_file().sync_all()?;
        staged.persist(self.path_for_location_key(location_key))?;

        Ok(())
    }

    fn is_usable(&self) -> bool {
        fs::metadata(&self.directory_path).is_ok_and(|metadata| metadata.is_dir())
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn publish(&self, _location_key: &str, _contents: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_noop(&self) -> bool {
        true
    }
}
