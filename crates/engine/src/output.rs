//! Filesystem bookkeeping for one update attempt.
//!
//! Writing the new artifact next to the seed has two hazards: the target
//! name may be the seed itself, and a failed attempt must not leave a
//! half-written file behind. [`OutputTransaction`] owns both: it renames a
//! colliding seed aside before the first byte is written and undoes
//! everything unless the caller commits.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::EngineError;

/// Pending output file with rollback semantics.
///
/// The transaction implements [`Write`], so the merge driver streams
/// directly into it. Dropping an uncommitted transaction removes the
/// partial output and restores a renamed seed; [`commit`](Self::commit)
/// keeps the output and leaves the renamed seed in place as a backup.
#[derive(Debug)]
pub struct OutputTransaction {
    output_path: PathBuf,
    seed_path: PathBuf,
    renamed_from: Option<PathBuf>,
    file: Option<File>,
    committed: bool,
}

impl OutputTransaction {
    /// Prepares writing `filename` into the seed's directory.
    ///
    /// When the output path equals the seed path the seed is renamed to
    /// `<stem>-old.<ext>` first; [`seed_path`](Self::seed_path) then points
    /// at the renamed copy, which is the file the caller must read from.
    pub fn begin(seed_path: &Path, filename: &str) -> Result<Self, EngineError> {
        let output_path = seed_path
            .parent()
            .map_or_else(|| PathBuf::from(filename), |dir| dir.join(filename));

        let mut seed_read_path = seed_path.to_path_buf();
        let mut renamed_from = None;
        if output_path == seed_path {
            let aside = renamed_seed_path(seed_path);
            fs::rename(seed_path, &aside)?;
            debug!(seed = %seed_path.display(), renamed = %aside.display(), "seed renamed aside");
            renamed_from = Some(seed_path.to_path_buf());
            seed_read_path = aside;
        }

        let file = match open_output(&output_path) {
            Ok(file) => file,
            Err(err) => {
                // Undo the rename before surfacing the error.
                if renamed_from.is_some()
                    && let Err(undo) = fs::rename(&seed_read_path, seed_path)
                {
                    warn!(seed = %seed_path.display(), error = %undo, "failed to restore seed");
                }
                return Err(EngineError::Output(err));
            }
        };

        Ok(Self {
            output_path,
            seed_path: seed_read_path,
            renamed_from,
            file: Some(file),
            committed: false,
        })
    }

    /// Path the new artifact is being written to.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Path the seed can currently be read from (the renamed copy when the
    /// output collided with it).
    #[must_use]
    pub fn seed_path(&self) -> &Path {
        &self.seed_path
    }

    /// Keeps the output and returns its path. A seed renamed aside stays in
    /// place as a backup of the previous version.
    #[must_use]
    pub fn commit(mut self) -> PathBuf {
        self.file = None;
        self.committed = true;
        self.output_path.clone()
    }

    /// Removes the partial output and restores a renamed seed.
    pub fn rollback(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        self.file = None;

        if let Err(err) = fs::remove_file(&self.output_path)
            && err.kind() != io::ErrorKind::NotFound
        {
            warn!(output = %self.output_path.display(), error = %err, "failed to remove partial output");
        }
        if let Some(original) = self.renamed_from.take()
            && let Err(err) = fs::rename(&self.seed_path, &original)
        {
            warn!(seed = %original.display(), error = %err, "failed to restore seed");
        }
    }
}

impl Write for OutputTransaction {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("output transaction already closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("output transaction already closed"))?
            .flush()
    }
}

impl Drop for OutputTransaction {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn open_output(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }
    options.open(path)
}

fn renamed_seed_path(seed: &Path) -> PathBuf {
    let mut name = seed
        .file_stem()
        .map_or_else(|| OsString::from("seed"), std::ffi::OsStr::to_os_string);
    name.push("-old");
    if let Some(ext) = seed.extension() {
        name.push(".");
        name.push(ext);
    }
    seed.with_file_name(name)
}
