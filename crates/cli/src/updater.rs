//! One zsync update attempt against a seed AppImage.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use checksums::Sha1Sum;
use control::{ChecksumIndex, ControlError, ControlHeader};
use engine::{
    CancellationFlag, DeltaUpdate, EngineError, FileSource, OutputTransaction, ProgressEvent,
    UpdateSummary,
};
use thiserror::Error;
use tracing::{debug, info};
use transfer::{FetchError, RangeSource, fetch_control, http_client, resolve_url};

/// Errors raised while looking up or applying an update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Fetching the control file failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The control file could not be decoded.
    #[error(transparent)]
    Control(#[from] ControlError),

    /// The delta reconstruction failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The seed could not be read for hashing or scanning.
    #[error("failed to read seed {}: {source}", .path.display())]
    SeedIo {
        /// Path of the seed file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Result of a successful update.
#[derive(Clone, Debug)]
pub struct UpdateReport {
    /// Where the new artifact was written.
    pub output: PathBuf,
    /// Byte accounting of the reconstruction.
    pub summary: UpdateSummary,
}

/// Drives one update of `seed_path` from a `.zsync` control file URL.
///
/// [`lookup`](Self::lookup) fetches the control file once and compares the
/// advertised artifact SHA-1 with the seed's; [`update`](Self::update)
/// reuses the fetched control file and performs the delta download inside an
/// [`OutputTransaction`], so any failure leaves the filesystem as it was.
#[derive(Debug)]
pub struct Updater {
    control_url: String,
    seed_path: PathBuf,
    control: Option<(ControlHeader, Vec<u8>)>,
}

impl Updater {
    /// Creates an updater for `seed_path` from the control file at
    /// `control_url`.
    #[must_use]
    pub fn new(control_url: String, seed_path: PathBuf) -> Self {
        Self {
            control_url,
            seed_path,
            control: None,
        }
    }

    /// Whether the published artifact differs from the seed.
    ///
    /// Returns `false` when the seed already hashes to the advertised
    /// SHA-1, in which case there is nothing to download.
    pub fn lookup(&mut self) -> Result<bool, UpdateError> {
        let (header, _) = self.control()?;
        let advertised = header.sha1.to_ascii_lowercase();

        let seed_sha1 = hash_file(&self.seed_path)?;
        debug!(seed = %seed_sha1, advertised = %advertised, "compared artifact digests");
        Ok(seed_sha1 != advertised)
    }

    /// Reconstructs the published artifact next to the seed.
    ///
    /// `progress` receives scan and merge events synchronously; `cancel`
    /// aborts between chunks. On any failure the partial output is removed
    /// and a renamed seed is restored.
    pub fn update(
        &mut self,
        cancel: &CancellationFlag,
        progress: impl FnMut(ProgressEvent),
    ) -> Result<UpdateReport, UpdateError> {
        let control_url = self.control_url.clone();
        let seed_path = self.seed_path.clone();
        let (header, table) = self.control()?;

        let artifact_url = resolve_url(&control_url, &header.url)?;
        let index = ChecksumIndex::build(header, table);

        let transaction = OutputTransaction::begin(&seed_path, &header.filename)?;
        info!(
            output = %transaction.output_path().display(),
            url = %artifact_url,
            "starting delta update"
        );

        let mut seed = FileSource::open(transaction.seed_path())
            .map_err(|err| UpdateError::Engine(EngineError::Seed(err)))?;
        let seed_len = seed
            .len()
            .map_err(|err| UpdateError::Engine(EngineError::Seed(err)))?;

        let mut remote = RangeSource::new(http_client()?, artifact_url);

        let (summary, output) = run_in_transaction(transaction, |output| {
            DeltaUpdate::new(header, &index).run(
                &mut seed,
                seed_len,
                &mut remote,
                output,
                cancel,
                progress,
            )
        })?;

        Ok(UpdateReport { output, summary })
    }

    /// Fetches and parses the control file once, caching the result.
    fn control(&mut self) -> Result<(&ControlHeader, &[u8]), UpdateError> {
        if self.control.is_none() {
            let client = http_client()?;
            let raw = fetch_control(&client, &self.control_url)?;
            let (header, table) = control::parse(&raw)?;
            self.control = Some((header, table.to_vec()));
        }

        let (header, table) = self
            .control
            .as_ref()
            .ok_or(ControlError::Empty)?;
        Ok((header, table.as_slice()))
    }
}

/// Runs `body` writing into the transaction's output, committing on success
/// and rolling back on failure.
fn run_in_transaction<F>(
    mut transaction: OutputTransaction,
    body: F,
) -> Result<(UpdateSummary, PathBuf), UpdateError>
where
    F: FnOnce(&mut BufWriter<&mut OutputTransaction>) -> Result<UpdateSummary, EngineError>,
{
    let mut output = BufWriter::new(&mut transaction);
    match body(&mut output) {
        Ok(summary) => {
            drop(output);
            let path = transaction.commit();
            Ok((summary, path))
        }
        Err(err) => {
            drop(output);
            transaction.rollback();
            Err(err.into())
        }
    }
}

fn hash_file(path: &Path) -> Result<String, UpdateError> {
    let mut file = File::open(path).map_err(|source| UpdateError::SeedIo {
        path: path.to_path_buf(),
        source,
    })?;
    Sha1Sum::digest_reader(&mut file).map_err(|source| UpdateError::SeedIo {
        path: path.to_path_buf(),
        source,
    })
}
