//! Append-only, per-instrument, per-day funding rate log.
//!
//! Layout: `<root>/<INSTRUMENT>/<DD-MM-YYYY>.log`. Files are only ever
//! opened in append mode; each append writes one complete block with a
//! single `write_all`.

use chrono::{DateTime, NaiveDate, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::{HistoryPoint, LogBlock, LogFileDescriptor, Observation};

use super::codec::LogCodec;
use super::day::{
    day_file_name, format_day, parse_day, validate_instrument, DAY_FILE_EXTENSION,
};
use super::LogStoreError;

/// File-backed time-series log.
pub struct TimeSeriesLog {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    codec: Arc<dyn LogCodec>,
}

impl TimeSeriesLog {
    /// Creates a log rooted at `root`. The directory is created lazily on
    /// the first append.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>, codec: Arc<dyn LogCodec>) -> Self {
        Self {
            root: root.into(),
            clock,
            codec,
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the active codec.
    #[must_use]
    pub fn codec(&self) -> &dyn LogCodec {
        self.codec.as_ref()
    }

    /// Returns today's day name according to the log's clock.
    #[must_use]
    pub fn today(&self) -> String {
        format_day(self.clock.now().date_naive())
    }

    /// Appends one block for `instrument` to today's day-file.
    ///
    /// An empty observation list writes nothing. Rates that are NaN or
    /// infinite are left out of the block.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The instrument is not a valid directory name
    /// - The directory or file cannot be created, opened or written
    pub fn append(&self, instrument: &str, observations: &[Observation]) -> Result<(), LogStoreError> {
        if observations.is_empty() {
            return Ok(());
        }
        validate_instrument(instrument)?;

        let now = self.clock.now();
        let mut block = LogBlock::from_observations(now, instrument, observations);
        block.rates.retain(|rate| {
            let finite = rate.funding_rate.is_finite();
            if !finite {
                tracing::warn!(instrument = %instrument, exchange = %rate.exchange, "Skipping non-finite funding rate");
            }
            finite
        });
        if block.rates.is_empty() {
            return Ok(());
        }
        let encoded = self
            .codec
            .encode_block(&block)
            .map_err(|source| write_failed(instrument, source))?;

        let dir = self.root.join(instrument);
        fs::create_dir_all(&dir).map_err(|source| write_failed(instrument, source))?;

        let path = dir.join(day_file_name(now.date_naive()));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| write_failed(instrument, source))?;
        file.write_all(encoded.as_bytes())
            .map_err(|source| write_failed(instrument, source))?;

        tracing::debug!(
            instrument = %instrument,
            rates = block.rates.len(),
            path = %path.display(),
            "Appended log block"
        );
        Ok(())
    }

    /// Returns the raw bytes of one day-file.
    ///
    /// `day` may be `YYYY-MM-DD` or `DD-MM-YYYY`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The day or instrument is invalid
    /// - The day-file does not exist (`FileNotFound`)
    /// - The file cannot be read
    pub fn read_raw(&self, instrument: &str, day: &str) -> Result<Vec<u8>, LogStoreError> {
        validate_instrument(instrument)?;
        let date = parse_day(day)?;
        let path = self.root.join(instrument).join(day_file_name(date));

        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LogStoreError::FileNotFound {
                instrument: instrument.to_string(),
                day: format_day(date),
            },
            _ => LogStoreError::Io(e),
        })
    }

    /// Returns one day-file decoded into blocks, skipping anything the codec
    /// does not recognize.
    ///
    /// # Errors
    ///
    /// Same as [`TimeSeriesLog::read_raw`].
    pub fn read_entries(&self, instrument: &str, day: &str) -> Result<Vec<LogBlock>, LogStoreError> {
        let raw = self.read_raw(instrument, day)?;
        Ok(self.codec.decode_blocks(&String::from_utf8_lossy(&raw)))
    }

    /// Lists every day-file under the root, ordered by instrument and day.
    ///
    /// A missing root yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or file's metadata cannot be read.
    pub fn enumerate(&self) -> Result<Vec<LogFileDescriptor>, LogStoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                instruments.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        instruments.sort();

        let mut descriptors = Vec::new();
        for instrument in instruments {
            for (_, path) in self.day_files(&instrument)? {
                let metadata = fs::metadata(&path)?;
                let day = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let file_name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                descriptors.push(LogFileDescriptor {
                    path: format!("{instrument}/{file_name}"),
                    instrument: instrument.clone(),
                    day,
                    size: metadata.len(),
                    modified: DateTime::<Utc>::from(metadata.modified()?),
                });
            }
        }

        Ok(descriptors)
    }

    /// Reconstructs the funding rate history of `provider` for `instrument`
    /// by decoding every day-file of the instrument in calendar order.
    ///
    /// A missing instrument directory yields an empty history. A day-file
    /// that disappears or cannot be read mid-scan is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the instrument is invalid or its directory cannot
    /// be listed.
    pub fn reconstruct_history(
        &self,
        instrument: &str,
        provider: &str,
    ) -> Result<Vec<HistoryPoint>, LogStoreError> {
        validate_instrument(instrument)?;

        let mut points = Vec::new();
        for (_, path) in self.day_files(instrument)? {
            let raw = match fs::read(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable day-file");
                    continue;
                }
            };
            let blocks = self.codec.decode_blocks(&String::from_utf8_lossy(&raw));
            points.extend(blocks.iter().flat_map(|block| block.history_for(provider)));
        }

        tracing::debug!(
            instrument = %instrument,
            provider = %provider,
            points = points.len(),
            "Reconstructed history"
        );
        Ok(points)
    }

    /// Deletes day-files whose day is strictly before `cutoff`.
    ///
    /// With `dry_run` nothing is removed. Returns the affected files.
    ///
    /// # Errors
    ///
    /// Returns an error if enumeration or a removal fails.
    pub fn purge_before(
        &self,
        cutoff: NaiveDate,
        dry_run: bool,
    ) -> Result<Vec<LogFileDescriptor>, LogStoreError> {
        let expired: Vec<LogFileDescriptor> = self
            .enumerate()?
            .into_iter()
            .filter(|file| parse_day(&file.day).is_ok_and(|day| day < cutoff))
            .collect();

        if !dry_run {
            for file in &expired {
                fs::remove_file(self.root.join(&file.path))?;
                tracing::info!(path = %file.path, "Removed expired day-file");
            }
        }

        Ok(expired)
    }

    /// Runs a store operation on tokio's blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or an I/O error if the blocking task
    /// panicked or was cancelled.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::clock::SystemClock;
    /// use shared::storage::{TextCodec, TimeSeriesLog};
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let dir = tempfile::tempdir().unwrap();
    /// let log = Arc::new(TimeSeriesLog::new(dir.path(), Arc::new(SystemClock), Arc::new(TextCodec)));
    /// let files = log.run_blocking(|log| log.enumerate()).await.unwrap();
    /// assert!(files.is_empty());
    /// # });
    /// ```
    pub async fn run_blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T, LogStoreError>
    where
        F: FnOnce(&TimeSeriesLog) -> Result<T, LogStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let log = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&log))
            .await
            .map_err(|e| LogStoreError::Io(io::Error::other(e)))?
    }

    /// Returns the day-files of one instrument sorted by calendar day.
    /// Files whose name is not a day are ignored.
    fn day_files(&self, instrument: &str) -> Result<Vec<(NaiveDate, PathBuf)>, LogStoreError> {
        let dir = self.root.join(instrument);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DAY_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match parse_day(stem) {
                Ok(date) if format_day(date) == stem => files.push((date, path)),
                _ => tracing::trace!(path = %path.display(), "Ignoring non-day file"),
            }
        }
        files.sort();
        Ok(files)
    }
}

impl std::fmt::Debug for TimeSeriesLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSeriesLog")
            .field("root", &self.root)
            .field("codec", &self.codec.name())
            .finish_non_exhaustive()
    }
}

fn write_failed(instrument: &str, source: io::Error) -> LogStoreError {
    LogStoreError::WriteFailed {
        instrument: instrument.to_string(),
        source,
    }
}
