//! Parallel ingestion pipeline
//!
//! One worker task per input file, all running concurrently; [`IngestPipeline::run`]
//! returns only after every worker has finished. Within a file, lines are
//! classified and appended strictly in source order. Files share nothing
//! except the component store.
//!
//! Failures stay inside the worker that hit them:
//! - unreadable file: reported, no records from that file
//! - unrecognized line: reported, processing continues
//! - store failure on append: remaining inserts for that file are abandoned,
//!   classification continues so diagnostics are still produced
//! - worker panic: reported as a failed file

use chipdb_common::{ComponentStore, Error, LineClass, LineClassifier, LineTally};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error as ThisError;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Pipeline tuning
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Stop reading a file once its pass has run this long. `None` waits forever.
    pub file_timeout: Option<Duration>,
}

/// Source line that matched no pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedLine {
    pub line_no: usize,
    pub text: String,
}

/// Why a file's pass ended early or lost inserts
#[derive(Debug, ThisError)]
pub enum FileFailure {
    /// File could not be opened or a read failed part-way
    #[error(transparent)]
    Unreadable(Error),

    /// Store rejected an append; later records from this file were not inserted
    #[error("store failed at line {line_no}, remaining inserts abandoned: {source}")]
    StoreUnavailable {
        line_no: usize,
        #[source]
        source: Error,
    },

    /// Pass exceeded the configured per-file timeout
    #[error("timed out after {after:?}")]
    TimedOut { after: Duration },

    /// Worker task panicked or was cancelled
    #[error("ingestion worker failed: {0}")]
    Worker(String),
}

/// Outcome of one file's pass
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Records successfully appended to the store
    pub appended: usize,
    pub tally: LineTally,
    pub unrecognized: Vec<UnrecognizedLine>,
    pub failure: Option<FileFailure>,
}

impl FileReport {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            appended: 0,
            tally: LineTally::default(),
            unrecognized: Vec::new(),
            failure: None,
        }
    }

    fn failed(path: PathBuf, failure: FileFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(path)
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of a whole run; one report per input, in input order
#[derive(Debug)]
pub struct IngestSummary {
    pub files: Vec<FileReport>,
}

impl IngestSummary {
    pub fn total_appended(&self) -> usize {
        self.files.iter().map(|f| f.appended).sum()
    }

    pub fn total_unrecognized(&self) -> usize {
        self.files.iter().map(|f| f.unrecognized.len()).sum()
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_success())
    }
}

/// Fans input files out to concurrent workers writing into one store
pub struct IngestPipeline {
    store: ComponentStore,
    options: IngestOptions,
}

impl IngestPipeline {
    pub fn new(store: ComponentStore) -> Self {
        Self::with_options(store, IngestOptions::default())
    }

    pub fn with_options(store: ComponentStore, options: IngestOptions) -> Self {
        Self { store, options }
    }

    /// Ingest every file concurrently and wait for all of them.
    ///
    /// Never fails as a whole: every per-file problem is in the summary.
    pub async fn run(&self, paths: &[PathBuf]) -> IngestSummary {
        info!(files = paths.len(), "Starting ingestion");

        let mut join_set = JoinSet::new();
        for (index, path) in paths.iter().enumerate() {
            let store = self.store.clone();
            let path = path.clone();
            let timeout = self.options.file_timeout;
            let span = info_span!("ingest_file", path = %path.display());

            join_set.spawn(
                async move { (index, ingest_file(&store, path, timeout).await) }.instrument(span),
            );
        }

        let mut slots: Vec<Option<FileReport>> = paths.iter().map(|_| None).collect();
        let mut worker_errors = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(join_err) => {
                    error!(error = %join_err, "Ingestion worker did not complete");
                    worker_errors.push(join_err.to_string());
                }
            }
        }

        // A worker that died never reported its index; pair leftovers with
        // the empty slots in input order.
        let mut worker_errors = worker_errors.into_iter();
        let files = slots
            .into_iter()
            .zip(paths)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| {
                    let message = worker_errors
                        .next()
                        .unwrap_or_else(|| "worker exited without a report".to_string());
                    FileReport::failed(path.clone(), FileFailure::Worker(message))
                })
            })
            .collect();

        let summary = IngestSummary { files };
        info!(
            files = summary.files.len(),
            appended = summary.total_appended(),
            unrecognized = summary.total_unrecognized(),
            failed = summary.failed_files().count(),
            "Ingestion complete"
        );
        summary
    }
}

/// Classify one file line by line, appending recognized records in order.
pub async fn ingest_file(
    store: &ComponentStore,
    path: PathBuf,
    timeout: Option<Duration>,
) -> FileReport {
    let mut report = FileReport::new(path);

    let file = match File::open(&report.path).await {
        Ok(file) => file,
        Err(source) => {
            let err = unreadable(&report.path, source);
            error!(error = %err, "Unable to open file");
            report.failure = Some(FileFailure::Unreadable(err));
            return report;
        }
    };

    let deadline = timeout.map(|after| (Instant::now() + after, after));
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut classifier = LineClassifier::new();
    let mut inserts_abandoned = false;

    loop {
        buf.clear();
        let read = match deadline {
            Some((at, after)) => {
                match tokio::time::timeout_at(at, reader.read_until(b'\n', &mut buf)).await {
                    Ok(read) => read,
                    Err(_) => {
                        warn!(timeout_secs = after.as_secs_f64(), "File pass timed out");
                        report.failure = Some(FileFailure::TimedOut { after });
                        break;
                    }
                }
            }
            None => reader.read_until(b'\n', &mut buf).await,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(source) => {
                let err = unreadable(&report.path, source);
                error!(error = %err, "Read failed part-way through file");
                report.failure = Some(FileFailure::Unreadable(err));
                break;
            }
        }

        // Bytes that are not UTF-8 only spoil their own line
        let line = String::from_utf8_lossy(trim_line_ending(&buf));
        let classified = classifier.classify(&line);
        match classified.class {
            LineClass::Component(record) => {
                if inserts_abandoned {
                    continue;
                }
                match store.append(&record).await {
                    Ok(id) => {
                        report.appended += 1;
                        debug!(
                            line_no = classified.line_no,
                            id,
                            kind = %record.kind(),
                            name = record.name(),
                            "Component found"
                        );
                    }
                    Err(source) => {
                        error!(
                            line_no = classified.line_no,
                            error = %source,
                            "Append failed, abandoning remaining inserts for this file"
                        );
                        report.failure = Some(FileFailure::StoreUnavailable {
                            line_no: classified.line_no,
                            source,
                        });
                        inserts_abandoned = true;
                    }
                }
            }
            LineClass::EndModule => debug!(line_no = classified.line_no, "End of module"),
            LineClass::Blank => {}
            LineClass::Unrecognized(text) => {
                warn!(line_no = classified.line_no, line = %text, "Unrecognized line");
                report.unrecognized.push(UnrecognizedLine {
                    line_no: classified.line_no,
                    text,
                });
            }
        }
    }

    report.tally = classifier.tally();
    info!(
        appended = report.appended,
        lines = report.tally.lines(),
        unrecognized = report.unrecognized.len(),
        "File processed"
    );
    report
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn unreadable(path: &Path, source: std::io::Error) -> Error {
    Error::FileUnreadable {
        path: path.to_path_buf(),
        source,
    }
}
