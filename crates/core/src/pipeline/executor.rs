//! Pipeline executor for loading the configured files

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::config::{PipelineConfig, TableSource};
use super::error::{PipelineError, PipelineResult};
use super::report::{FileReport, FileState, RunReport};
use crate::ingest::files::{StagedFile, cleanup_files, copy_csvs, staged_path};
use crate::ingest::sanitize::{SanitizeStats, read_header, sanitize_file};
use crate::ingest::{
    HeaderCheck, IngestError, LoadBackend, LoadProgress, LoadResult, LoadStatement, load_file,
    resolve_columns, run_schema_script, verify,
};

/// Pipeline executor that loads every configured file through one backend
pub struct PipelineExecutor<B: LoadBackend> {
    config: PipelineConfig,
    backend: B,
    run_id: String,
}

impl<B: LoadBackend> PipelineExecutor<B> {
    /// Create a new pipeline executor
    pub fn new(config: PipelineConfig, backend: B) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            config,
            backend,
            run_id: Uuid::new_v4().to_string(),
        })
    }

    /// Run ID of this executor
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Give back the backend
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Run the pipeline
    ///
    /// Returns an error only for problems that stop the run before any file
    /// is touched. Per-file failures are recorded in the report.
    pub async fn run(&mut self) -> PipelineResult<RunReport> {
        let span = info_span!("pipeline_run", run_id = %self.run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&mut self) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            backend = self.backend.name(),
            database = %self.config.database,
            files = self.config.tables.len(),
            "Starting pipeline"
        );

        let ingest_dir = self
            .backend
            .secure_file_dir()
            .await
            .map_err(PipelineError::Connection)?
            .ok_or(PipelineError::IngestDirNotConfigured)?;

        let source_dir = self
            .config
            .source_dir
            .clone()
            .ok_or_else(|| PipelineError::Config("Source directory is required".to_string()))?;
        if !source_dir.is_dir() {
            return Err(PipelineError::SourceNotFound(source_dir));
        }

        let (data_dir, copies) = if self.config.copy_sources {
            info!(from = %source_dir.display(), to = %ingest_dir.display(), "Copying CSVs");
            let copies = copy_csvs(&source_dir, &ingest_dir)
                .map_err(|e| PipelineError::io_with_path(&ingest_dir, "copying source CSVs", e))?;
            (ingest_dir.clone(), copies)
        } else {
            (source_dir.clone(), Vec::new())
        };

        let schema = match self.config.schema_script.clone() {
            Some(path) => match run_schema_script(&mut self.backend, &path).await {
                Ok(stats) => Some(stats),
                Err(source) => {
                    // a fatal stop leaves the ingestion directory as it was
                    cleanup_files(&copies);
                    return Err(PipelineError::SchemaScript { path, source });
                }
            },
            None => None,
        };

        let progress = if self.config.show_progress {
            LoadProgress::new(self.config.tables.len() as u64)
        } else {
            LoadProgress::hidden()
        };

        let mut files = Vec::with_capacity(self.config.tables.len());
        let mut rows_loaded = 0u64;
        for source in self.config.tables.clone() {
            let span = info_span!("ingest_file", file = %source.file, table = %source.table);
            let report = self
                .process_file(&data_dir, &ingest_dir, &source, &progress)
                .instrument(span)
                .await;

            if let Some(result) = &report.result {
                rows_loaded += result.actual_rows;
                progress.update_rows(rows_loaded);
            }
            files.push(report);
        }

        let mut warnings = Vec::new();
        if self.config.cleanup_sources && !copies.is_empty() {
            info!(files = copies.len(), "Cleaning up copied CSVs");
            warnings.extend(cleanup_files(&copies));
        }

        let report = RunReport {
            run_id: self.run_id.clone(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            ingest_dir,
            schema,
            files,
            warnings,
        };

        progress.finish(&report.summary_line());
        info!(
            processed = report.files_processed(),
            skipped = report.files_skipped(),
            rows = report.rows_loaded(),
            duration_ms = report.duration_ms,
            "Pipeline {}",
            report.summary_line()
        );
        Ok(report)
    }

    /// Take one file through its states; never fails
    async fn process_file(
        &mut self,
        data_dir: &Path,
        ingest_dir: &Path,
        source: &TableSource,
        progress: &LoadProgress,
    ) -> FileReport {
        let start = Instant::now();
        let mut report = FileReport::new(&source.file, &source.table);
        let source_path = data_dir.join(&source.file);

        if !source_path.is_file() {
            error!(path = %source_path.display(), "File not found");
            report.fail(
                FileState::SourceMissing,
                format!("File not found: {}", source_path.display()),
            );
            progress.skip_file(&source.file, "file not found");
            return report;
        }

        let staged = StagedFile::new(staged_path(ingest_dir, &source_path));
        let outcome = self
            .ingest(&source_path, staged.path(), source, &mut report, progress)
            .await;

        match outcome {
            Ok(result) => {
                report.result = Some(result);
                report.advance(FileState::Verified);
                progress.finish_file();
            }
            Err(e) => {
                let state = if report.state == FileState::Pending {
                    FileState::ResolveFailed
                } else {
                    FileState::LoadFailed
                };
                error!(state = %state, error = %e, "File failed");
                progress.skip_file(&source.file, &e.to_string());
                report.fail(state, e.to_string());
            }
        }

        let staged_display = staged.path().display().to_string();
        if let Err(e) = staged.remove() {
            warn!(file = %staged_display, error = %e, "Could not delete staged file");
            let warning = format!("Could not delete {}: {}", staged_display, e);
            progress.warn(&warning);
            report.warnings.push(warning);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    async fn ingest(
        &mut self,
        source_path: &Path,
        staged: &Path,
        source: &TableSource,
        report: &mut FileReport,
        progress: &LoadProgress,
    ) -> Result<LoadResult, IngestError> {
        let database = self.config.database.clone();

        progress.start_file(&source.file, "Resolving");
        let schema = resolve_columns(&mut self.backend, &database, &source.table).await?;
        if self.config.header_check != HeaderCheck::Off {
            let header = read_header(source_path)?;
            schema.check_header(&source.file, &header, self.config.header_check)?;
        }

        report.advance(FileState::Sanitizing);
        progress.start_file(&source.file, "Sanitizing");
        let stats = sanitize_blocking(source_path.to_path_buf(), staged.to_path_buf()).await?;
        debug!(rows = stats.data_rows(), "Sanitized");

        report.advance(FileState::Loading);
        progress.start_file(&source.file, "Loading");
        let statement = LoadStatement::new(staged, &database, &schema);
        let inserted = load_file(&mut self.backend, &statement).await?;
        report.inserted_rows = Some(inserted);

        let result = verify(
            &mut self.backend,
            staged,
            &database,
            &source.table,
            self.config.row_count_mode,
        )
        .await?;

        if result.expected_rows != stats.data_rows() {
            warn!(
                expected = result.expected_rows,
                sanitized = stats.data_rows(),
                "Staged line count differs from sanitized records"
            );
        }
        info!(summary = %result.summary(), "Loaded {}", source.file);
        Ok(result)
    }
}

/// Sanitize on the blocking pool so large files don't stall the runtime
async fn sanitize_blocking(input: PathBuf, output: PathBuf) -> Result<SanitizeStats, IngestError> {
    let path = input.clone();
    tokio::task::spawn_blocking(move || sanitize_file(&input, &output))
        .await
        .map_err(|e| IngestError::Sanitize {
            path,
            reason: e.to_string(),
        })?
}
