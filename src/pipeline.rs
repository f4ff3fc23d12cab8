//! Compilation Pipeline - Single Entry Point
//!
//! CRITICAL: compile MUST lint internally. No bypass.
//! Output is written only after the whole package exists in memory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assemble::{Assembler, AssemblyStats};
use crate::banner::load_logo;
use crate::builder::Document;
use crate::classify::ClassifiedLine;
use crate::docx;
use crate::hashing::{compute_job_hash, compute_manifest_hash, sha256_hex};
use crate::profile::BuildProfile;
use crate::validation::{LintReport, Linter};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static LINT_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_lint_call_count() -> u32 {
    LINT_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_lint_call_count() {
    LINT_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Template source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Lint failed: {0}")]
    LintFailed(String),

    #[error("Profile requires engine >= {0}, current is {1}")]
    EngineVersionMismatch(String, String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Packaging error: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildManifest {
    pub id: String,
    pub profile_id: String,
    pub template_version: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub source_path: String,
    pub output_path: String,
    pub source_hash: String,
    pub output_hash: String,
    pub job_hash: String,
    pub stats: AssemblyStats,
    pub placeholders: Vec<String>,
    pub lint: LintReport,
    pub manifest_hash: String,
}

/// An assembled and packaged document, not yet on disk.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub output_path: PathBuf,
    pub bytes: Vec<u8>,
    pub document: Document,
    pub manifest: BuildManifest,
}

#[derive(Serialize)]
struct JobPayload<'a> {
    source_hash: &'a str,
    profile: &'a BuildProfile,
}

/// The compilation pipeline - single entry point for all builds
pub struct CompilationPipeline {
    profile: BuildProfile,
    root: PathBuf,
    linter: Linter,
}

impl CompilationPipeline {
    pub fn new(profile: BuildProfile, root: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            root: root.into(),
            linter: Linter::new(),
        }
    }

    pub fn profile(&self) -> &BuildProfile {
        &self.profile
    }

    pub fn source_path(&self) -> PathBuf {
        BuildProfile::resolve(&self.root, &self.profile.source)
    }

    pub fn output_path(&self) -> PathBuf {
        BuildProfile::resolve(&self.root, &self.profile.output)
    }

    pub fn logo_path(&self) -> Option<PathBuf> {
        self.profile
            .logo
            .as_ref()
            .map(|logo| BuildProfile::resolve(&self.root, logo))
    }

    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.profile
            .manifest
            .as_ref()
            .map(|manifest| BuildProfile::resolve(&self.root, manifest))
    }

    /// Read the template source text.
    pub fn read_source(&self) -> Result<String, BuildError> {
        let path = self.source_path();
        fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => BuildError::SourceNotFound(path.clone()),
            _ => BuildError::Io { path: path.clone(), source },
        })
    }

    /// Lint a template source.
    ///
    /// This is the ONLY lint entry point.
    pub fn lint(&self, lines: &[String]) -> Result<LintReport, BuildError> {
        #[cfg(feature = "test-hooks")]
        LINT_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.check_engine_version()?;
        Ok(self.linter.lint(lines, &self.profile))
    }

    /// Classify the source without rendering it.
    pub fn classify(&self) -> Result<Vec<ClassifiedLine>, BuildError> {
        let lines = split_lines(&self.read_source()?);
        Ok(Assembler::default().classify_all(&lines))
    }

    /// Compile the profile's source into an in-memory package.
    pub fn compile(&self) -> Result<CompiledDocument, BuildError> {
        let source = self.read_source()?;
        self.compile_source(&source)
    }

    /// Compile a source text.
    ///
    /// CRITICAL: This ALWAYS calls lint internally. No bypass possible.
    pub fn compile_source(&self, source: &str) -> Result<CompiledDocument, BuildError> {
        let lines = split_lines(source);

        let lint = self.lint(&lines)?;
        if !lint.valid {
            return Err(BuildError::LintFailed(lint.summary()));
        }
        for violation in &lint.violations {
            warn!(rule = %violation.rule, line = ?violation.line, "{}", violation.message);
        }

        let logo = self.logo_path().and_then(|path| load_logo(&path));
        let assembly = Assembler::new(logo).assemble(&lines, self.profile.layout.clone());
        info!(
            lines = assembly.stats.lines,
            blocks = assembly.stats.blocks,
            tables = assembly.stats.tables,
            declarations = assembly.stats.declarations,
            "assembled document"
        );

        let bytes = docx::package(&assembly.document)?;

        let source_hash = sha256_hex(source.as_bytes());
        let job_hash = compute_job_hash(
            &self.profile.id,
            &self.profile.template_version,
            &source_hash,
            &JobPayload { source_hash: &source_hash, profile: &self.profile },
            ENGINE_VERSION,
        )?;

        let output_path = self.output_path();
        let mut manifest = BuildManifest {
            id: Uuid::new_v4().to_string(),
            profile_id: self.profile.id.clone(),
            template_version: self.profile.template_version.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            source_path: self.source_path().display().to_string(),
            output_path: output_path.display().to_string(),
            source_hash,
            output_hash: sha256_hex(&bytes),
            job_hash,
            stats: assembly.stats,
            placeholders: lint.placeholders.clone(),
            lint,
            manifest_hash: String::new(), // Computed after
        };
        manifest.manifest_hash = compute_manifest_hash(&manifest)?;

        Ok(CompiledDocument {
            output_path,
            bytes,
            document: assembly.document,
            manifest,
        })
    }

    /// Compile and write the output (and manifest, if configured).
    pub fn build(&self) -> Result<CompiledDocument, BuildError> {
        let compiled = self.compile()?;

        write_file(&compiled.output_path, &compiled.bytes)?;
        if let Some(path) = self.manifest_path() {
            let json = serde_json::to_vec_pretty(&compiled.manifest)?;
            write_file(&path, &json)?;
        }

        info!(output = %compiled.output_path.display(), "wrote document");
        Ok(compiled)
    }

    fn check_engine_version(&self) -> Result<(), BuildError> {
        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|_| BuildError::InvalidProfile("Invalid engine version".into()))?;
        let min_ver = semver::Version::parse(&self.profile.engine_min_version)
            .map_err(|_| BuildError::InvalidProfile("Invalid engine min version".into()))?;

        if engine_ver < min_ver {
            return Err(BuildError::EngineVersionMismatch(
                self.profile.engine_min_version.clone(),
                ENGINE_VERSION.to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CompilationPipeline {
    fn default() -> Self {
        Self::new(BuildProfile::default(), ".")
    }
}

/// Split on line breaks, dropping the terminators (`\n` or `\r\n`).
pub fn split_lines(source: &str) -> Vec<String> {
    source.lines().map(str::to_string).collect()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), BuildError> {
    let io_err = |source| BuildError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}
