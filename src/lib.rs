//! LeaseDoc Core - Lease Contract Compiler
//!
//! Turns the plain-text lease contract template into a print-ready DOCX.
//!
//! # The Five Rules
//! 1. Every line gets exactly one kind
//! 2. Rule order is the contract
//! 3. Reference tables are data, not input
//! 4. Placeholders pass through untouched
//! 5. Lint before every build

pub mod normalize;
pub mod reference;
pub mod classify;
pub mod builder;
pub mod table;
pub mod banner;
pub mod assemble;
pub mod layout;
pub mod profile;
pub mod validation;
pub mod docx;
pub mod hashing;
pub mod pipeline;

pub use normalize::normalize_spanish_text;
pub use classify::{Classifier, ClassifiedLine, LineKind, LineRule};
pub use builder::{Document, DocumentBuilder};
pub use assemble::{Assembler, Assembly, AssemblyState};
pub use layout::PageLayout;
pub use profile::BuildProfile;
pub use validation::{LintReport, LintRule, LintViolation, ViolationSeverity};
pub use hashing::{compute_manifest_hash, compute_job_hash, canonical_json};
pub use pipeline::{BuildError, BuildManifest, CompilationPipeline, CompiledDocument};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
