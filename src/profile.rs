//! Build Profiles - What to Compile, Where, and How Strictly
//!
//! A profile names the template source, the output, the letterhead asset,
//! the page layout and the lint policy. The default profile is the lease
//! contract; JSON profiles override any subset of its fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::PageLayout;
use crate::pipeline::BuildError;

pub type ProfileId = String;

pub const DEFAULT_SOURCE: &str = "config/contracts/templates/contrato_arrendamiento_template_v1.txt";
pub const DEFAULT_OUTPUT: &str = "config/contracts/templates/contrato_arrendamiento_template_v1.docx";
pub const DEFAULT_LOGO: &str = "config/contracts/assets/uaf-header.png";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildProfile {
    pub id: ProfileId,
    pub name: String,
    pub template_version: String,
    pub engine_min_version: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub logo: Option<PathBuf>,
    /// Where to write the JSON build manifest, if anywhere
    pub manifest: Option<PathBuf>,
    pub layout: PageLayout,
    pub lint: LintConfig,
}

impl Default for BuildProfile {
    fn default() -> Self {
        Self {
            id: "contrato-arrendamiento".to_string(),
            name: "Contrato de arrendamiento".to_string(),
            template_version: "1.0.0".to_string(),
            engine_min_version: "1.0.0".to_string(),
            source: PathBuf::from(DEFAULT_SOURCE),
            output: PathBuf::from(DEFAULT_OUTPUT),
            logo: Some(PathBuf::from(DEFAULT_LOGO)),
            manifest: None,
            layout: PageLayout::default(),
            lint: LintConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    #[default]
    Block,
    Warn,
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LintConfig {
    pub failure_mode: FailureMode,
    pub require_title: bool,
    /// Treat an empty template as an error instead of a warning
    pub reject_empty: bool,
    /// Known `NAMESPACE.FIELD` names; empty disables the catalog check
    pub allowed_placeholders: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Block,
            require_title: true,
            reject_empty: false,
            allowed_placeholders: vec![],
        }
    }
}

impl BuildProfile {
    /// Read a JSON profile. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut profile: BuildProfile = serde_json::from_str(&content)?;
        profile.layout = PageLayout::from_profile(profile.layout)
            .map_err(|msg| BuildError::InvalidProfile(msg.to_string()))?;
        Ok(profile)
    }

    /// Resolve a profile path against the build root.
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
