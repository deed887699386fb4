use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Package ecosystems understood by the vulnerability database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    Packagist,
}

impl Ecosystem {
    pub fn osv_name(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Packagist => "Packagist",
        }
    }
}

/// One scored severity entry as published upstream, e.g. `CVSS_V3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityScore {
    pub scheme: String,
    pub score: String,
}

/// A vulnerability entry exactly as the lookup returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVulnerability {
    pub id: String,
    pub summary: Option<String>,
    pub database_severity: Option<String>,
    pub scores: Vec<SeverityScore>,
    pub references: Vec<String>,
}

/// A declared dependency and its unprocessed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub version_range: String,
}

#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("vulnerability lookup failed: {message}")]
    Transport { message: String },
    #[error("vulnerability database returned invalid data: {message}")]
    InvalidResponse { message: String },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest file not found: {path}")]
    NotFound { path: String },
    #[error("failed to read manifest file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse manifest file {path}: {message}")]
    ParseFile { path: String, message: String },
}

impl ManifestError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[async_trait]
pub trait VulnerabilityLookup: Send + Sync {
    /// Queries known vulnerabilities for one package version.
    ///
    /// An empty list means the database knows of no vulnerabilities.
    async fn query(
        &self,
        package: &str,
        version: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<RawVulnerability>, LookupError>;
}

pub trait ManifestParser: Send + Sync {
    /// File name looked up inside the project directory.
    fn file_name(&self) -> &'static str;
    fn ecosystem(&self) -> Ecosystem;
    /// Package-manager command suggested in remediation steps.
    fn update_command(&self) -> &'static str;
    fn parse_dependencies(&self, path: &Path) -> Result<Vec<DependencySpec>, ManifestError>;

    /// Whether a declared name is a platform pseudo-package rather than an installable package.
    fn is_platform_package(&self, _name: &str) -> bool {
        false
    }

    fn manifest_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.file_name())
    }

    fn read_dependencies(&self, project_dir: &Path) -> Result<Vec<DependencySpec>, ManifestError> {
        self.parse_dependencies(&self.manifest_path(project_dir))
    }
}

/// Reads a JSON manifest and merges the given dependency sections in order.
///
/// Later sections overwrite earlier ones on name collision while keeping the
/// position of the first declaration. Sections that are absent or not objects
/// are skipped, and a document whose root is not an object (`[]`, `"x"`)
/// declares no dependencies. Only unparsable JSON and non-string constraints
/// are errors.
pub fn read_json_dependency_sections(
    path: &Path,
    sections: &[&str],
) -> Result<Vec<DependencySpec>, ManifestError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            return Err(ManifestError::NotFound {
                path: path.display().to_string(),
            });
        }
        Err(source) => {
            return Err(ManifestError::ReadFile {
                path: path.display().to_string(),
                source,
            });
        }
    };
    let root: Value = serde_json::from_str(&raw).map_err(|error| ManifestError::ParseFile {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;
    let Some(root) = root.as_object() else {
        return Ok(Vec::new());
    };

    let mut merged = Map::new();
    for section in sections {
        let Some(items) = root.get(*section).and_then(Value::as_object) else {
            continue;
        };
        for (name, constraint) in items {
            merged.insert(name.clone(), constraint.clone());
        }
    }

    merged
        .into_iter()
        .map(|(name, constraint)| match constraint {
            Value::String(version_range) => Ok(DependencySpec {
                name,
                version_range,
            }),
            other => Err(ManifestError::ParseFile {
                path: path.display().to_string(),
                message: format!("dependency '{name}' has a non-string version constraint: {other}"),
            }),
        })
        .collect()
}
