use guardian_core::{
    DependencySpec, Ecosystem, ManifestError, ManifestParser, read_json_dependency_sections,
};
use std::path::Path;

const DEPENDENCY_SECTIONS: &[&str] = &["dependencies", "devDependencies"];

#[derive(Debug, Clone, Default)]
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PackageJsonParser {
    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn update_command(&self) -> &'static str {
        "npm update"
    }

    fn parse_dependencies(&self, path: &Path) -> Result<Vec<DependencySpec>, ManifestError> {
        read_json_dependency_sections(path, DEPENDENCY_SECTIONS)
    }
}
