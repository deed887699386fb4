mod manifest;

use std::sync::Arc;

pub use manifest::ComposerJsonParser;
use guardian_core::ManifestParser;

pub fn create_parser() -> Arc<dyn ManifestParser> {
    Arc::new(ComposerJsonParser::new())
}
