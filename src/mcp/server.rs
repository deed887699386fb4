//! MCP tool handlers and request/response orchestration.

use std::path::Path;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler, handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, tool, tool_handler, tool_router,
};
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::de::value::{Error as ValueError, StringDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer};

use crate::service::GuardianService;
use crate::types::{FileType, ScanMode};

fn file_type_schema(generator: &mut SchemaGenerator) -> Schema {
    let mut schema = String::json_schema(generator);
    schema.insert("enum".into(), serde_json::json!(FileType::NAMES));
    schema.insert("default".into(), serde_json::json!(FileType::default()));
    schema
}

fn scan_mode_schema(generator: &mut SchemaGenerator) -> Schema {
    let mut schema = String::json_schema(generator);
    schema.insert("enum".into(), serde_json::json!(ScanMode::NAMES));
    schema.insert("default".into(), serde_json::json!(ScanMode::default()));
    schema
}

/// Reads an optional enum argument where `null` and `""` select the default.
fn default_when_blank<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.is_empty() => {
            let value: StringDeserializer<ValueError> = value.into_deserializer();
            T::deserialize(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(T::default()),
    }
}

/// Parameters for the `check_vulnerabilities` MCP tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct VulnerabilityQuery {
    #[schemars(
        description = "Path to the project directory containing package.json and/or composer.json. Defaults to the current working directory."
    )]
    /// Project directory to scan.
    pub project_path: Option<String>,

    #[schemars(
        description = "Manifest to scan. Defaults to \"both\". Supported: \"package.json\", \"composer.json\", \"both\"."
    )]
    #[serde(default, deserialize_with = "default_when_blank")]
    #[schemars(schema_with = "file_type_schema")]
    pub file_type: FileType,

    #[schemars(
        description = "Report detail. \"full\" lists every vulnerability, \"summary\" returns severity counts only, \"critical-high-only\" details CRITICAL and HIGH findings. Defaults to \"full\"."
    )]
    #[serde(default, deserialize_with = "default_when_blank")]
    #[schemars(schema_with = "scan_mode_schema")]
    pub scan_mode: ScanMode,
}

/// MCP transport adapter for the shared vulnerability scan service.
#[derive(Clone)]
pub struct GuardianServer {
    tool_router: ToolRouter<Self>,
    service: Arc<GuardianService>,
}

#[tool_router]
impl GuardianServer {
    /// Creates a server using the default runtime service.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying service fails to initialize.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::with_service(GuardianService::new()?))
    }

    #[cfg(test)]
    /// Creates a test server backed by the given lookup and default config.
    pub fn with_lookup(lookup: Arc<dyn guardian_core::VulnerabilityLookup>) -> Self {
        Self::with_service(GuardianService::with_lookup(
            crate::config::GuardianConfig::default(),
            lookup,
        ))
    }

    fn with_service(service: GuardianService) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service: Arc::new(service),
        }
    }

    #[tool(
        name = "check_vulnerabilities",
        description = "Check npm (package.json) and Composer (composer.json) dependencies for known security vulnerabilities using the OSV database. Returns a Markdown report with per-package findings, severity counts, and update commands."
    )]
    async fn check_vulnerabilities(
        &self,
        Parameters(query): Parameters<VulnerabilityQuery>,
    ) -> Result<CallToolResult, McpError> {
        validate_vulnerability_query(&query)?;

        let report = self
            .service
            .check_vulnerabilities(query.project_path.as_deref(), query.file_type, query.scan_mode)
            .await
            .map_err(mcp_internal_error)?;

        Ok(CallToolResult::success(vec![Content::text(report)]))
    }
}

#[tool_handler]
impl ServerHandler for GuardianServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Dependency vulnerability scanner: call `check_vulnerabilities` with an optional `project_path` to scan package.json and composer.json against the OSV database. Use `scan_mode=\"summary\"` for counts only or `scan_mode=\"critical-high-only\"` to focus on urgent findings, and `file_type` to restrict the scan to one manifest.".into(),
            ),
        }
    }
}

fn mcp_internal_error(error: anyhow::Error) -> McpError {
    McpError::internal_error(format!("{error:#}"), None)
}

fn validate_vulnerability_query(query: &VulnerabilityQuery) -> Result<(), McpError> {
    if let Some(path) = query.project_path.as_deref()
        && !path.trim().is_empty()
    {
        let path = Path::new(path.trim());
        if path.exists() && !path.is_dir() {
            return Err(McpError::invalid_params(
                format!("project_path must be a directory: {}", path.display()),
                None,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
