use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ConfigOverlay {
    pub osv: Option<OsvOverlay>,
    pub scan: Option<ScanOverlay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct OsvOverlay {
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct ScanOverlay {
    pub max_concurrent_lookups: Option<usize>,
}
