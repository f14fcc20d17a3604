// [libs/infra/boundary-providers/src/options.rs]

/// Jurisdiction scope for a download: a single state, or the national
/// file where the portal family offers one (TIGER does, for instance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    State(String),
    National,
}

impl Scope {
    pub fn as_path_segment(&self) -> &str {
        match self {
            Scope::State(fips) => fips,
            Scope::National => "us",
        }
    }
}

/// §4.4 inputs: layer code, jurisdiction scope, vintage/year, and
/// whether the local content-addressed cache should be bypassed.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub layer: String,
    pub scope: Scope,
    pub year: u32,
    pub force_refresh: bool,
}

/// A single file pulled down by `download_layer`, before it's been
/// parsed into normalized boundaries by `transform`.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub bytes: Vec<u8>,
}
