use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

pub const RC_FILE: &str = ".spmetacheckrc";

/// Configuration loaded from a `.spmetacheckrc` TOML file.
///
/// Looked up first in the working directory, then in `$HOME`.
/// Flags and environment variables always take precedence over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RcConfig {
    pub metadata: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub lang: Option<String>,
    pub skip_tls: Option<bool>,
    pub force_new_scan: Option<bool>,
    pub api_url: Option<String>,
    pub poll_interval: Option<u64>,
    pub cached_poll_interval: Option<u64>,
    pub max_wait: Option<u64>,
    pub http_timeout: Option<u64>,
    pub no_color: Option<bool>,
}

impl RcConfig {
    /// Load `.spmetacheckrc` from `dir`, falling back to `$HOME`.
    pub fn load(dir: &Path) -> Self {
        let candidates = [Some(dir.join(RC_FILE)), dirs_home().map(|h| h.join(RC_FILE))];

        for candidate in candidates.iter().flatten() {
            let Ok(contents) = std::fs::read_to_string(candidate) else {
                continue;
            };
            match toml::from_str::<RcConfig>(&contents) {
                Ok(cfg) => {
                    debug!(path = %candidate.display(), "loaded rc file");
                    return cfg;
                }
                Err(e) => warn!(path = %candidate.display(), error = %e, "ignoring malformed rc file"),
            }
        }

        RcConfig::default()
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
