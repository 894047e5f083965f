use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Error, Result};

pub const OVERPASS_API_URL: &str = "https://overpass-api.de/api/interpreter";
pub const OVERPASS_TIMEOUT_SECS: u64 = 15;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub osmium_path: String,
    pub overpass_url: String,
    pub overpass_timeout_secs: u64,
    pub user_agent: String,
    /// Parent directory for the per-resolution scratch directories.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            osmium_path: "osmium".to_string(),
            overpass_url: OVERPASS_API_URL.to_string(),
            overpass_timeout_secs: OVERPASS_TIMEOUT_SECS,
            user_agent: format!("follow-lane/{}", env!("CARGO_PKG_VERSION")),
            temp_dir: None,
        }
    }
}

impl ResolverConfig {
    pub fn load(path: &Path) -> Result<ResolverConfig> {
        let file = File::open(path)
            .map_err(|err| Error::Config(format!("could not open {}: {}", path.display(), err)))?;
        let config: ResolverConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| Error::Config(format!("could not parse {}: {}", path.display(), err)))?;

        if config.overpass_timeout_secs == 0 {
            return Err(Error::Config("overpass_timeout_secs must be at least 1".to_string()));
        }
        Ok(config)
    }

    pub fn overpass_timeout(&self) -> Duration {
        Duration::from_secs(self.overpass_timeout_secs)
    }
}
