use crate::{error::ConfigError, line_count::ModuleLimits};
use serde::de::DeserializeOwned;
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

/// Generic TOML config loader, mirroring `mev_rs::config::from_toml_file`.
pub fn from_toml_file<P: AsRef<Path> + fmt::Display, T: DeserializeOwned>(
    path: P,
) -> Result<T, ConfigError> {
    tracing::info!("loading config from `{path}`...");
    let data = std::fs::read_to_string(path.as_ref())
        .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
    toml::from_str(&data).map_err(|source| ConfigError::Toml { path: path.to_string(), source })
}

#[derive(Debug, serde::Deserialize)]
struct ModuleLimitsFile {
    #[serde(rename = "traces-limits")]
    traces_limits: HashMap<String, u64>,
}

/// Loads the `traces-limits` TOML table named in spec.md §6 into a
/// [`ModuleLimits`]. Keys are module names (conventionally upper-cased);
/// values are positive integers.
pub fn load_module_limits(path: impl AsRef<Path> + fmt::Display) -> Result<ModuleLimits, ConfigError> {
    let file: ModuleLimitsFile = from_toml_file(path)?;
    Ok(ModuleLimits::new(file.traces_limits))
}

/// A deny-list of lowercase hex addresses, reloadable without a process
/// restart via the `plugins_reloadPluginConfig` RPC (spec.md §6).
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    path: Option<PathBuf>,
    addresses: std::collections::HashSet<String>,
}

impl DenyList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let addresses = Self::read(&path)?;
        Ok(Self { path: Some(path), addresses })
    }

    fn read(path: &Path) -> Result<std::collections::HashSet<String>, ConfigError> {
        let data = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Ok(data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_lowercase)
            .collect())
    }

    /// Re-reads the deny-list file from disk, replacing the set atomically.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = self.path.clone() {
            self.addresses = Self::read(&path)?;
        }
        Ok(())
    }

    pub fn contains(&self, address: &alloy_primitives::Address) -> bool {
        self.addresses.contains(&address.to_string().to_lowercase())
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn insert_for_test(&mut self, address: alloy_primitives::Address) {
        self.addresses.insert(address.to_string().to_lowercase());
    }
}
