use thiserror::Error;

/// Errors raised while loading or reloading on-disk configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config from `{path}`: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("could not parse TOML config `{path}`: {source}")]
    Toml { path: String, source: toml::de::Error },
}

/// Errors surfaced by the core's admission-time validation, distinct from
/// the in-block [`crate::types::TransactionSelectionResult`] taxonomy which
/// never errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("module `{0}` is not present in the configured module limits")]
    ModuleUndefined(String),
    #[error("bundle max timestamp is in the past")]
    BundleExpired,
    #[error("Malformed bundle, no bundle transactions present")]
    EmptyBundle,
    #[error("malformed linea_sendBundle json param")]
    MalformedBundleParam,
    #[error("Invalid transaction: idx={idx},hash={hash},reason={reason}")]
    InvalidTransaction { idx: usize, hash: String, reason: String },
}
