//! Typed validation errors
//!
//! Operation and fetch failures travel as `anyhow::Error`; these are the
//! errors a caller is expected to match on.

use thiserror::Error;

/// Malformed action card schema, reported at configuration time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field id '{0}'")]
    DuplicateId(String),

    #[error("field id must not be empty")]
    EmptyId,

    #[error("option field '{0}' has no options")]
    MissingOptions(String),

    #[error("network field '{0}' requires at least one configured network")]
    NoNetworks(String),
}

/// Rejected form edit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("inputs are disabled while the action is running")]
    Busy,
}

/// Invalid wallet configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no networks configured")]
    NoNetworks,

    #[error("duplicate network '{0}'")]
    DuplicateNetwork(String),

    #[error("duplicate asset id '{0}'")]
    DuplicateAsset(String),

    #[error("asset '{0}': native assets must not carry an address")]
    NativeWithAddress(String),

    #[error("asset '{0}': token assets require an address")]
    TokenWithoutAddress(String),

    #[error("network '{network}' has more than one native asset ('{first}', '{second}')")]
    MultipleNatives {
        network: String,
        first: String,
        second: String,
    },

    #[error("asset '{asset}' references unknown network '{network}'")]
    UnknownNetwork { asset: String, network: String },

    #[error("rpc balance source requires a provider for network '{0}'")]
    MissingProvider(String),
}
