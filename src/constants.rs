//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Balance shown for an asset with no matching balance record
pub const DEFAULT_BALANCE: &str = "0";

/// Label of a card's run button when none is given
pub const DEFAULT_ACTION_LABEL: &str = "Run";

/// Directory under the home directory holding the config file
pub const CONFIG_DIR_NAME: &str = ".walletdeck";

/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable overriding the config path
pub const CONFIG_ENV_VAR: &str = "WALLETDECK_CONFIG";

/// Log file written in the working directory
pub const LOG_FILE_NAME: &str = "walletdeck.log";

/// Timeout for JSON-RPC balance calls
pub const RPC_TIMEOUT_SECS: u64 = 30;

/// Application name
pub const APP_NAME: &str = "WalletDeck";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
