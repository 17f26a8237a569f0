//! Shared constants

pub const DEFAULT_CONFIG_PATH: &str = "token-keeper.yaml";
