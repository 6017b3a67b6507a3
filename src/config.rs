// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the startup loader. All values
//! are read once at startup; missing secrets abort the process.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CAR_ENCRYPTION_KEY` | Master secret for key derivation | Required |
//! | `CAR_ENCRYPTION_SALT` | Salt for key derivation | Required |
//! | `PBKDF2_ITERATIONS` | PBKDF2 iteration count (fixed per data file) | `100000` |
//! | `DATA_DIR` | Directory holding `car_detail.bin` | `.` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `WIFI_KEY_FILE` | OpenSSL pass file for the credential files | `/etc/wifi_ap/encryption_key` |
//! | `WIFI_SSID_FILE` | Encrypted network name | `/etc/wifi_ap/encrypted_ssid` |
//! | `WIFI_PASSWORD_FILE` | Encrypted network passphrase | `/etc/wifi_ap/encrypted_password` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::storage::kdf::{KdfParams, Secrets};
use crate::storage::paths::DATA_ROOT;

pub const ENCRYPTION_KEY_ENV: &str = "CAR_ENCRYPTION_KEY";
pub const ENCRYPTION_SALT_ENV: &str = "CAR_ENCRYPTION_SALT";
pub const PBKDF2_ITERATIONS_ENV: &str = "PBKDF2_ITERATIONS";

/// Directory holding the envelope file.
///
/// Must be the same across restarts; a new directory means a new, empty store.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

pub const WIFI_KEY_FILE_ENV: &str = "WIFI_KEY_FILE";
pub const WIFI_SSID_FILE_ENV: &str = "WIFI_SSID_FILE";
pub const WIFI_PASSWORD_FILE_ENV: &str = "WIFI_PASSWORD_FILE";
pub const DEFAULT_WIFI_KEY_FILE: &str = "/etc/wifi_ap/encryption_key";
pub const DEFAULT_WIFI_SSID_FILE: &str = "/etc/wifi_ap/encrypted_ssid";
pub const DEFAULT_WIFI_PASSWORD_FILE: &str = "/etc/wifi_ap/encrypted_password";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    MissingSecret(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Locations of the OpenSSL-encrypted network credential files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFiles {
    pub key_file: PathBuf,
    pub ssid_file: PathBuf,
    pub passphrase_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secrets: Secrets,
    pub kdf: KdfParams,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub credential_files: CredentialFiles,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingSecret(name))
        };
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.into());

        let secrets = Secrets::new(secret(ENCRYPTION_KEY_ENV)?, secret(ENCRYPTION_SALT_ENV)?);

        let kdf = match lookup(PBKDF2_ITERATIONS_ENV) {
            None => KdfParams::default(),
            Some(value) => KdfParams::new(value.trim().parse::<NonZeroU32>().map_err(|_| {
                ConfigError::Invalid {
                    name: PBKDF2_ITERATIONS_ENV,
                    value,
                }
            })?),
        };

        let port = match lookup(PORT_ENV) {
            None => DEFAULT_PORT,
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value,
            })?,
        };

        Ok(Self {
            secrets,
            kdf,
            data_dir: PathBuf::from(or_default(DATA_DIR_ENV, DATA_ROOT)),
            host: or_default(HOST_ENV, DEFAULT_HOST),
            port,
            credential_files: CredentialFiles {
                key_file: or_default(WIFI_KEY_FILE_ENV, DEFAULT_WIFI_KEY_FILE).into(),
                ssid_file: or_default(WIFI_SSID_FILE_ENV, DEFAULT_WIFI_SSID_FILE).into(),
                passphrase_file: or_default(WIFI_PASSWORD_FILE_ENV, DEFAULT_WIFI_PASSWORD_FILE)
                    .into(),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
