// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Network Credential Provider
//!
//! The vehicle record embeds the Wi-Fi access point name and passphrase of
//! the device it runs on. They are not supplied by API callers: the device
//! keeps them OpenSSL-encrypted under `/etc/wifi_ap/`, and the service
//! decrypts them once at startup.
//!
//! Failure to obtain credentials is fatal to the process; there is no
//! vehicle record without them.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Iteration count the device provisioning used for the encrypted files.
pub const OPENSSL_PBKDF2_ITERATIONS: u32 = 10_000;

/// Wi-Fi network name and passphrase.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct NetworkCredentials {
    pub ssid: String,
    pub passphrase: String,
}

impl NetworkCredentials {
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        }
    }
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &self.ssid)
            .field("passphrase", &"[hidden]")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to run openssl for {}: {source}", .file.display())]
    Spawn {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("openssl exited with {status} for {}: {stderr}", .file.display())]
    Decrypt {
        file: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("decrypted {0} is not valid UTF-8")]
    Encoding(&'static str),

    #[error("Invalid WiFi credentials: {0} is empty")]
    Empty(&'static str),
}

/// Capability that yields the device network credentials.
pub trait CredentialProvider: Send + Sync {
    fn fetch(&self) -> Result<NetworkCredentials, CredentialError>;
}

/// Decrypts the credential files with the `openssl` command line tool.
#[derive(Debug, Clone)]
pub struct OpensslCredentialProvider {
    key_file: PathBuf,
    ssid_file: PathBuf,
    passphrase_file: PathBuf,
}

impl OpensslCredentialProvider {
    pub fn new(
        key_file: impl Into<PathBuf>,
        ssid_file: impl Into<PathBuf>,
        passphrase_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key_file: key_file.into(),
            ssid_file: ssid_file.into(),
            passphrase_file: passphrase_file.into(),
        }
    }

    fn command(&self, input: &Path) -> Command {
        let mut command = Command::new("openssl");
        command
            .args(["enc", "-d", "-aes-256-cbc", "-a", "-salt", "-pbkdf2", "-iter"])
            .arg(OPENSSL_PBKDF2_ITERATIONS.to_string())
            .arg("-pass")
            .arg(format!("file:{}", self.key_file.display()))
            .arg("-in")
            .arg(input);
        command
    }

    fn decrypt(&self, input: &Path, label: &'static str) -> Result<String, CredentialError> {
        let output = self
            .command(input)
            .output()
            .map_err(|source| CredentialError::Spawn {
                file: input.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(CredentialError::Decrypt {
                file: input.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| CredentialError::Encoding(label))?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty(label));
        }
        Ok(trimmed.to_string())
    }
}

impl CredentialProvider for OpensslCredentialProvider {
    fn fetch(&self) -> Result<NetworkCredentials, CredentialError> {
        let ssid = self.decrypt(&self.ssid_file, "SSID")?;
        let passphrase = self.decrypt(&self.passphrase_file, "passphrase")?;
        Ok(NetworkCredentials { ssid, passphrase })
    }
}

/// Fixed credentials, for tests and local runs without provisioning files.
#[derive(Debug, Clone)]
pub struct StaticCredentials(NetworkCredentials);

impl StaticCredentials {
    pub fn new(credentials: NetworkCredentials) -> Self {
        Self(credentials)
    }
}

impl CredentialProvider for StaticCredentials {
    fn fetch(&self) -> Result<NetworkCredentials, CredentialError> {
        if self.0.ssid.is_empty() {
            return Err(CredentialError::Empty("SSID"));
        }
        if self.0.passphrase.is_empty() {
            return Err(CredentialError::Empty("passphrase"));
        }
        Ok(self.0.clone())
    }
}

/// Caches the first successful fetch for the process lifetime.
///
/// Failures are not cached, so a later call retries the inner provider.
pub struct CachedCredentials<P> {
    inner: P,
    cached: OnceLock<NetworkCredentials>,
}

impl<P: CredentialProvider> CachedCredentials<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cached: OnceLock::new(),
        }
    }
}

impl<P: CredentialProvider> CredentialProvider for CachedCredentials<P> {
    fn fetch(&self) -> Result<NetworkCredentials, CredentialError> {
        if let Some(credentials) = self.cached.get() {
            return Ok(credentials.clone());
        }
        let fetched = self.inner.fetch()?;
        Ok(self.cached.get_or_init(|| fetched).clone())
    }
}
