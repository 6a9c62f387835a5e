//! Platform credential-store probes.
//!
//! A probe answers one question: does the platform store already hold an
//! entry for `(base_url, username)`? Lookups shell out to the platform
//! facility and treat any failure as "absent" so a broken store degrades to
//! the interactive pre-flight instead of aborting the run.

use std::process::Command;

/// Read-only capability over the platform credential store.
///
/// Selected once at startup via [`detect`] and injected into the reconciler.
pub trait CredentialStoreProbe {
    /// Human-readable backend name for log lines.
    fn label(&self) -> &'static str;

    /// Whether an entry exists for the service/account pair.
    fn lookup(&self, base_url: &str, username: &str) -> bool;
}

/// Host portion of a `scheme://host` base URL.
fn host_of(base_url: &str) -> &str {
    base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url)
}

/// macOS keychain, via `security find-internet-password`.
pub struct MacKeychainProbe;

impl CredentialStoreProbe for MacKeychainProbe {
    fn label(&self) -> &'static str {
        "macOS keychain"
    }

    fn lookup(&self, base_url: &str, username: &str) -> bool {
        Command::new("security")
            .args(["find-internet-password", "-s", host_of(base_url), "-a", username])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// freedesktop Secret Service, via `secret-tool lookup`.
pub struct SecretServiceProbe;

impl CredentialStoreProbe for SecretServiceProbe {
    fn label(&self) -> &'static str {
        "secret service"
    }

    fn lookup(&self, base_url: &str, username: &str) -> bool {
        Command::new("secret-tool")
            .args(["lookup", "server", host_of(base_url), "user", username])
            .output()
            .map(|o| o.status.success() && !o.stdout.is_empty())
            .unwrap_or(false)
    }
}

/// Windows Credential Manager, via `cmdkey /list`.
pub struct WindowsCredManProbe;

impl CredentialStoreProbe for WindowsCredManProbe {
    fn label(&self) -> &'static str {
        "Windows credential manager"
    }

    fn lookup(&self, base_url: &str, username: &str) -> bool {
        Command::new("cmdkey")
            .arg(format!("/list:git:{base_url}"))
            .output()
            .map(|o| {
                o.status.success()
                    && String::from_utf8_lossy(&o.stdout).contains(username)
            })
            .unwrap_or(false)
    }
}

/// Select the probe for the runtime platform.
pub fn detect() -> Box<dyn CredentialStoreProbe> {
    if cfg!(target_os = "macos") {
        Box::new(MacKeychainProbe)
    } else if cfg!(target_os = "windows") {
        Box::new(WindowsCredManProbe)
    } else {
        Box::new(SecretServiceProbe)
    }
}
