//! SSH key material and the tool-owned client-config fragment.
//!
//! Key pairs are named deterministically from the host alias and generated
//! once; they are never rotated by this tool. Host stanzas live in a fragment
//! file the tool fully regenerates on every run; the user's main ssh config
//! gets exactly one `Include` line pointing at it.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{io_err, AuthError};

/// Name of the managed fragment inside the configured ssh folder.
pub const FRAGMENT_NAME: &str = "repokit_hosts";

const FRAGMENT_HEADER: &str =
    "# Managed by repokit. Regenerated on every sync run; edits here are lost.\n";

/// One `Host` stanza in the managed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStanza {
    pub alias: String,
    pub hostname: String,
    pub identity_file: PathBuf,
}

impl HostStanza {
    fn render(&self) -> String {
        format!(
            "Host {alias}\n    HostName {hostname}\n    User git\n    IdentityFile {identity}\n    IdentitiesOnly yes\n",
            alias = self.alias,
            hostname = self.hostname,
            identity = self.identity_file.display(),
        )
    }
}

/// `<ssh_folder>/id_<host_alias>` — deterministic key pair location.
pub fn key_path(ssh_folder: &Path, host_alias: &str) -> PathBuf {
    ssh_folder.join(format!("id_{host_alias}"))
}

/// `<ssh_folder>/repokit_hosts` — the managed fragment location.
pub fn fragment_path(ssh_folder: &Path) -> PathBuf {
    ssh_folder.join(FRAGMENT_NAME)
}

/// `<home>/.ssh/config` — the user's main ssh client config.
pub fn default_config_path() -> Result<PathBuf, AuthError> {
    let home = dirs::home_dir().ok_or(AuthError::HomeNotFound)?;
    Ok(home.join(".ssh").join("config"))
}

/// Comment baked into generated keys: operating user, host, account
/// username, and the remote URL the key is meant for.
pub fn key_comment(hostname: &str, account_username: &str, remote_url: &str) -> String {
    let operator = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{operator}@{hostname} {account_username} {remote_url}")
}

/// Ensure a key pair exists for `host_alias`, generating it on first use.
///
/// Generation uses the declared key type, an empty passphrase, and `comment`.
/// An existing key is left untouched.
pub fn ensure_keypair(
    ssh_folder: &Path,
    host_alias: &str,
    key_type: &str,
    comment: &str,
) -> Result<PathBuf, AuthError> {
    std::fs::create_dir_all(ssh_folder).map_err(|e| io_err(ssh_folder, e))?;
    set_dir_permissions(ssh_folder)?;

    let key = key_path(ssh_folder, host_alias);
    if key.exists() {
        tracing::debug!("key pair already present: {}", key.display());
        return Ok(key);
    }

    let output = Command::new("ssh-keygen")
        .arg("-q")
        .arg("-t")
        .arg(key_type)
        .arg("-N")
        .arg("")
        .arg("-C")
        .arg(comment)
        .arg("-f")
        .arg(&key)
        .output()
        .map_err(|e| AuthError::Spawn {
            program: "ssh-keygen".to_string(),
            source: e,
        })?;
    if !output.status.success() {
        return Err(AuthError::Tool {
            program: "ssh-keygen".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    tracing::info!("generated key pair: {}", key.display());
    Ok(key)
}

/// Regenerate the managed fragment from scratch with one stanza per account.
///
/// Write flow: render → `.tmp` sibling → `chmod 0600` → `rename`.
pub fn write_fragment(ssh_folder: &Path, stanzas: &[HostStanza]) -> Result<PathBuf, AuthError> {
    std::fs::create_dir_all(ssh_folder).map_err(|e| io_err(ssh_folder, e))?;
    set_dir_permissions(ssh_folder)?;

    let mut content = String::from(FRAGMENT_HEADER);
    for stanza in stanzas {
        content.push('\n');
        content.push_str(&stanza.render());
    }

    let path = fragment_path(ssh_folder);
    let tmp = path.with_file_name(format!("{FRAGMENT_NAME}.tmp"));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// Insert `Include <fragment>` into the main ssh config once.
///
/// Returns `true` when the directive was inserted, `false` when it was
/// already present. The config file (and `~/.ssh/`) are created if absent.
pub fn ensure_include(config_path: &Path, fragment: &Path) -> Result<bool, AuthError> {
    let directive = format!("Include {}", fragment.display());
    let existing = match std::fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(config_path, e)),
    };
    if existing.lines().any(|line| line.trim() == directive) {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        set_dir_permissions(parent)?;
    }
    // The include goes first so managed stanzas win over later catch-alls.
    let updated = if existing.is_empty() {
        format!("{directive}\n")
    } else {
        format!("{directive}\n\n{existing}")
    };
    let tmp = config_path.with_file_name("config.repokit.tmp");
    std::fs::write(&tmp, updated).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, config_path).map_err(|e| io_err(config_path, e))?;
    Ok(true)
}

/// Load a key into the running agent. Duplicate loads are harmless; a missing
/// or unreachable agent is logged and tolerated.
pub fn load_into_agent(key: &Path) -> bool {
    let loaded = Command::new("ssh-add")
        .arg(key)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !loaded {
        tracing::warn!("could not load {} into ssh agent", key.display());
    }
    loaded
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), AuthError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), AuthError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), AuthError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), AuthError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stanza(alias: &str) -> HostStanza {
        HostStanza {
            alias: alias.to_string(),
            hostname: "github.com".to_string(),
            identity_file: PathBuf::from("/ssh/id_x"),
        }
    }

    #[test]
    fn key_path_is_deterministic() {
        let path = key_path(Path::new("/ssh"), "github-acme");
        assert_eq!(path, PathBuf::from("/ssh/id_github-acme"));
    }

    #[test]
    fn fragment_is_fully_regenerated() {
        let tmp = TempDir::new().expect("tempdir");
        write_fragment(tmp.path(), &[stanza("one"), stanza("two")]).expect("write");
        let first = std::fs::read_to_string(fragment_path(tmp.path())).expect("read");
        assert!(first.contains("Host one"));
        assert!(first.contains("Host two"));
        assert!(first.contains("IdentitiesOnly yes"));

        write_fragment(tmp.path(), &[stanza("two")]).expect("rewrite");
        let second = std::fs::read_to_string(fragment_path(tmp.path())).expect("read");
        assert!(!second.contains("Host one"), "stale stanzas must not survive");
        assert!(second.contains("Host two"));
    }

    #[test]
    fn fragment_write_cleans_up_tmp() {
        let tmp = TempDir::new().expect("tempdir");
        write_fragment(tmp.path(), &[stanza("one")]).expect("write");
        assert!(!tmp.path().join(format!("{FRAGMENT_NAME}.tmp")).exists());
    }

    #[test]
    fn include_inserted_exactly_once() {
        let tmp = TempDir::new().expect("tempdir");
        let config = tmp.path().join("ssh").join("config");
        let fragment = tmp.path().join("ssh").join(FRAGMENT_NAME);

        assert!(ensure_include(&config, &fragment).expect("first insert"));
        assert!(!ensure_include(&config, &fragment).expect("second insert"));

        let contents = std::fs::read_to_string(&config).expect("read");
        let directive = format!("Include {}", fragment.display());
        assert_eq!(
            contents.lines().filter(|l| l.trim() == directive).count(),
            1
        );
    }

    #[test]
    fn include_preserves_existing_config() {
        let tmp = TempDir::new().expect("tempdir");
        let config = tmp.path().join("config");
        std::fs::write(&config, "Host legacy\n    HostName legacy.example\n").expect("seed");
        let fragment = tmp.path().join(FRAGMENT_NAME);

        ensure_include(&config, &fragment).expect("insert");
        let contents = std::fs::read_to_string(&config).expect("read");
        assert!(contents.starts_with("Include "));
        assert!(contents.contains("Host legacy"));
    }

    #[test]
    fn comment_embeds_account_details() {
        let comment = key_comment("github.com", "me-acme", "https://github.com/acme");
        assert!(comment.contains("github.com"));
        assert!(comment.contains("me-acme"));
        assert!(comment.contains("https://github.com/acme"));
    }

    #[test]
    fn ensure_keypair_generates_once() {
        if std::process::Command::new("ssh-keygen")
            .arg("-?")
            .output()
            .is_err()
        {
            eprintln!("ssh-keygen not available; skipping");
            return;
        }
        let tmp = TempDir::new().expect("tempdir");
        let key = ensure_keypair(tmp.path(), "github-acme", "ed25519", "c").expect("generate");
        assert!(key.exists());
        assert!(key.with_extension("pub").exists());

        let before = std::fs::read(&key).expect("read");
        let again = ensure_keypair(tmp.path(), "github-acme", "ed25519", "c").expect("noop");
        assert_eq!(again, key);
        assert_eq!(std::fs::read(&key).expect("read"), before, "never rotated");
    }
}
