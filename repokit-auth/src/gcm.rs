//! HTTPS credential pre-flight over the `git credential` fill/approve
//! protocol.
//!
//! This is the one intentionally blocking, human-in-the-loop step in a run:
//! when the platform store has no entry for `(base_url, username)`, the
//! operator is told to complete the interactive sign-in and the process waits
//! on stdin with no timeout. There is no skip; the operator acts or
//! interrupts the whole run.

use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

use crate::error::AuthError;
use crate::probe::CredentialStoreProbe;

/// Outcome of [`ensure_credential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    /// The store already held an entry; nothing to do.
    Present,
    /// The interactive handshake ran and the result was persisted.
    Stored,
}

/// Key/value request block for the `git credential` protocol.
pub(crate) fn credential_request(base_url: &str, username: &str) -> Result<String, AuthError> {
    let (protocol, host) = base_url
        .split_once("://")
        .ok_or_else(|| AuthError::InvalidBaseUrl {
            url: base_url.to_string(),
        })?;
    Ok(format!(
        "protocol={protocol}\nhost={host}\nusername={username}\n\n"
    ))
}

/// Ensure the credential store holds an entry for `(base_url, username)`.
///
/// Probes the platform store first; when absent, blocks on operator
/// confirmation, then drives `git credential fill` (which triggers the
/// helper's interactive browser handshake) and persists the result with
/// `git credential approve`.
pub fn ensure_credential(
    base_url: &str,
    username: &str,
    probe: &dyn CredentialStoreProbe,
) -> Result<Preflight, AuthError> {
    if probe.lookup(base_url, username) {
        tracing::debug!("{}: entry present for {username} at {base_url}", probe.label());
        return Ok(Preflight::Present);
    }

    eprintln!("No stored credential for {username} at {base_url} ({}).", probe.label());
    eprint!("Press Enter to start the interactive sign-in: ");
    let _ = std::io::stderr().flush();
    wait_for_operator();

    let request = credential_request(base_url, username)?;
    let filled = run_credential("fill", &request)?;
    run_credential("approve", &filled)?;
    Ok(Preflight::Stored)
}

/// Block until the operator confirms (EOF counts as confirmation so
/// non-interactive runs proceed straight to the helper).
fn wait_for_operator() {
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}

/// Run `git credential <action>` feeding `input` on stdin.
fn run_credential(action: &str, input: &str) -> Result<String, AuthError> {
    let program = format!("git credential {action}");
    let mut child = Command::new("git")
        .args(["credential", action])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AuthError::Spawn {
            program: program.clone(),
            source: e,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|e| AuthError::Spawn {
                program: program.clone(),
                source: e,
            })?;
    }

    let output = child.wait_with_output().map_err(|e| AuthError::Spawn {
        program: program.clone(),
        source: e,
    })?;
    if !output.status.success() {
        return Err(AuthError::Tool {
            program,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
