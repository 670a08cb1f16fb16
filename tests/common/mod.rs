//! Shared test helpers for sos integration tests.
//!
//! Every test works inside its own temp directory, so the default
//! `sos.toml` lookup never sees a real configuration.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Fresh, empty working directory.
pub fn workdir() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}

/// Write `content` to `name` below `dir`.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(path, content).expect("failed to write file");
}

fn sos_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sos"));
    cmd.args(args)
        .current_dir(dir)
        .env_remove("SOS_CONFIG")
        .env_remove("SOS_LOG")
        .env_remove("SOS_LOG_FORMAT");
    cmd
}

/// Run sos in `dir` with stdin closed.
pub fn sos_in(dir: &Path, args: &[&str]) -> Output {
    sos_command(dir, args).output().expect("failed to execute sos")
}

/// Run sos in `dir`, feeding `input` on stdin.
pub fn sos_with_input(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = sos_command(dir, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn sos");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for sos")
}

/// Run sos and assert it succeeds. Returns stdout as string.
pub fn sos_ok(dir: &Path, args: &[&str]) -> String {
    let out = sos_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "sos {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Run sos and assert it fails. Returns stderr as string.
pub fn sos_fails(dir: &Path, args: &[&str]) -> String {
    let out = sos_in(dir, args);
    assert!(
        !out.status.success(),
        "Expected sos {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}
