//! CLI integration tests for idgate-server
//!
//! Runs the built binary for help, init, config and hash-password.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Run idgate-server with arguments in an optional working directory
fn run_idgate(args: &[&str], working_dir: Option<&str>) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_idgate-server"));
    cmd.args(args).env_remove("IDGATE_CONFIG");

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    cmd.output().expect("Failed to execute command")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_idgate(&["--help"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("idgate"));
    assert!(stdout.contains("USAGE") || stdout.contains("Usage"));
    assert!(stdout.contains("init"));
    assert!(stdout.contains("config"));
    assert!(stdout.contains("hash-password"));
    assert!(stdout.contains("--log-format"));
}

#[test]
fn test_version_command() {
    let output = run_idgate(&["--version"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("idgate-server"));
}

#[test]
fn test_init_help() {
    let output = run_idgate(&["init", "--help"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--force"));
    assert!(stdout.contains("--host"));
    assert!(stdout.contains("--port"));
    assert!(stdout.contains("--token-ttl-secs"));
}

// =============================================================================
// Init Command Tests
// =============================================================================

#[test]
fn test_init_creates_idgate_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_idgate(&["--no-color", "init", temp_path], None);
    assert!(output.status.success(), "Init command failed: {:?}", output);

    let config_path = temp_dir.path().join("idgate.toml");
    assert!(config_path.exists(), "idgate.toml was not created");

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("[auth]"));
    assert!(content.contains("[users.admin]"));
    assert!(temp_dir.path().join(".env.example").exists());
}

#[test]
fn test_init_with_custom_host_port_and_ttl() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_idgate(
        &[
            "--no-color",
            "init",
            temp_path,
            "--host",
            "0.0.0.0",
            "--port",
            "9100",
            "--token-ttl-secs",
            "600",
        ],
        None,
    );
    assert!(output.status.success());

    let content = fs::read_to_string(temp_dir.path().join("idgate.toml")).unwrap();
    assert!(content.contains("host = \"0.0.0.0\""));
    assert!(content.contains("port = 9100"));
    assert!(content.contains("token_ttl_secs = 600"));
}

#[test]
fn test_init_keeps_existing_without_force() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();
    let config_path = temp_dir.path().join("idgate.toml");
    fs::write(&config_path, "# hand written\n").unwrap();

    let output = run_idgate(&["--no-color", "init", temp_path], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "# hand written\n");

    let output = run_idgate(&["--no-color", "init", temp_path, "--force"], None);
    assert!(output.status.success());
    assert!(fs::read_to_string(&config_path)
        .unwrap()
        .contains("[users.admin]"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_command_after_init() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_idgate(&["--no-color", "init"], Some(temp_path));
    assert!(output.status.success());

    let output = run_idgate(&["--no-color", "config", "--full", "--validate"], Some(temp_path));
    assert!(output.status.success(), "config failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("token_ttl_secs"));
    assert!(stdout.contains("admin"));
    assert!(stdout.contains("Configuration is valid"));
    // The seeded admin has no password yet
    assert!(stdout.contains("password_hash"));
}

#[test]
fn test_config_command_without_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_idgate(&["--no-color", "config"], Some(temp_path));
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("idgate.toml"));
}

#[test]
fn test_config_rejects_invalid_ttl() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();
    fs::write(
        temp_dir.path().join("idgate.toml"),
        "[auth]\ntoken_ttl_secs = 0\n",
    )
    .unwrap();

    let output = run_idgate(&["--no-color", "config", "--validate"], Some(temp_path));
    assert!(!output.status.success());
}

// =============================================================================
// Hash Password Tests
// =============================================================================

#[test]
fn test_hash_password_argument() {
    let output = run_idgate(&["hash-password", "correct horse"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().starts_with("$argon2"));
    assert_eq!(stdout.lines().count(), 1);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shell history"));
}

#[test]
fn test_hash_password_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_idgate-server"))
        .arg("hash-password")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"from-stdin\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("shell history"));
    assert!(String::from_utf8_lossy(&output.stdout)
        .trim()
        .starts_with("$argon2"));
}

#[test]
fn test_hash_password_rejects_empty() {
    let output = run_idgate(&["hash-password", ""], None);
    assert!(!output.status.success());
}
