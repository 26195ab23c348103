//! Init command implementation
//!
//! Scaffolds an `idgate.toml` and `.env.example` in a directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (idgate.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
    /// Token lifetime in seconds
    pub token_ttl_secs: u64,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing idgate");

    let base_path = &config.path;
    if let Err(e) = fs::create_dir_all(base_path) {
        output.error(&format!("Failed to create {}: {}", base_path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let config_path = base_path.join("idgate.toml");
    if config_path.exists() && !config.force {
        output.warning("idgate.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if let Err(e) = write_file(&config_path, &generate_idgate_toml(&config), config.force) {
        output.error(&format!("Failed to create idgate.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "idgate.toml");

    let env_example_path = base_path.join(".env.example");
    if env_example_path.exists() && !config.force {
        output.skipped(".env.example", "already exists");
    } else if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.warning(&format!("Failed to create .env.example: {}", e));
    } else {
        output.created("env", ".env.example");
    }

    output.header("Next Steps");
    output.newline();
    output.info("1. Hash a password for the seeded user:");
    output.command("idgate-server hash-password");
    output.info("2. Paste it as password_hash under [users.admin] in idgate.toml");
    output.info("3. Start the server:");
    output.command("idgate-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(()); // Skip existing files unless force is true
    }
    fs::write(path, content)
}

fn generate_idgate_toml(config: &InitConfig) -> String {
    format!(
        r#"# idgate configuration
# Changes are hot-reloaded while the server runs.

[server]
host = "{host}"
port = {port}
log_level = "info"

[auth]
# Token lifetime in seconds
token_ttl_secs = {ttl}
# Expired token sweep period in seconds (0 disables the sweeper)
sweep_interval_secs = 300

# Seeded principals. The table key is the principal id and login username.
# Generate password_hash with: idgate-server hash-password
[users.admin]
display_name = "Administrator"
# email = "admin@example.com"
# password_hash = "$argon2id$v=19$..."
"#,
        host = config.host,
        port = config.port,
        ttl = config.token_ttl_secs,
    )
}

fn generate_env_example() -> String {
    r#"# Overrides for idgate.toml [server]
# IDGATE_HOST=0.0.0.0
# IDGATE_PORT=8080

# Log filter, takes precedence over server.log_level
# RUST_LOG=idgate=debug,tower_http=info
"#
    .to_string()
}
