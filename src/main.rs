use anyhow::{bail, Context, Result};
use idgate::{
    api::routes::create_router,
    auth::{
        credentials::hash_password,
        sweeper::{spawn_departed_user_revoker, spawn_expiry_sweeper},
    },
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands, LogFormat,
    },
    AppState, IdgateConfig, IdgateConfigManager,
};
use owo_colors::OwoColorize;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let Cli {
        config,
        verbose,
        no_color,
        log_format,
        command,
    } = Cli::parse_args();

    let output = if no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match command {
        None => serve(&config, verbose, log_format, true).await,
        Some(Commands::Serve { no_watch }) => serve(&config, verbose, log_format, !no_watch).await,
        Some(Commands::Init {
            path,
            force,
            host,
            port,
            token_ttl_secs,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                    token_ttl_secs,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => bail!(e),
            }
        }
        Some(Commands::Config { full, validate }) => show_config(&config, full, validate, &output),
        Some(Commands::HashPassword { password }) => print_password_hash(password, &output),
    }
}

fn init_tracing(log_level: &str, verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { log_level };
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "idgate={level},idgate_server={level},tower_http={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

async fn serve(
    config_path: &Path,
    verbose: bool,
    log_format: LogFormat,
    watch: bool,
) -> Result<()> {
    let config_manager = Arc::new(
        IdgateConfigManager::new(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?,
    );
    let config = config_manager.config();

    init_tracing(&config.server.log_level, verbose, log_format);

    for warning in config.validate_with_warnings()? {
        warn!("{}", warning);
    }

    if watch {
        config_manager.start_watching()?;
    }

    let state = AppState::from_config_manager(config_manager.clone());
    let token_store = state.token_store.clone();
    let revoker = spawn_departed_user_revoker(token_store.clone(), config_manager.subscribe());

    let sweeper = (config.auth.sweep_interval_secs > 0).then(|| {
        spawn_expiry_sweeper(
            token_store.clone(),
            Duration::from_secs(config.auth.sweep_interval_secs),
        )
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %listener.local_addr()?,
        config = %config_manager.config_path().display(),
        users = config.users.len(),
        token_ttl_secs = token_store.ttl().num_seconds(),
        "idgate listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    revoker.abort();
    config_manager.stop_watching();

    info!("idgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn show_config(config_path: &Path, full: bool, validate: bool, output: &Output) -> Result<()> {
    let config = IdgateConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    output.header("Configuration");
    output.kv("file", &config_path.display().to_string());
    output.kv("listen", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log_level", &config.server.log_level);
    output.kv("token_ttl_secs", &config.auth.token_ttl_secs.to_string());
    output.kv("sweep_interval_secs", &config.auth.sweep_interval_secs.to_string());
    output.kv("users", &config.users.len().to_string());

    if full {
        output.header("Users");
        output.table_header(&["Id", "Display name", "Login"]);
        for (id, user) in &config.users {
            let login = if user.password_hash.is_some() { "yes" } else { "no" };
            output.table_row(&[id.as_str(), user.display_name.as_str(), login]);
        }
    }

    if validate {
        output.header("Validation");
        let warnings = config.validate_with_warnings()?;
        for warning in &warnings {
            output.warning(&warning.message);
        }
        output.success("Configuration is valid");
    }

    Ok(())
}

fn print_password_hash(password: Option<String>, output: &Output) -> Result<()> {
    let password = match password {
        Some(p) => {
            output.caution(
                "Passwords given as arguments end up in shell history and the process list; \
                 omit the argument to read it from stdin",
            );
            p
        }
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("password must not be empty");
    }

    let hash = hash_password(&password)?;
    println!("{}", hash);
    Ok(())
}
