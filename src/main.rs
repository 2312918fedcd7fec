#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use letter_rally_server::config;
use letter_rally_server::logging;
use letter_rally_server::server::registry::RoomRegistry;
use letter_rally_server::web::{self, AppState};

/// Letter Rally -- authoritative backend for letter-round party word games
#[derive(Parser, Debug)]
#[command(name = "letter-rally-server")]
#[command(about = "Authoritative real-time backend for letter-round party word games")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use code defaults.
    let cfg = Arc::new(config::load());

    // Handle --print-config: output the loaded configuration as JSON
    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate(&cfg);

    // Handle --validate-config: exit after validation
    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  CORS origins: {}", cfg.server.cors_origins);
                println!("  Room cleanup interval: {}s", cfg.server.room_cleanup_interval);
                println!("  Subscriber buffer: {}", cfg.server.subscriber_buffer);
                println!(
                    "  Room log: {}",
                    cfg.server
                        .room_log_path
                        .as_ref()
                        .map_or("disabled".to_string(), |p| p.display().to_string())
                );
                println!("  Max participants per room: {}", cfg.game.max_participants_limit);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    // In normal operation, propagate validation errors
    validation_result.map_err(|e| anyhow::anyhow!("invalid configuration:\n{e}"))?;

    // Initialize logging from config.
    logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(%addr, "Starting Letter Rally server");

    let registry = Arc::new(RoomRegistry::new(cfg.clone()));

    // Periodic sweep of terminal rooms without subscribers.
    tokio::spawn(registry.clone().run_cleanup());

    let app = web::create_router(&cfg.server.cors_origins).with_state(AppState::new(registry));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        cors_origins = %cfg.server.cors_origins,
        "Server started - control surface: /api/rooms, push surface: /ws/{{code}}"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_default_no_flags() {
        let cli = Cli::try_parse_from(["letter-rally-server"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_validate_config_flags() {
        let cli = Cli::try_parse_from(["letter-rally-server", "--validate-config"]).unwrap();
        assert!(cli.validate_config);
        let cli = Cli::try_parse_from(["letter-rally-server", "-c"]).unwrap();
        assert!(cli.validate_config);
    }

    #[test]
    fn test_cli_print_config() {
        let cli = Cli::try_parse_from(["letter-rally-server", "--print-config"]).unwrap();
        assert!(cli.print_config);
        assert!(!cli.validate_config);
    }

    #[test]
    fn test_cli_validate_and_print_config_conflict() {
        // --validate-config and --print-config are mutually exclusive
        let result = Cli::try_parse_from([
            "letter-rally-server",
            "--validate-config",
            "--print-config",
        ]);
        assert!(result.is_err());
    }
}
