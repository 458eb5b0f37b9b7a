//! anycast-healthd
//!
//! Announces anycast addresses only while the local service is healthy.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────── anycast-healthd ────────────────────────────────┐
//!   │                                                                                 │
//!   │   ┌──────────┐   tick    ┌──────────────┐  target   ┌───────────────────┐      │
//!   │   │lifecycle │──────────▶│   failover   │──────────▶│      address      │      │
//!   │   │ signals  │ shutdown  │  controller  │           │ manager + iproute │──────┼──▶ kernel: ip addr on lo
//!   │   └──────────┘           └──────┬───────┘           └───────────────────┘      │         │
//!   │                                 │ probe                                        │         ▼
//!   │                          ┌──────▼───────┐                                      │    zebra/ospfd
//!   │                          │    health    │── dns / tcp / http / command ───────┼──▶ local service
//!   │                          └──────────────┘                                      │
//!   │                                                                                 │
//!   │   config (TOML + env)   observability (tracing, prometheus)   resilience       │
//!   └─────────────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use anycast_healthd::address::{AddressManager, AddressSet, IpCommand};
use anycast_healthd::config::{load_config, DaemonConfig};
use anycast_healthd::health::{build_probe, run_probe};
use anycast_healthd::lifecycle::{render_program, run_daemon, ExitStatus};
use anycast_healthd::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "anycast-healthd")]
#[command(version, about = "Health-check driven anycast address controller", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "/etc/anycast-healthd/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller in the foreground (default)
    Run,
    /// Probe the local service once; exit 0 if healthy, 1 if not
    Check,
    /// Show which anycast addresses are bound on the interface
    Status,
    /// Validate the configuration and exit
    Validate,
    /// Print the supervisord program stanza for this daemon
    SupervisorProgram,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("anycast-healthd: {}: {}", cli.config.display(), e);
            return ExitStatus::ConfigError.into();
        }
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            if let Err(e) = init_logging(&config.observability) {
                eprintln!("anycast-healthd: failed to initialize logging: {}", e);
                return ExitStatus::ConfigError.into();
            }
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "anycast-healthd starting");
            let status = run_daemon(config).await;
            tracing::info!(exit_code = status.code(), "Shutdown complete");
            status.into()
        }
        Commands::Check => check(&config).await,
        Commands::Status => status(&config).await,
        Commands::Validate => {
            println!(
                "configuration OK: {} address(es) on {}, {:?} probe every {}s",
                config.addresses.len(),
                config.interface,
                config.probe.kind,
                config.probe.interval_secs
            );
            ExitCode::SUCCESS
        }
        Commands::SupervisorProgram => {
            print!(
                "{}",
                render_program(
                    &config.supervisor,
                    &cli.config,
                    config.shutdown.grace_period_secs
                )
            );
            ExitCode::SUCCESS
        }
    }
}

async fn check(config: &DaemonConfig) -> ExitCode {
    let probe = match build_probe(&config.probe) {
        Ok(probe) => probe,
        Err(e) => {
            eprintln!("anycast-healthd: {}", e);
            return ExitStatus::ConfigError.into();
        }
    };

    let result = run_probe(&probe, config.probe.timeout()).await;
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("anycast-healthd: cannot render result: {}", e),
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn status(config: &DaemonConfig) -> ExitCode {
    let set = match AddressSet::from_cidrs(&config.interface, &config.addresses) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("anycast-healthd: {}", e);
            return ExitStatus::ConfigError.into();
        }
    };

    let manager = AddressManager::new(IpCommand::default());
    match manager.report(&set).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("anycast-healthd: cannot render status: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("anycast-healthd: cannot read {}: {}", set.interface(), e);
            ExitCode::FAILURE
        }
    }
}
