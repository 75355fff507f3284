//! GPU CLI - acquire, monitor and release Lambda Cloud GPU instances.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lambda_gpu::acquire::acquire;
use lambda_gpu::catalog::build_snapshot;
use lambda_gpu::config::{
    AcquireConfig, LaunchConfig, ProviderConfig, ShellConfig, DEFAULT_API_URL,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SSH_USER, DEFAULT_TIMEOUT_SECS,
};
use lambda_gpu::lifecycle::{
    self, ConnectOutcome, LaunchOutcome, ProviderRejection, TerminateOutcome,
};
use lambda_gpu::providers::lambda::Lambda;
use lambda_gpu::session::SshShell;
use lambda_gpu::{GpuProvider, InstanceStatus, RunningInstance};

/// GPU CLI - Grab GPU instances from Lambda Cloud.
#[derive(Parser)]
#[command(name = "gpu")]
#[command(about = "Acquire, monitor and release Lambda Cloud GPU instances")]
struct Cli {
    /// Lambda Cloud API key (or set `LAMBDA_API_KEY` env var).
    #[arg(long, env = "LAMBDA_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// API root URL.
    #[arg(long, env = "LAMBDA_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    request_timeout: u64,

    /// SSH key names registered with Lambda Cloud (comma-separated).
    #[arg(long, env = "LAMBDA_SSH_KEY_NAMES", value_delimiter = ',')]
    ssh_key_names: Vec<String>,

    /// Private key used by `connect`.
    #[arg(long, env = "LAMBDA_SSH_KEY_PATH")]
    ssh_key_path: Option<PathBuf>,

    /// Login user used by `connect`.
    #[arg(long, env = "LAMBDA_SSH_USER", default_value = DEFAULT_SSH_USER)]
    ssh_user: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List instance types with capacity, numbered for `start`.
    List,

    /// Show running instances.
    Check {
        /// Include instances that are not active yet (or any more).
        #[arg(long, default_value = "false")]
        all: bool,
    },

    /// Launch the instance type with the given number (from `list`).
    Start {
        /// Number shown by `list`.
        index: usize,

        /// Abort unless the number still refers to this instance type.
        #[arg(long)]
        expect_type: Option<String>,

        /// Name for the new instance.
        #[arg(long)]
        name: Option<String>,
    },

    /// Terminate an instance.
    Stop {
        /// Instance ID.
        instance_id: String,
    },

    /// Open an SSH session on an active instance.
    Connect {
        /// Instance ID.
        instance_id: String,
    },

    /// Wait until an instance type has capacity, then launch it.
    Acquire {
        /// Instance type (e.g. `gpu_1x_h100_pcie`).
        type_id: String,

        /// Seconds between capacity checks (at least 1).
        #[arg(
            long,
            default_value_t = DEFAULT_POLL_INTERVAL_SECS,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,

        /// Give up after this many seconds (default: wait forever).
        #[arg(long)]
        timeout: Option<u64>,

        /// Name for the new instance.
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the report
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let provider_config = ProviderConfig {
        api_key: cli.api_key.trim().to_string(),
        base_url: cli.api_url.clone(),
        timeout: Duration::from_secs(cli.request_timeout),
    };
    let provider = Lambda::new(provider_config).context("Failed to create Lambda provider")?;

    run(cli, &provider).await
}

/// Execute one command against `provider`. Any `Err` exits non-zero.
async fn run<P: GpuProvider>(cli: Cli, provider: &P) -> Result<()> {
    let ssh_key_names: Vec<String> = cli
        .ssh_key_names
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    match cli.command {
        Commands::List => {
            let snapshot = build_snapshot(provider).await?;

            if snapshot.is_empty() {
                println!("\n🔴 There are no GPUs currently available. Please try again later.");
            } else {
                println!("\n🎮 Available GPU Instance Types");
                println!("{}", "=".repeat(80));
                for (index, offer) in snapshot.available() {
                    let price = offer
                        .hourly_price
                        .map_or_else(|| "n/a".to_string(), |p| format!("${p:.2}/hr"));
                    println!(
                        "{index:>3}. {:<28} {:<24} {:>10}  📍 {}",
                        offer.display_name,
                        offer.type_id,
                        price,
                        offer.available_regions.join(", ")
                    );
                }
            }

            if !snapshot.unavailable().is_empty() {
                println!("\n⚪ Unavailable");
                for label in snapshot.unavailable_labels() {
                    println!("   {label}");
                }
            }
            println!();
        }

        Commands::Check { all } => {
            let instances = if all {
                lifecycle::list_instances(provider).await?
            } else {
                lifecycle::list_running(provider).await?
            };

            if instances.is_empty() {
                println!("\n🔴 There are no GPUs currently running.\n");
                return Ok(());
            }

            println!(
                "\n{:<34} {:<22} {:<16} {:<12}",
                "ID", "TYPE", "IP", "STATUS"
            );
            println!("{}", "-".repeat(90));
            for instance in &instances {
                print_instance(instance);
            }
            println!();
        }

        Commands::Start {
            index,
            expect_type,
            name,
        } => {
            let launch_config = LaunchConfig {
                ssh_key_names,
                instance_name: name,
            };
            let outcome =
                lifecycle::launch_by_index(provider, &launch_config, index, expect_type.as_deref())
                    .await?;
            report_launch(&outcome)?;
        }

        Commands::Stop { instance_id } => {
            match lifecycle::terminate(provider, &instance_id).await? {
                TerminateOutcome::Terminated { .. } => {
                    println!("\n✅ Instance {instance_id} terminated successfully.");
                }
                TerminateOutcome::Rejected(rejection) => {
                    report_rejection("Failed to terminate instance", &rejection);
                    anyhow::bail!("terminate of {instance_id} rejected ({})", rejection.code);
                }
            }
        }

        Commands::Connect { instance_id } => {
            let shell = SshShell::new(ShellConfig {
                key_path: cli.ssh_key_path.clone(),
                user: cli.ssh_user.clone(),
            });

            match lifecycle::connect(provider, &shell, &instance_id).await? {
                ConnectOutcome::Connected { exit_code, .. } => {
                    if exit_code != Some(0) {
                        warn!(exit_code = ?exit_code, "SSH session ended abnormally");
                    }
                }
                ConnectOutcome::NotFound { instance_id } => {
                    anyhow::bail!("No active instance with ID {instance_id}");
                }
            }
        }

        Commands::Acquire {
            type_id,
            interval,
            timeout,
            name,
        } => {
            let launch_config = LaunchConfig {
                ssh_key_names,
                instance_name: name,
            };
            let config = AcquireConfig::new(Duration::from_secs(interval))?;

            let cancel = CancellationToken::new();
            spawn_cancel_on_ctrl_c(cancel.clone());
            if let Some(secs) = timeout {
                spawn_cancel_after(cancel.clone(), Duration::from_secs(secs));
            }

            println!("⏳ Waiting for {type_id} capacity (checking every {interval}s)...");
            let acquisition = acquire(provider, &launch_config, &config, &type_id, cancel)
                .await
                .with_context(|| format!("Acquisition of {type_id} did not complete"))?;

            info!(polls = acquisition.polls, "Acquisition finished");
            report_launch(&acquisition.launch)?;
        }
    }

    Ok(())
}

fn print_instance(instance: &RunningInstance) {
    let status_emoji = match instance.status {
        InstanceStatus::Active => "🟢",
        InstanceStatus::Booting => "🟡",
        InstanceStatus::Unhealthy | InstanceStatus::Terminating => "🟠",
        InstanceStatus::Terminated => "🔴",
        InstanceStatus::Other(_) => "⚪",
    };

    println!(
        "{:<34} {:<22} {:<16} {} {}",
        instance.id,
        instance.type_id,
        instance.ip_address.as_deref().unwrap_or("-"),
        status_emoji,
        instance.status
    );
}

fn report_launch(outcome: &LaunchOutcome) -> Result<()> {
    match outcome {
        LaunchOutcome::Launched {
            instance_ids,
            type_id,
            region,
        } => {
            println!("\n✅ GPU instance started successfully!");
            println!("   Type:   {type_id}");
            println!("   Region: {region}");
            for id in instance_ids {
                println!("   ID:     {id}");
            }
            println!("\n💡 Run `gpu check` until it is active, then `gpu connect <id>`");
            Ok(())
        }
        LaunchOutcome::Rejected(rejection) => {
            report_rejection("Failed to start GPU instance", rejection);
            anyhow::bail!("launch rejected ({})", rejection.code)
        }
    }
}

fn report_rejection(headline: &str, rejection: &ProviderRejection) {
    println!("\n❌ {headline}");
    println!("   Code:    {}", rejection.code);
    println!("   Message: {}", rejection.message);
}

fn spawn_cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping acquisition");
            cancel.cancel();
        }
    });
}

fn spawn_cancel_after(cancel: CancellationToken, after: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        warn!(timeout_secs = after.as_secs(), "Acquisition timed out");
        cancel.cancel();
    });
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const CATALOG: &str = r#"{"data": {
        "gpu_8x_a100": {
            "instance_type": {"name": "gpu_8x_a100", "description": "8x A100", "price_cents_per_hour": 1032},
            "regions_with_capacity_available": []
        },
        "gpu_1x_a10": {
            "instance_type": {"name": "gpu_1x_a10", "description": "1x A10", "price_cents_per_hour": 75},
            "regions_with_capacity_available": [{"name": "us-west-1", "description": "California, USA"}]
        }
    }}"#;

    async fn mock_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance-types"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(CATALOG, "application/json"))
            .mount(&server)
            .await;
        server
    }

    fn provider(server: &MockServer) -> Lambda {
        Lambda::new(ProviderConfig::new("secret_test-key").with_base_url(server.uri())).unwrap()
    }

    fn rejection() -> LaunchOutcome {
        LaunchOutcome::Rejected(ProviderRejection {
            status: 400,
            code: "quota_exceeded".to_string(),
            message: "Quota exceeded for gpu_1x_a10".to_string(),
        })
    }

    #[test]
    fn test_report_launch_rejected_is_error() {
        let err = report_launch(&rejection()).unwrap_err();
        assert!(err.to_string().contains("quota_exceeded"));
    }

    #[test]
    fn test_report_launch_launched_is_ok() {
        let outcome = LaunchOutcome::Launched {
            instance_ids: vec!["0920582c7ff041399e34823a0be62549".to_string()],
            type_id: "gpu_1x_a10".to_string(),
            region: "us-west-1".to_string(),
        };
        assert!(report_launch(&outcome).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected_by_parser() {
        let err = Cli::try_parse_from(["gpu", "acquire", "gpu_1x_a10", "--interval", "0"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["gpu", "acquire", "gpu_1x_a10", "--interval", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Acquire { interval: 1, .. }));
    }

    #[tokio::test]
    async fn test_start_unknown_index_fails_without_launch() {
        let server = mock_server().await;
        Mock::given(method("POST"))
            .and(path("/instance-operations/launch"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cli = Cli::try_parse_from(["gpu", "--api-key", "key", "start", "5"]).unwrap();
        let err = run(cli, &provider(&server)).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<lambda_gpu::Error>(),
            Some(lambda_gpu::Error::UnknownSelection {
                index: 5,
                available: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_start_rejected_launch_fails() {
        let server = mock_server().await;
        Mock::given(method("POST"))
            .and(path("/instance-operations/launch"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error": {"code": "quota_exceeded", "message": "Quota exceeded for gpu_1x_a10"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let cli = Cli::try_parse_from(["gpu", "--api-key", "key", "start", "1"]).unwrap();
        let err = run(cli, &provider(&server)).await.unwrap_err();

        assert!(err.to_string().contains("quota_exceeded"));
    }

    #[tokio::test]
    async fn test_list_succeeds() {
        let server = mock_server().await;

        let cli = Cli::try_parse_from(["gpu", "list"]).unwrap();
        assert!(run(cli, &provider(&server)).await.is_ok());
    }
}
