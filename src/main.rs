use distributed_calc::agent::{Agent, AgentConfig};
use distributed_calc::orchestrator::config::OrchestratorConfig;
use distributed_calc::orchestrator::server;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} orchestrator [--bind <addr:port>]", args[0]);
        eprintln!(
            "       {} agent [--orchestrator <url>] [--workers <n>]",
            args[0]
        );
        eprintln!("Example: {} orchestrator --bind 127.0.0.1:8080", args[0]);
        eprintln!(
            "Example: {} agent --orchestrator http://127.0.0.1:8080 --workers 4",
            args[0]
        );

        std::process::exit(1);
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            signal.cancel();
        }
    });

    match args[1].as_str() {
        "orchestrator" => {
            let mut config = OrchestratorConfig::from_env();

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--bind" => {
                        config.bind_addr = flag_value(&args, i)?.parse()?;
                        i += 2;
                    }
                    _ => {
                        i += 1;
                    }
                }
            }

            tracing::info!(
                "Starting orchestrator on {} (operation time {:?})",
                config.bind_addr,
                config.operation_time
            );
            tracing::info!("Press Ctrl+C to shutdown");

            server::serve(config, shutdown).await?;
        }
        "agent" => {
            let mut config = AgentConfig::from_env();

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--orchestrator" => {
                        config.orchestrator_url =
                            flag_value(&args, i)?.trim_end_matches('/').to_string();
                        i += 2;
                    }
                    "--workers" => {
                        config.worker_count = flag_value(&args, i)?.parse::<usize>()?.max(1);
                        i += 2;
                    }
                    _ => {
                        i += 1;
                    }
                }
            }

            tracing::info!("Operation times: {:?}", config.operation_times);

            let agent = Agent::new(config)?;
            agent.run(shutdown).await;
        }
        other => {
            anyhow::bail!("unknown role: {} (expected `orchestrator` or `agent`)", other);
        }
    }

    Ok(())
}

fn flag_value(args: &[String], i: usize) -> anyhow::Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", args[i]))
}
