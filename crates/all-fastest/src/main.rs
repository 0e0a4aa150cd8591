//! all-fastest-sim: replays requests through an all-fastest route whose
//! children are simulated destinations, then reports route statistics.

use std::time::{Duration, Instant};

use all_fastest::config::SimConfig;
use all_fastest::sim::SimFactory;
use all_fastest::{DrainBudget, McRequest, RequestContext, RouteHandle, RouteStats};

fn main() -> anyhow::Result<()> {
    // Determine config path
    let config_path = {
        let args: Vec<String> = std::env::args().collect();
        args.iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1).cloned())
            .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
            .or_else(|| std::env::var("ALL_FASTEST_CONFIG").ok())
            .unwrap_or_else(|| "all-fastest.toml".to_string())
    };

    let config = SimConfig::load(&config_path)?;

    // Build the tokio runtime first: the tonic exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let _tracing_guard = fanout_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            requests = config.run.requests,
            operation = ?config.run.operation,
            max_pending = ?config.drain.max_pending,
            "Starting all-fastest-sim"
        );

        run(config).await
    })
}

async fn run(config: SimConfig) -> anyhow::Result<()> {
    let stats = RouteStats::new();
    let factory = SimFactory::new(config.drain.max_pending.map(DrainBudget::new), stats.clone());
    let route = factory.build_all_fastest(&config.route)?;

    tracing::info!(
        route = %route.name(),
        destinations = factory.destinations().len(),
        "Route built"
    );

    for i in 0..config.run.requests {
        let ctx = RequestContext::new();
        let req = McRequest::new(format!("{}:{}", config.run.key_prefix, i));

        let start = Instant::now();
        let reply = route.route(&req, config.run.operation, &ctx).await?;
        let latency = start.elapsed().as_millis() as u64;

        let winner = reply
            .value()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default();
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            result = ?reply.result(),
            winner = %winner,
            latency_ms = latency,
            "Request routed"
        );
    }

    // Give abandoned calls a chance to finish before reporting
    tokio::time::sleep(Duration::from_millis(config.run.settle_ms)).await;

    for destination in factory.destinations() {
        let counters = destination.counters();
        tracing::info!(
            destination = %counters.name,
            calls = counters.calls,
            completions = counters.completions,
            "Destination totals"
        );
    }

    println!("{}", serde_json::to_string_pretty(&stats.snapshot())?);
    Ok(())
}
