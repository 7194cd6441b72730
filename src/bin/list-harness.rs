use clap::Parser as ClapParser;
use listd::{
    harness::{Connect, Harness, HarnessConfig, RemoteConnector},
    logging, ClientConfig, Registry, Store, SERVICE_NAME,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};

/// Drive concurrent load against a list store and check its integrity
#[derive(ClapParser)]
#[command(version, about)]
struct Args {
    /// Address of a running `listd`
    #[arg(long, default_value = "127.0.0.1:1099")]
    addr: SocketAddr,
    /// Logical name the store is published under
    #[arg(long, default_value = SERVICE_NAME)]
    name: String,
    /// Run against a store in this process instead of over TCP
    #[arg(long)]
    in_process: bool,
    /// Number of concurrent workers
    #[arg(long, default_value_t = 10)]
    workers: usize,
    /// Operations per worker
    #[arg(long, default_value_t = 50)]
    ops: usize,
    /// Seconds before remaining workers are cancelled
    #[arg(long, default_value_t = 30)]
    deadline_secs: u64,
    /// Shortest pause between operations
    #[arg(long, default_value_t = 10)]
    min_pause_ms: u64,
    /// Longest pause between operations
    #[arg(long, default_value_t = 60)]
    max_pause_ms: u64,
    /// Per-call timeout in milliseconds; unset waits indefinitely
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Print debugging output (can be repeated for more detail)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    debug_level: u8,
}

fn run<C: Connect>(config: HarnessConfig, connector: C) -> anyhow::Result<()> {
    let report = Harness::new(config, connector).run()?;
    println!("{}", report);
    if report.load.errors == 0 && report.integrity.is_clean() {
        println!("no concurrency errors detected");
    } else {
        println!("errors were found, check the log");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.debug_level);

    let config = HarnessConfig::default()
        .with_workers(args.workers)
        .with_ops_per_worker(args.ops)
        .with_deadline(Duration::from_secs(args.deadline_secs))
        .with_pause(
            Duration::from_millis(args.min_pause_ms),
            Duration::from_millis(args.max_pause_ms),
        );

    if args.in_process {
        return run(config, Arc::new(Store::new()));
    }

    let registry = Registry::new();
    registry.rebind(&args.name, args.addr);
    let mut client_config = ClientConfig::default();
    if let Some(ms) = args.timeout_ms {
        client_config = client_config.with_timeout(Duration::from_millis(ms));
    }
    run(config, RemoteConnector::new(registry, args.name, client_config))
}
