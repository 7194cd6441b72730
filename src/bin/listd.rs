use anyhow::Context;
use clap::Parser as ClapParser;
use listd::{logging, Registry, Server, Store, SERVICE_NAME};
use std::sync::{mpsc, Arc};
use tracing::info;

/// Serve a store of named integer lists over TCP
#[derive(ClapParser)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:1099")]
    bind: String,
    /// Logical name the store is published under
    #[arg(long, default_value = SERVICE_NAME)]
    name: String,
    /// Print debugging output (can be repeated for more detail)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    debug_level: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.debug_level.max(1));

    let store = Arc::new(Store::new());
    let registry = Registry::new();
    let server = Server::bind(store.clone(), args.bind.as_str())?;
    let handle = server.serve(&registry, &args.name)?;
    info!(addr = %handle.local_addr(), name = %args.name, "listening");

    let (tx, rx) = mpsc::channel();
    // the server threads keep serving while main waits for the signal
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to set Ctrl-C handler")?;
    let _ = rx.recv();

    info!("shutdown signal received, stopping server");
    handle.stop();
    store.shutdown();
    Ok(())
}
