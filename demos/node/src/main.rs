//! SVS node
//!
//! Joins a sync group over UDP and publishes one item per line read from
//! stdin. Missing data discovered from peers is logged as the data names a
//! full application would fetch.
//!
//! Environment variables:
//! - SVS_LOG: tracing filter directive (default `info`)

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use svs_sync::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Node id of this participant
    node_id: NodeId,

    /// UDP address to listen on
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    /// Address of a peer node (repeatable)
    #[arg(long = "peer")]
    peers: Vec<SocketAddr>,

    /// Seed for the protocol's random delays
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = std::env::var("SVS_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let transport = Arc::new(UdpTransport::bind(cli.bind, cli.peers).await?);
    info!(
        node = cli.node_id,
        addr = %transport.local_addr()?,
        peers = ?transport.peers(),
        "listening"
    );

    let mut config = SyncConfigBuilder::new();
    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }
    let config = config.build()?;

    let data_prefix = config.data_prefix.clone();
    let engine = SyncEngine::new(cli.node_id, config, transport, move |missing: &[MissingDataInfo]| {
        for gap in missing {
            for seq in gap.seqs() {
                info!(
                    peer = gap.node_id,
                    seq,
                    name = %data_name(&data_prefix, gap.node_id, seq),
                    "would fetch"
                );
            }
        }
    })?;
    engine.start();

    let seq = engine.do_update();
    info!(node = cli.node_id, seq, "joined sync group");

    // Blocking stdin reads stay off the runtime
    let publisher = engine.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(text) => {
                    let seq = publisher.do_update();
                    info!(node = publisher.node_id(), seq, bytes = text.len(), "published");
                }
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    break;
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!(node = cli.node_id, vector = ?engine.vector(), "shutting down");
    Ok(())
}
