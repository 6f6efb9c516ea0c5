//! Standalone binary for the engineer recommender HTTP surface.
//!
//! Wires an empty [`MemoryGraphStore`] behind the [`SearchOrchestrator`] —
//! the zero-dependency reference deployment spec.md §1 describes ("the
//! graph database itself ... is out of scope"). A real deployment swaps in
//! a `GraphClient`/`SkillGraphSource`/`DomainGraphSource`/`EngineerGraphSource`
//! backed by an actual graph database and starts the same router.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use recruit_config::KnowledgeBaseConfig;
use recruit_graph::MemoryGraphStore;
use recruit_server::serve;
use recruit_service::SearchOrchestrator;

#[derive(Debug, Parser)]
#[command(name = "recruit_server", about = "Constraint-aware engineer recommender HTTP server")]
struct Args {
    /// Listen address; omit to bind an OS-assigned loopback port.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Path to a knowledge-base config TOML file; falls back to
    /// `$RECRUIT_CONFIG`, conventional paths, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = KnowledgeBaseConfig::load_from_env_and_file(args.config.as_deref())?;
    let store = MemoryGraphStore::new();
    let orchestrator = Arc::new(SearchOrchestrator::new(store, config));

    let addr = args.bind.unwrap_or_else(|| {
        let port = portpicker::pick_unused_port().expect("failed to find an unused port");
        SocketAddr::from(([127, 0, 0, 1], port))
    });

    if let Err(err) = serve(addr, orchestrator).await {
        log::error!("server exited with error: {err:#?}");
        std::process::exit(1);
    }
    Ok(())
}
