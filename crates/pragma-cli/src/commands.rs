use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tracing::{debug, info};

use pragma_server::handler::DocumentEnvelope;
use pragma_server::{PragmaServer, ServerConfig};
use pragma_types::Collection;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

/// Merge command-line flags over the config file.
fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.import.extend(args.import.iter().cloned());
    config.seed_demo |= args.demo;
    debug!(
        bind = %config.bind_addr,
        imports = config.import.len(),
        demo = config.seed_demo,
        "resolved server config"
    );
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let server = PragmaServer::new(config);
        server.bootstrap().await.context("failed to prepare collections")?;
        info!(collections = server.registry().len(), "collections ready");
        for name in server.registry().list_names() {
            println!("  {} {}", "collection:".green(), name.bold());
        }
        println!(
            "{} PragmaDB listening on {}",
            "✓".green().bold(),
            server.config().bind_addr.to_string().bold()
        );
        server.serve().await.context("server failed")
    })
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let collection = load_snapshot(&args.file)?;
    let documents = collection.documents(args.revisions);
    debug!(
        collection = collection.name(),
        shown = documents.len(),
        all_revisions = args.revisions,
        "inspecting snapshot"
    );
    match format {
        OutputFormat::Json => {
            let envelopes: Vec<DocumentEnvelope> = documents.iter().map(DocumentEnvelope::from).collect();
            let out = serde_json::json!({
                "collection": collection.name(),
                "documents": envelopes,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "Collection {} ({} documents, {} revisions)",
                collection.name().yellow().bold(),
                collection.len(),
                collection.revision_count()
            );
            for doc in &documents {
                println!(
                    "  {} {} {} bytes",
                    doc.id.short_id().cyan(),
                    format!("rev {}", doc.revision).dimmed(),
                    doc.len()
                );
                println!("    {}", doc.content_str());
            }
        }
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> anyhow::Result<Collection> {
    pragma_ketchup::import_from_path(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))
}
