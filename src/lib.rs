pub mod cli;
pub mod config;
pub mod construct;
pub mod data;
pub mod error;
pub mod expr;
pub mod hosts;
pub mod inventory;
pub mod pipeline;
pub mod reader;
pub mod resolve;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::{
    cli::{Cli, Commands, OutputFormat},
    config::InventoryConfig,
    expr::ExprEvaluator,
    inventory::Inventory,
};

pub use crate::error::InventoryError;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_inventory", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::List(args) => handle_list(&args),
        Commands::Graph(args) => handle_graph(&args),
        Commands::Host(args) => handle_host(&args),
        Commands::Verify(args) => handle_verify(&args),
    }
}

/// Loads `config_path` and builds the in-memory inventory it describes.
pub fn build_inventory(config_path: &Path) -> Result<Inventory> {
    if !config::is_inventory_config(config_path) {
        warn!(
            "{:?} does not end in csv.yaml or csv.yml; loading it anyway",
            config_path
        );
    }
    let config = InventoryConfig::load(config_path)
        .with_context(|| format!("Loading inventory config {config_path:?}"))?;
    let mut inventory = Inventory::new();
    pipeline::populate(&config, &mut inventory, &ExprEvaluator)
        .with_context(|| format!("Building inventory from {:?}", config.source))?;
    Ok(inventory)
}

fn handle_list(args: &cli::ListArgs) -> Result<()> {
    let inventory = build_inventory(&args.config)?;
    let value = inventory.to_list_value();
    let mut rendered = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&value).context("Serializing inventory as JSON")?
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&value).context("Serializing inventory as YAML")?
        }
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Writing inventory to {path:?}"))?;
            info!(
                "Wrote {} host(s) to {:?}",
                inventory.host_count(),
                path
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn handle_graph(args: &cli::GraphArgs) -> Result<()> {
    let inventory = build_inventory(&args.config)?;
    let graph = inventory
        .render_graph(&args.group)
        .ok_or_else(|| anyhow!("Group '{}' not found in inventory", args.group))?;
    print!("{graph}");
    Ok(())
}

fn handle_host(args: &cli::HostArgs) -> Result<()> {
    let inventory = build_inventory(&args.config)?;
    let vars = inventory
        .host_vars(&args.host)
        .ok_or_else(|| anyhow!("Host '{}' not found in inventory", args.host))?;
    let rendered = serde_json::to_string_pretty(vars).context("Serializing host variables")?;
    println!("{rendered}");
    Ok(())
}

fn handle_verify(args: &cli::VerifyArgs) -> Result<()> {
    if !config::is_inventory_config(&args.config) {
        return Err(anyhow!(
            "{:?} is not a CSV inventory config (expected a name ending in csv.yaml or csv.yml)",
            args.config
        ));
    }
    let config = InventoryConfig::load(&args.config)
        .with_context(|| format!("Loading inventory config {:?}", args.config))?;
    info!("✓ {:?} is a valid CSV inventory config", args.config);
    println!("{}", config.source.display());
    Ok(())
}
