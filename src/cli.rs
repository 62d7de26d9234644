use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Build host inventories from CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every host, group and variable described by an inventory config
    List(ListArgs),
    /// Print the group tree with its hosts
    Graph(GraphArgs),
    /// Print the variables of a single host
    Host(HostArgs),
    /// Check that a file is a loadable CSV inventory config
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Inventory configuration file (*.csv.yaml / *.csv.yml)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Inventory configuration file (*.csv.yaml / *.csv.yml)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Group to start the tree from
    #[arg(default_value = "all")]
    pub group: String,
}

#[derive(Debug, Args)]
pub struct HostArgs {
    /// Inventory configuration file (*.csv.yaml / *.csv.yml)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Host to show
    pub host: String,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Inventory configuration file to check
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}
