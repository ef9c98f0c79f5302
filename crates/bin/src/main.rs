use std::time::Duration;

use appstate::{StateTree, TreeConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("appstate=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = TreeConfig::default().with_debounce(Duration::from_millis(cli.debounce_ms));
    let tree = StateTree::with_config(config)?;
    tree.persist_to(&cli.file)?;

    let result = match &cli.command {
        Commands::Show => commands::read::show(&tree, cli.format),
        Commands::Get(args) => commands::read::get(&tree, &args.path, cli.format),
        Commands::Keys(args) => commands::read::keys(&tree, &args.path, cli.format),
        Commands::Set(args) => commands::write::set(&tree, &args.path, &args.value, cli.format),
        Commands::Delete(args) => commands::write::delete(&tree, &args.path, cli.format),
    };

    tree.teardown()?;
    result
}
