use clap::{Parser, Subcommand};
use http_inventory::auth::EnvSnapshot;
use http_inventory::config::{self, InventoryConfig};
use http_inventory::plugin::{self, MemoryInventory};

type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "http-inventory")]
#[command(about = "HTTP(S) dynamic inventory source", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the inventory and print the merged group/host document as JSON.
    List {
        /// Inventory source file (*.http_inventory.yml|yaml).
        source: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::List { source } => {
            if !config::accepts_path(&source) {
                tracing::warn!(
                    %source,
                    "source file does not end in http_inventory.yml|yaml; \
                     the host tool will not auto-detect it"
                );
            }

            let env: EnvSnapshot = std::env::vars().collect();
            let config = InventoryConfig::from_file(&source, &env)
                .map_err(|e| anyhow::anyhow!("{} stage failed: {e}", e.stage()))?;

            let graph = plugin::run(&config, &env)
                .map_err(|e| anyhow::anyhow!("{} stage failed: {e}", e.stage()))?;

            let mut inventory = MemoryInventory::default();
            plugin::populate(&graph, &mut inventory);
            println!("{}", serde_json::to_string_pretty(&inventory.to_value())?);
        }
    }

    Ok(())
}
