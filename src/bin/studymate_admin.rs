use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use studymate::{
    config::Config,
    processing::MATERIALS_DB_FILE,
    store::{JsonMaterialStore, MaterialStore, title_from_filename},
};

#[derive(Parser)]
#[command(
    name = "studymate-admin",
    about = "Maintenance commands for the StudyMate material database"
)]
struct Cli {
    /// Storage directory; defaults to STORAGE_DIR from the environment.
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute every material's title from its uploaded filename.
    UpdateTitles {
        /// Report changes without writing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print id, title, and creation time of stored materials.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load config from environment")?;
    let storage_dir = cli.storage_dir.unwrap_or(config.storage_dir);
    let db_path = storage_dir.join(MATERIALS_DB_FILE);

    let store = JsonMaterialStore::open(db_path.clone())
        .await
        .with_context(|| format!("Failed to open {}", db_path.display()))?;

    match cli.command {
        Command::UpdateTitles { dry_run } => update_titles(&store, dry_run).await,
        Command::List => list(&store).await,
    }
}

async fn update_titles(store: &JsonMaterialStore, dry_run: bool) -> Result<()> {
    let mut changed = 0usize;
    for mut material in store.list_latest().await? {
        let title = title_from_filename(&material.original_filename);
        if title == material.title {
            continue;
        }
        println!(
            "{}: {:?} -> {:?}",
            material.id,
            material.title.as_deref().unwrap_or(""),
            title.as_deref().unwrap_or("")
        );
        changed += 1;
        if !dry_run {
            material.title = title;
            store
                .update(material)
                .await
                .context("Failed to persist updated title")?;
        }
    }

    let verb = if dry_run { "would update" } else { "updated" };
    println!("{verb} {changed} title(s)");
    Ok(())
}

async fn list(store: &JsonMaterialStore) -> Result<()> {
    let materials = store.list_latest().await?;
    if materials.is_empty() {
        println!("No materials stored");
        return Ok(());
    }
    for material in materials {
        println!(
            "{:>5}  {:<40}  {}",
            material.id,
            material
                .title
                .as_deref()
                .unwrap_or(material.original_filename.as_str()),
            material.created_at
        );
    }
    Ok(())
}
