//! Saved-estimate commands. All of them need a signed-in session.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use super::output::print_result;
use crate::client::api::EstimateDraft;
use crate::client::{ApiClient, EstimateStore};

#[derive(Subcommand, Debug, Clone)]
pub enum EstimateCommand {
    /// List your saved estimates, newest first
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one estimate
    Get {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Save an estimate from a JSON file
    Save {
        #[arg(long)]
        file: PathBuf,
    },

    /// Replace an estimate with the contents of a JSON file
    Update {
        id: i64,

        #[arg(long)]
        file: PathBuf,
    },

    /// Delete an estimate
    Delete { id: i64 },
}

/// Run an estimate command.
pub async fn run_estimate_command(cmd: EstimateCommand, client: ApiClient) -> anyhow::Result<()> {
    let store = EstimateStore::new(client);

    match cmd {
        EstimateCommand::List { json } => {
            let estimates = store.list().await?;
            if json {
                return print_result(&estimates, true);
            }
            if estimates.is_empty() {
                println!("No saved estimates");
                return Ok(());
            }
            for estimate in &estimates {
                println!(
                    "  #{:<5} {:<30} {:>10} sq.ft  {:>14}  {}",
                    estimate.id,
                    estimate.project_name,
                    estimate.total_area,
                    estimate.total_cost,
                    estimate.created_at.format("%Y-%m-%d"),
                );
            }
        }
        EstimateCommand::Get { id, json } => {
            print_result(&store.get(id).await?, json)?;
        }
        EstimateCommand::Save { file } => {
            let saved = store.save(&read_draft(&file)?).await?;
            println!("Saved estimate #{} ({})", saved.id, saved.project_name);
        }
        EstimateCommand::Update { id, file } => {
            let updated = store.update(id, &read_draft(&file)?).await?;
            println!("Updated estimate #{} ({})", updated.id, updated.project_name);
        }
        EstimateCommand::Delete { id } => {
            store.delete(id).await?;
            println!("Deleted estimate #{}", id);
        }
    }
    Ok(())
}

fn read_draft(path: &Path) -> anyhow::Result<EstimateDraft> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid estimate in {}", path.display()))
}
