//! Forget command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the forget command.
pub async fn run_forget(item_id: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    if orchestrator.store().remove(item_id).await? {
        Output::success(&format!("Removed {} from the index.", item_id));
    } else {
        Output::warning(&format!("{} is not indexed.", item_id));
    }

    Ok(())
}
