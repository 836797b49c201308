//! `hoard failures` – list or clear the run ledger's failures.

use anyhow::Result;
use hoard_core::ledger::Ledger;

pub async fn run_failures(clear: bool) -> Result<()> {
    let ledger = Ledger::open_default().await?;
    if clear {
        let n = ledger.clear_failures().await?;
        println!("Cleared {} failure record(s).", n);
        return Ok(());
    }

    if let Some(run) = ledger.list_runs(1).await?.first() {
        println!(
            "Last run #{} (owner {}): {} items, {} skipped, {} downloads ok, {} failed",
            run.id, run.owner, run.items, run.skipped, run.jobs_completed, run.jobs_failed
        );
    }
    let failures = ledger.list_failures().await?;
    if failures.is_empty() {
        println!("No failures recorded.");
        return Ok(());
    }
    println!("{:<5} {:<10} {:<12} {:<30} {}", "RUN", "STAGE", "ITEM", "TITLE", "ERROR");
    for f in failures {
        let title: String = f.title.chars().take(30).collect();
        println!(
            "{:<5} {:<10} {:<12} {:<30} {}",
            f.run_id,
            f.stage,
            f.item_id.as_deref().unwrap_or("-"),
            title,
            f.message
        );
    }
    Ok(())
}
