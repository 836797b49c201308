//! Run and failure reads/writes.

use anyhow::Result;
use sqlx::Row;

use crate::walker::{Stage, WalkReport};

use super::db::{unix_timestamp, Ledger};
use super::types::{FailureRecord, FailureSource, RunId, RunSummary};

impl Ledger {
    /// Store a finished run and all of its failures in one transaction.
    pub async fn record_report(&self, owner: &str, report: &WalkReport) -> Result<RunId> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        let run_id = sqlx::query(
            r#"
            INSERT INTO runs (
                owner, finished_at, folders, pages, items, skipped, incomplete,
                jobs_enqueued, jobs_completed, jobs_failed
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(owner)
        .bind(now)
        .bind(report.folders as i64)
        .bind(report.pages as i64)
        .bind(report.items_processed as i64)
        .bind(report.items_skipped as i64)
        .bind(report.items_incomplete as i64)
        .bind(report.jobs_enqueued as i64)
        .bind(report.jobs_completed as i64)
        .bind(report.job_failures.len() as i64)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let insert = r#"
            INSERT INTO failures (run_id, source, item_id, title, stage, message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#;
        for f in &report.failures {
            sqlx::query(insert)
                .bind(run_id)
                .bind(FailureSource::Item.as_str())
                .bind(&f.item_id)
                .bind(&f.title)
                .bind(f.stage.as_str())
                .bind(&f.message)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        for f in &report.job_failures {
            sqlx::query(insert)
                .bind(run_id)
                .bind(FailureSource::Job.as_str())
                .bind(None::<String>)
                .bind(&f.label)
                .bind(Stage::Video.as_str())
                .bind(&f.message)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(run_id)
    }

    /// Failures across all runs, newest first.
    pub async fn list_failures(&self) -> Result<Vec<FailureRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, run_id, source, item_id, title, stage, message, created_at
            FROM failures
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let source: String = row.get("source");
            out.push(FailureRecord {
                id: row.get("id"),
                run_id: row.get("run_id"),
                source: FailureSource::parse(&source),
                item_id: row.get("item_id"),
                title: row.get("title"),
                stage: row.get("stage"),
                message: row.get("message"),
                created_at: row.get("created_at"),
            });
        }
        Ok(out)
    }

    /// Most recent runs first.
    pub async fn list_runs(&self, limit: u32) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, finished_at, items, skipped, jobs_completed, jobs_failed
            FROM runs
            ORDER BY finished_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RunSummary {
                id: row.get("id"),
                owner: row.get("owner"),
                finished_at: row.get("finished_at"),
                items: row.get("items"),
                skipped: row.get("skipped"),
                jobs_completed: row.get("jobs_completed"),
                jobs_failed: row.get("jobs_failed"),
            })
            .collect())
    }

    /// Delete every failure record. Returns how many were removed.
    pub async fn clear_failures(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM failures")
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
