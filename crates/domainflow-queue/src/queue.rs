use crate::backoff::{compute_backoff, QueueConfig};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use domainflow_core::{CampaignType, Error, JobStatus, Result};
use domainflow_storage::db::begin_immediate;
use domainflow_storage::models::Job;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct JobQueue {
    pool: SqlitePool,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(pool: SqlitePool, config: QueueConfig) -> Self {
        JobQueue { pool, config }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found(format!("job {id} not found")))
    }

    /// Insert a pending job. Returns its id.
    pub async fn enqueue(
        &self,
        campaign_id: Uuid,
        job_type: CampaignType,
        scheduled_at: Option<DateTime<Utc>>,
        payload: Value,
        max_attempts: Option<i64>,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let scheduled_at = scheduled_at.unwrap_or(now);
        sqlx::query(
            "INSERT INTO jobs
                (id, campaign_id, job_type, status, scheduled_at, next_execution_at,
                 attempts, max_attempts, payload)
             VALUES (?, ?, ?, 'pending', ?, ?, 0, ?, ?)",
        )
        .bind(id)
        .bind(campaign_id)
        .bind(job_type)
        .bind(scheduled_at)
        .bind(scheduled_at)
        .bind(max_attempts.unwrap_or(self.config.max_attempts_default))
        .bind(Json(&payload))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Atomically select and claim one claimable job matching any type in
    /// `types` (§4.5). Implementation note: SQLite has no `SELECT ... FOR
    /// UPDATE SKIP LOCKED`; `BEGIN IMMEDIATE` takes the writer lock before
    /// the claim read, giving the same at-most-one-lease guarantee.
    pub async fn lease(&self, worker_id: &str, types: &[CampaignType]) -> Result<Option<Job>> {
        if types.is_empty() {
            return Ok(None);
        }
        let mut conn = begin_immediate(&self.pool).await?;
        let now = Utc::now();
        let stale_cutoff = now - ChronoDuration::from_std(self.config.lease_duration)
            .unwrap_or_else(|_| ChronoDuration::seconds(120));

        let placeholders = types.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT * FROM jobs
             WHERE job_type IN ({placeholders})
               AND status IN ('pending', 'retry')
               AND next_execution_at <= ?
               AND (locked_at IS NULL OR locked_at <= ?)
             ORDER BY next_execution_at, id
             LIMIT 1"
        );
        let mut query = sqlx::query_as::<_, Job>(&sql);
        for t in types {
            query = query.bind(*t);
        }
        let candidate = query.bind(now).bind(stale_cutoff).fetch_optional(&mut *conn).await?;

        let Some(candidate) = candidate else {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE jobs SET status = 'running', locked_by = ?, locked_at = ?,
             attempts = attempts + 1, last_attempted_at = ?
             WHERE id = ?",
        )
        .bind(worker_id)
        .bind(now)
        .bind(now)
        .bind(candidate.id)
        .execute(&mut *conn)
        .await?;
        sqlx::query("COMMIT").execute(&mut *conn).await?;

        self.get(candidate.id).await.map(Some)
    }

    /// Extend the lease; fails (a conflict, not retried by the caller) if
    /// the lock was stolen by the reaper in the meantime.
    pub async fn heartbeat(&self, job_id: Uuid, worker_id: &str) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE jobs SET locked_at = ? WHERE id = ? AND locked_by = ? AND status = 'running'",
        )
        .bind(now)
        .bind(job_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::conflict(format!("job {job_id} lease was not held by {worker_id}")));
        }
        Ok(())
    }

    pub async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', locked_at = NULL, locked_by = NULL WHERE id = ?",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `fail(job_id, error, retryable)` (§4.5): retryable failures under
    /// `max_attempts` go back to `retry` with a backoff delay; everything
    /// else is terminal.
    pub async fn fail(&self, job_id: Uuid, error: &str, retryable: bool) -> Result<()> {
        let job = self.get(job_id).await?;
        if retryable && job.attempts < job.max_attempts {
            let delay = compute_backoff(job.attempts, &self.config);
            let next_execution_at =
                Utc::now() + ChronoDuration::from_std(delay).unwrap_or(ChronoDuration::zero());
            sqlx::query(
                "UPDATE jobs SET status = 'retry', next_execution_at = ?, last_error = ?,
                 locked_at = NULL, locked_by = NULL WHERE id = ?",
            )
            .bind(next_execution_at)
            .bind(error)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE jobs SET status = 'failed', last_error = ?,
                 locked_at = NULL, locked_by = NULL WHERE id = ?",
            )
            .bind(error)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Periodic sweep (§4.5): any `running` job whose lease has expired is
    /// treated as crashed and retried. Idempotency downstream relies on
    /// the unique-per-(campaign,domain) result constraint, not on this
    /// sweep being exact.
    pub async fn reap(&self) -> Result<u64> {
        let cutoff = Utc::now()
            - ChronoDuration::from_std(self.config.lease_duration)
                .unwrap_or_else(|_| ChronoDuration::seconds(120));
        let stale: Vec<Job> = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = 'running' AND locked_at <= ?",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let count = stale.len() as u64;
        for job in stale {
            self.fail(job.id, "lease expired: reaped by supervisor", true).await?;
        }
        Ok(count)
    }

    pub async fn status(&self, job_id: Uuid) -> Result<JobStatus> {
        Ok(self.get(job_id).await?.status)
    }

    /// Whether a campaign already has a job that will eventually be
    /// leased or is currently running. Used by `resume` (§4.9) to avoid
    /// double-enqueuing when a job is merely paused-but-present.
    pub async fn has_active_job(&self, campaign_id: Uuid) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM jobs WHERE campaign_id = ? AND status IN ('pending', 'retry', 'running') LIMIT 1",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domainflow_storage::db::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn lease_is_exclusive_between_workers() {
        let pool = test_pool().await;
        let queue = JobQueue::new(pool, QueueConfig::default());
        let campaign_id = Uuid::new_v4();
        queue
            .enqueue(campaign_id, CampaignType::Generation, None, serde_json::json!({}), None)
            .await
            .unwrap();

        let leased_a = queue.lease("worker-a", &[CampaignType::Generation]).await.unwrap();
        let leased_b = queue.lease("worker-b", &[CampaignType::Generation]).await.unwrap();

        assert!(leased_a.is_some());
        assert!(leased_b.is_none());
    }

    #[tokio::test]
    async fn fail_retryable_schedules_retry_with_backoff() {
        let pool = test_pool().await;
        let queue = JobQueue::new(pool, QueueConfig::default());
        let campaign_id = Uuid::new_v4();
        queue
            .enqueue(campaign_id, CampaignType::Generation, None, serde_json::json!({}), None)
            .await
            .unwrap();

        let job = queue.lease("worker-a", &[CampaignType::Generation]).await.unwrap().unwrap();
        queue.fail(job.id, "transient", true).await.unwrap();

        let reloaded = queue.get(job.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Retry);
        assert!(reloaded.next_execution_at > job.locked_at.unwrap());
    }

    #[tokio::test]
    async fn fail_exhausted_is_terminal() {
        let pool = test_pool().await;
        let queue = JobQueue::new(pool, QueueConfig::default());
        let campaign_id = Uuid::new_v4();
        queue
            .enqueue(
                campaign_id,
                CampaignType::Generation,
                None,
                serde_json::json!({}),
                Some(1),
            )
            .await
            .unwrap();

        let job = queue.lease("worker-a", &[CampaignType::Generation]).await.unwrap().unwrap();
        queue.fail(job.id, "still broken", true).await.unwrap();

        let reloaded = queue.get(job.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn reap_revives_jobs_past_their_lease() {
        let pool = test_pool().await;
        let mut config = QueueConfig::default();
        config.lease_duration = std::time::Duration::from_secs(0);
        let queue = JobQueue::new(pool, config);
        let campaign_id = Uuid::new_v4();
        queue
            .enqueue(campaign_id, CampaignType::Generation, None, serde_json::json!({}), None)
            .await
            .unwrap();
        let job = queue.lease("worker-a", &[CampaignType::Generation]).await.unwrap().unwrap();

        let reaped = queue.reap().await.unwrap();
        assert_eq!(reaped, 1);
        let reloaded = queue.get(job.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Retry);
    }
}
