use crate::models::{Proxy, ProxyPool};
use chrono::Utc;
use domainflow_core::{ProxyProtocol, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct ProxyRepository {
    pool: SqlitePool,
}

impl ProxyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProxyRepository { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        address: &str,
        protocol: ProxyProtocol,
        credentials_hash: Option<&str>,
    ) -> Result<Proxy> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO proxies
                (id, name, address, protocol, credentials_hash, enabled, healthy, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, 0, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(protocol)
        .bind(credentials_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Proxy> {
        sqlx::query_as::<_, Proxy>("SELECT * FROM proxies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| domainflow_core::Error::not_found(format!("proxy {id} not found")))
    }

    pub async fn list_enabled(&self) -> Result<Vec<Proxy>> {
        sqlx::query_as::<_, Proxy>("SELECT * FROM proxies WHERE enabled = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_pool_members(&self, pool_id: Uuid) -> Result<Vec<Proxy>> {
        sqlx::query_as::<_, Proxy>(
            "SELECT p.* FROM proxies p
             JOIN proxy_pool_members m ON m.proxy_id = p.id
             WHERE m.pool_id = ? AND p.enabled = 1
             ORDER BY p.name",
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Proxy>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT * FROM proxies WHERE enabled = 1 AND id IN ({placeholders}) ORDER BY name"
        );
        let mut query = sqlx::query_as::<_, Proxy>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        query.fetch_all(&self.pool).await.map_err(Into::into)
    }

    /// Record the outcome of a health-check probe (§4.4): updates
    /// healthy/last_status/last_checked/latency_ms and the failure streak
    /// used to decide when a proxy should be degraded.
    pub async fn record_health_check(
        &self,
        id: Uuid,
        healthy: bool,
        status: &str,
        latency_ms: Option<i64>,
    ) -> Result<()> {
        let now = Utc::now();
        if healthy {
            sqlx::query(
                "UPDATE proxies SET healthy = 1, last_status = ?, last_checked = ?,
                 latency_ms = ?, failure_streak = 0, updated_at = ? WHERE id = ?",
            )
            .bind(status)
            .bind(now)
            .bind(latency_ms)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE proxies SET last_status = ?, last_checked = ?,
                 failure_streak = failure_streak + 1, updated_at = ? WHERE id = ?",
            )
            .bind(status)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Degrade health once the failure streak crosses `threshold`; returns
    /// whether this call was the one that flipped healthy -> unhealthy
    /// (the caller uses this to decide whether to broadcast the
    /// transition, rather than re-announcing every subsequent failure).
    pub async fn degrade_if_streak_exceeds(&self, id: Uuid, threshold: i64) -> Result<bool> {
        let proxy = self.get(id).await?;
        if proxy.healthy && proxy.failure_streak >= threshold {
            sqlx::query("UPDATE proxies SET healthy = 0, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn create_pool(&self, name: &str) -> Result<ProxyPool> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query("INSERT INTO proxy_pools (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(ProxyPool { id, name: name.to_string(), created_at: now })
    }

    pub async fn add_to_pool(&self, pool_id: Uuid, proxy_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO proxy_pool_members (pool_id, proxy_id) VALUES (?, ?)",
        )
        .bind(pool_id)
        .bind(proxy_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_from_pool(&self, pool_id: Uuid, proxy_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM proxy_pool_members WHERE pool_id = ? AND proxy_id = ?")
            .bind(pool_id)
            .bind(proxy_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
