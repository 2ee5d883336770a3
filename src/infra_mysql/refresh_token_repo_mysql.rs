use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlConnection, MySqlPool, Row};

pub struct MySqlRefreshTokenRepo {
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, AuthError> {
        Ok(RefreshTokenRecord {
            token: row.try_get("token").map_err(store_err)?,
            user_id: row.try_get("user_id").map_err(store_err)?,
            created_at: row.try_get("created_at").map_err(store_err)?,
            updated_at: row.try_get("updated_at").map_err(store_err)?,
            expires_at: row.try_get("expires_at").map_err(store_err)?,
            revoked_at: row.try_get("revoked_at").map_err(store_err)?,
        })
    }

    /// Reads the row and keeps it locked until the surrounding transaction ends.
    async fn lock_row(
        conn: &mut MySqlConnection,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
FROM refresh_token
WHERE token = ?
FOR UPDATE
"#,
        )
        .bind(token)
        .fetch_optional(conn)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MySqlRefreshTokenRepo {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<InsertOutcome, AuthError> {
        let res = sqlx::query(
            r#"
INSERT INTO refresh_token (token, user_id, created_at, updated_at, expires_at, revoked_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.expires_at)
        .bind(record.revoked_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_dup_key(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(store_err(e)),
        }
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
FROM refresh_token
WHERE token = ?
"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn touch_if_live(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let Some(mut rec) = Self::lock_row(&mut *tx, token).await? else {
            tx.rollback().await.map_err(store_err)?;
            return Ok(None);
        };
        if rec.is_live(now) {
            sqlx::query("UPDATE refresh_token SET updated_at = ? WHERE token = ?")
                .bind(now)
                .bind(token)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
            rec.updated_at = now;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(Some(rec))
    }

    async fn revoke(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let Some(mut rec) = Self::lock_row(&mut *tx, token).await? else {
            tx.rollback().await.map_err(store_err)?;
            return Ok(None);
        };
        if rec.revoked_at.is_none() {
            sqlx::query(
                "UPDATE refresh_token SET revoked_at = ?, updated_at = ? WHERE token = ?",
            )
            .bind(now)
            .bind(now)
            .bind(token)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
            rec.revoked_at = Some(now);
            rec.updated_at = now;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(Some(rec))
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let done = sqlx::query("DELETE FROM refresh_token")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(done.rows_affected())
    }
}
