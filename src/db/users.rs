use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DbPool;

/// Tier di un'identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Free,
    Paid,
    Banned,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "FREE"),
            Tier::Paid => write!(f, "PAID"),
            Tier::Banned => write!(f, "BANNED"),
        }
    }
}

impl From<&str> for Tier {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PAID" => Tier::Paid,
            "BANNED" => Tier::Banned,
            _ => Tier::Free,
        }
    }
}

/// Record utente nel database
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub identity: String,
    pub tier: Tier,
    pub requests_made: i64,
    pub last_request_at: Option<DateTime<Utc>>,
    pub premium_expires_at: Option<DateTime<Utc>>,
}

fn parse_instant(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|v| {
        DateTime::parse_from_rfc3339(&v)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Trova il record di un'identity
pub async fn find_by_identity(
    pool: &DbPool,
    identity: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row: Option<(String, String, i64, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT identity, tier, requests_made, last_request_at, premium_expires_at
        FROM users
        WHERE identity = ?
        "#,
    )
    .bind(identity)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(identity, tier, requests_made, last_request_at, premium_expires_at)| UserRecord {
            identity,
            tier: Tier::from(tier.as_str()),
            requests_made,
            last_request_at: parse_instant(last_request_at),
            premium_expires_at: parse_instant(premium_expires_at),
        },
    ))
}

/// Crea pigramente il record di una nuova identity (tier FREE, contatore a zero)
pub async fn create_user(
    pool: &DbPool,
    identity: &str,
    now: DateTime<Utc>,
) -> Result<UserRecord, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (identity, tier, requests_made, last_request_at, premium_expires_at)
        VALUES (?, 'FREE', 0, ?, NULL)
        "#,
    )
    .bind(identity)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(UserRecord {
        identity: identity.to_string(),
        tier: Tier::Free,
        requests_made: 0,
        last_request_at: Some(now),
        premium_expires_at: None,
    })
}

/// Azzera il contatore richieste (nuova finestra di quota)
pub async fn reset_requests(pool: &DbPool, identity: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET requests_made = 0 WHERE identity = ?")
        .bind(identity)
        .execute(pool)
        .await?;
    Ok(())
}

/// Registra una richiesta ammessa: incrementa il contatore e aggiorna il timestamp
pub async fn record_request(
    pool: &DbPool,
    identity: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET requests_made = requests_made + 1, last_request_at = ?
        WHERE identity = ?
        "#,
    )
    .bind(now.to_rfc3339())
    .bind(identity)
    .execute(pool)
    .await?;
    Ok(())
}

/// Porta (o crea) un'identity al tier PAID con scadenza premium
pub async fn upgrade_to_paid(
    pool: &DbPool,
    identity: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (identity, tier, requests_made, last_request_at, premium_expires_at)
        VALUES (?, 'PAID', 0, NULL, ?)
        ON CONFLICT(identity) DO UPDATE SET
            tier = 'PAID',
            premium_expires_at = excluded.premium_expires_at
        "#,
    )
    .bind(identity)
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Imposta il tier BANNED; ritorna false se l'identity non esiste
pub async fn ban_user(pool: &DbPool, identity: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET tier = 'BANNED' WHERE identity = ?")
        .bind(identity)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
