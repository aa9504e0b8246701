//! Registro quote: decide ammissione/rifiuto per identity e aggiorna i contatori

use chrono::{DateTime, Duration, Utc};

use crate::config::ResetPolicy;
use crate::db::users::{self, Tier};
use crate::db::DbPool;

/// Esito della richiesta di ammissione
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    DenyBanned,
    DenyQuotaExceeded,
}

/// Vero se la finestra di quota è scaduta e il contatore va azzerato
pub fn needs_reset(last: DateTime<Utc>, now: DateTime<Utc>, policy: ResetPolicy) -> bool {
    match policy {
        ResetPolicy::CalendarDay => last.date_naive() != now.date_naive(),
        ResetPolicy::Rolling24h => now - last > Duration::hours(24),
    }
}

#[derive(Clone)]
pub struct QuotaLedger {
    pool: DbPool,
    policy: ResetPolicy,
    free_daily_limit: i64,
}

impl QuotaLedger {
    pub fn new(pool: DbPool, policy: ResetPolicy, free_daily_limit: i64) -> Self {
        Self {
            pool,
            policy,
            free_daily_limit,
        }
    }

    /// Decide se ammettere una richiesta per l'identity data.
    ///
    /// La creazione pigra del record e l'eventuale azzeramento del
    /// contatore vengono persistiti subito, prima della decisione: anche
    /// una richiesta rifiutata lascia il record di una nuova identity.
    pub async fn admit(&self, identity: &str) -> Result<Decision, sqlx::Error> {
        let now = Utc::now();

        let record = match users::find_by_identity(&self.pool, identity).await? {
            Some(record) => record,
            None => users::create_user(&self.pool, identity, now).await?,
        };

        if record.tier == Tier::Banned {
            return Ok(Decision::DenyBanned);
        }

        let mut requests_made = record.requests_made;
        if let Some(last) = record.last_request_at {
            if needs_reset(last, now, self.policy) {
                users::reset_requests(&self.pool, identity).await?;
                requests_made = 0;
            }
        }

        if record.tier == Tier::Free && requests_made >= self.free_daily_limit {
            return Ok(Decision::DenyQuotaExceeded);
        }

        Ok(Decision::Admit)
    }

    /// Registra l'uso dopo un `Admit`: incrementa il contatore e aggiorna
    /// il timestamp. Richieste concorrenti sulla stessa identity possono
    /// perdere un incremento: la quota è indicativa, non un confine di
    /// sicurezza.
    pub async fn record_usage(&self, identity: &str) -> Result<(), sqlx::Error> {
        users::record_request(&self.pool, identity, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use chrono::TimeZone;

    fn ledger(pool: DbPool) -> QuotaLedger {
        QuotaLedger::new(pool, ResetPolicy::CalendarDay, 3)
    }

    #[test]
    fn test_needs_reset_calendar_day() {
        let last = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 0, 1, 0).unwrap();
        // Due minuti dopo ma giorno diverso: reset
        assert!(needs_reset(last, now, ResetPolicy::CalendarDay));
        // Stesso giorno, molte ore dopo: nessun reset
        let same_day = Utc.with_ymd_and_hms(2025, 3, 1, 0, 5, 0).unwrap();
        assert!(!needs_reset(same_day, last, ResetPolicy::CalendarDay));
    }

    #[test]
    fn test_needs_reset_rolling_24h() {
        let last = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let within = Utc.with_ymd_and_hms(2025, 3, 2, 11, 0, 0).unwrap();
        let beyond = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 1).unwrap();
        assert!(!needs_reset(last, within, ResetPolicy::Rolling24h));
        assert!(needs_reset(last, beyond, ResetPolicy::Rolling24h));
    }

    #[tokio::test]
    async fn test_first_request_creates_record_and_admits() {
        let pool = memory_pool().await;
        let ledger = ledger(pool.clone());

        let decision = ledger.admit("00112233445566AA").await.unwrap();
        assert_eq!(decision, Decision::Admit);

        // La creazione pigra è già persistita
        let record = users::find_by_identity(&pool, "00112233445566AA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.requests_made, 0);

        ledger.record_usage("00112233445566AA").await.unwrap();
        let record = users::find_by_identity(&pool, "00112233445566AA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.requests_made, 1);
    }

    #[tokio::test]
    async fn test_free_tier_denied_at_limit() {
        let pool = memory_pool().await;
        let ledger = ledger(pool.clone());

        for _ in 0..3 {
            assert_eq!(ledger.admit("AABBCCDDEEFF0011").await.unwrap(), Decision::Admit);
            ledger.record_usage("AABBCCDDEEFF0011").await.unwrap();
        }

        // Quarta richiesta nella stessa finestra: rifiutata
        assert_eq!(
            ledger.admit("AABBCCDDEEFF0011").await.unwrap(),
            Decision::DenyQuotaExceeded
        );
    }

    #[tokio::test]
    async fn test_paid_tier_bypasses_quota() {
        let pool = memory_pool().await;
        let ledger = ledger(pool.clone());
        let expires = Utc::now() + Duration::days(30);

        users::upgrade_to_paid(&pool, "1234123412341234", expires)
            .await
            .unwrap();

        for _ in 0..5 {
            assert_eq!(ledger.admit("1234123412341234").await.unwrap(), Decision::Admit);
            ledger.record_usage("1234123412341234").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_banned_always_denied() {
        let pool = memory_pool().await;
        let ledger = ledger(pool.clone());

        users::create_user(&pool, "4321432143214321", Utc::now())
            .await
            .unwrap();
        users::ban_user(&pool, "4321432143214321").await.unwrap();

        assert_eq!(
            ledger.admit("4321432143214321").await.unwrap(),
            Decision::DenyBanned
        );
    }

    #[tokio::test]
    async fn test_window_reset_restores_quota() {
        let pool = memory_pool().await;
        let ledger = ledger(pool.clone());

        // Simula una finestra precedente: contatore pieno con timestamp di ieri
        let yesterday = Utc::now() - Duration::days(1);
        users::create_user(&pool, "9999888877776666", yesterday)
            .await
            .unwrap();
        for _ in 0..3 {
            users::record_request(&pool, "9999888877776666", yesterday)
                .await
                .unwrap();
        }

        // Nuovo giorno di calendario: il contatore riparte e la richiesta passa
        assert_eq!(
            ledger.admit("9999888877776666").await.unwrap(),
            Decision::Admit
        );
        let record = users::find_by_identity(&pool, "9999888877776666")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.requests_made, 0);
    }
}
