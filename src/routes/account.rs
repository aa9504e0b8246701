use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};

use crate::db::users::{self, Tier};
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    AddQuery, BanResponse, ErrorResponse, MessageResponse, TierResponse, UserInfoResponse,
};
use crate::utils::is_valid_identity;

/// Durata del periodo premium applicata da /add
const PREMIUM_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AccountState {
    pub db: DbPool,
}

pub fn router(db: DbPool) -> Router {
    let state = AccountState { db };
    Router::new()
        .route("/add", get(upgrade_account))
        .route("/check/:id", get(check_tier))
        .route("/info/:id", get(user_info))
        .route("/ban/:id", get(ban_identity))
        .with_state(state)
}

/// Porta un'identity al tier PAID con scadenza a 30 giorni
#[utoipa::path(
    get,
    path = "/add",
    params(AddQuery),
    responses(
        (status = 200, description = "Upgrade completato", body = MessageResponse),
        (status = 400, description = "Parametro mancante", body = ErrorResponse),
        (status = 403, description = "Identity non valida", body = ErrorResponse),
    ),
    tag = "Account"
)]
pub async fn upgrade_account(
    State(state): State<AccountState>,
    Query(query): Query<AddQuery>,
) -> Result<Json<MessageResponse>> {
    let id = query
        .id
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingParam("id".to_string()))?;

    if !is_valid_identity(&id) {
        return Err(AppError::InvalidIdentity);
    }

    let expires_at = Utc::now() + Duration::days(PREMIUM_DAYS);
    users::upgrade_to_paid(&state.db, &id, expires_at).await?;

    tracing::info!("Identity {} portata a PAID fino a {}", id, expires_at);

    Ok(Json(MessageResponse {
        code: 200,
        message: format!("Upgrade a PAID completato ({} giorni)", PREMIUM_DAYS),
    }))
}

/// Riporta il tier di fatturazione di un'identity
///
/// Proietta solo il flag premium: un'identity bannata risponde FREE.
#[utoipa::path(
    get,
    path = "/check/{id}",
    params(
        ("id" = String, Path, description = "Identity esadecimale di 16 caratteri")
    ),
    responses(
        (status = 200, description = "Tier dell'identity", body = TierResponse),
        (status = 400, description = "Identity malformata", body = ErrorResponse),
        (status = 404, description = "Identity sconosciuta", body = ErrorResponse),
    ),
    tag = "Account"
)]
pub async fn check_tier(
    State(state): State<AccountState>,
    Path(id): Path<String>,
) -> Result<Json<TierResponse>> {
    if !is_valid_identity(&id) {
        return Err(AppError::MalformedIdentity);
    }

    let record = users::find_by_identity(&state.db, &id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let msg = if record.tier == Tier::Paid {
        "PAID"
    } else {
        "FREE"
    };

    Ok(Json(TierResponse {
        msg: msg.to_string(),
    }))
}

/// Proiezione completa del record di un'identity
#[utoipa::path(
    get,
    path = "/info/{id}",
    params(
        ("id" = String, Path, description = "Identity esadecimale di 16 caratteri")
    ),
    responses(
        (status = 200, description = "Record completo", body = UserInfoResponse),
        (status = 400, description = "Identity malformata", body = ErrorResponse),
        (status = 404, description = "Identity sconosciuta", body = ErrorResponse),
    ),
    tag = "Account"
)]
pub async fn user_info(
    State(state): State<AccountState>,
    Path(id): Path<String>,
) -> Result<Json<UserInfoResponse>> {
    if !is_valid_identity(&id) {
        return Err(AppError::MalformedIdentity);
    }

    let record = users::find_by_identity(&state.db, &id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(UserInfoResponse {
        identity: record.identity,
        tier: record.tier,
        requests_made: record.requests_made,
        last_request_at: record.last_request_at,
        premium_expires_at: record.premium_expires_at,
    }))
}

/// Imposta il tier BANNED su un'identity esistente
#[utoipa::path(
    get,
    path = "/ban/{id}",
    params(
        ("id" = String, Path, description = "Identity esadecimale di 16 caratteri")
    ),
    responses(
        (status = 200, description = "Identity bannata", body = BanResponse),
        (status = 400, description = "Identity malformata", body = ErrorResponse),
        (status = 404, description = "Identity sconosciuta", body = ErrorResponse),
    ),
    tag = "Account"
)]
pub async fn ban_identity(
    State(state): State<AccountState>,
    Path(id): Path<String>,
) -> Result<Json<BanResponse>> {
    if !is_valid_identity(&id) {
        return Err(AppError::MalformedIdentity);
    }

    let banned = users::ban_user(&state.db, &id).await?;
    if !banned {
        return Err(AppError::UserNotFound);
    }

    tracing::info!("Identity {} bannata", id);

    Ok(Json(BanResponse {
        message: format!("Identity {} bannata", id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    async fn state() -> AccountState {
        AccountState {
            db: memory_pool().await,
        }
    }

    #[tokio::test]
    async fn test_add_then_check_reports_paid() {
        let state = state().await;

        let response = upgrade_account(
            State(state.clone()),
            Query(AddQuery {
                id: Some("00AA11BB22CC33DD".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.code, 200);

        let check = check_tier(State(state.clone()), Path("00AA11BB22CC33DD".to_string()))
            .await
            .unwrap();
        assert_eq!(check.0.msg, "PAID");

        // La scadenza premium è circa now + 30 giorni
        let record = users::find_by_identity(&state.db, "00AA11BB22CC33DD")
            .await
            .unwrap()
            .unwrap();
        let expires = record.premium_expires_at.unwrap();
        let delta = expires - (Utc::now() + Duration::days(PREMIUM_DAYS));
        assert!(delta.num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_identity() {
        let state = state().await;

        let err = upgrade_account(
            State(state),
            Query(AddQuery {
                id: Some("troppo-corta".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity));
    }

    #[tokio::test]
    async fn test_add_requires_id() {
        let state = state().await;

        let err = upgrade_account(State(state), Query(AddQuery { id: None }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingParam(_)));
    }

    #[tokio::test]
    async fn test_check_unknown_identity_is_404() {
        let state = state().await;

        let err = check_tier(State(state), Path("DEADBEEFDEADBEEF".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn test_check_malformed_identity_is_400() {
        let state = state().await;

        let err = check_tier(State(state), Path("zzz".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedIdentity));
    }

    #[tokio::test]
    async fn test_check_free_identity() {
        let state = state().await;
        users::create_user(&state.db, "0102030405060708", Utc::now())
            .await
            .unwrap();

        let check = check_tier(State(state), Path("0102030405060708".to_string()))
            .await
            .unwrap();
        assert_eq!(check.0.msg, "FREE");
    }

    #[tokio::test]
    async fn test_ban_then_info_shows_banned() {
        let state = state().await;
        users::create_user(&state.db, "0F0E0D0C0B0A0908", Utc::now())
            .await
            .unwrap();

        ban_identity(State(state.clone()), Path("0F0E0D0C0B0A0908".to_string()))
            .await
            .unwrap();

        let info = user_info(State(state), Path("0F0E0D0C0B0A0908".to_string()))
            .await
            .unwrap();
        assert_eq!(info.0.tier, Tier::Banned);
    }

    #[tokio::test]
    async fn test_ban_unknown_identity_is_404() {
        let state = state().await;

        let err = ban_identity(State(state), Path("FFFFFFFF00000000".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
