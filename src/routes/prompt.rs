use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::models::{ErrorResponse, PromptQuery, PromptResponse};
use crate::services::generation::GenerationService;
use crate::services::quota::{Decision, QuotaLedger};
use crate::services::reputation::ReputationService;
use crate::utils::is_valid_identity;

#[derive(Clone)]
pub struct PromptState {
    pub ledger: QuotaLedger,
    pub reputation: Arc<ReputationService>,
    pub generation: Arc<GenerationService>,
}

pub fn router(
    ledger: QuotaLedger,
    reputation: Arc<ReputationService>,
    generation: Arc<GenerationService>,
) -> Router {
    let state = PromptState {
        ledger,
        reputation,
        generation,
    };
    Router::new()
        .route("/prompt", get(generate_image))
        .with_state(state)
}

/// Genera un'immagine per l'identity indicata
///
/// Flusso: validazione identity, reputazione IP, ammissione quota (con
/// uso registrato subito dopo), chiamata al backend di generazione.
#[utoipa::path(
    get,
    path = "/prompt",
    params(PromptQuery),
    responses(
        (status = 200, description = "Immagine generata", body = PromptResponse),
        (status = 400, description = "Parametri mancanti", body = ErrorResponse),
        (status = 403, description = "Identity non valida, bannata, IP rifiutato o quota esaurita", body = ErrorResponse),
        (status = 500, description = "Errore del backend o interno", body = ErrorResponse),
    ),
    tag = "Generazione"
)]
pub async fn generate_image(
    State(state): State<PromptState>,
    Query(query): Query<PromptQuery>,
) -> Result<Json<PromptResponse>> {
    let prompt = query
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingParam("prompt".to_string()))?;
    let ip = query
        .ip
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingParam("ip".to_string()))?;
    let id = query
        .id
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingParam("id".to_string()))?;

    if !is_valid_identity(&id) {
        return Err(AppError::InvalidIdentity);
    }

    // Reputazione IP: un errore del lookup chiude la richiesta (fail closed)
    let allowed = state
        .reputation
        .check_ip(&ip)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    if !allowed {
        return Err(AppError::IpRejected);
    }

    match state.ledger.admit(&id).await? {
        Decision::DenyBanned => return Err(AppError::Banned),
        Decision::DenyQuotaExceeded => return Err(AppError::QuotaExceeded),
        Decision::Admit => {}
    }

    // Il registro viene aggiornato prima della chiamata al backend: una
    // generazione fallita consuma comunque la quota
    state.ledger.record_usage(&id).await?;

    let url = state
        .generation
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Upstream(format!("{} ({})", e, e.detail())))?;

    tracing::info!("Immagine generata per identity {}", id);

    Ok(Json(PromptResponse { code: 200, url }))
}
