pub mod account;
pub mod health;
pub mod prompt;

use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;

use crate::db::users::Tier;
use crate::db::DbPool;
use crate::models::{
    BanResponse, ErrorResponse, MessageResponse, PromptResponse, TierResponse, UserInfoResponse,
};
use crate::services::generation::GenerationService;
use crate::services::quota::QuotaLedger;
use crate::services::reputation::ReputationService;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Generly API",
        version = "1.0.0",
        description = "API per la generazione di immagini con quote giornaliere per identity",
        license(name = "MIT"),
    ),
    paths(
        health::liveness,
        prompt::generate_image,
        account::upgrade_account,
        account::check_tier,
        account::user_info,
        account::ban_identity,
    ),
    components(schemas(
        PromptResponse,
        MessageResponse,
        TierResponse,
        UserInfoResponse,
        BanResponse,
        ErrorResponse,
        Tier,
    )),
    tags(
        (name = "Sistema", description = "Liveness"),
        (name = "Generazione", description = "Generazione immagini con quota"),
        (name = "Account", description = "Gestione tier delle identity"),
    )
)]
pub struct ApiDoc;

pub fn create_router(
    db: DbPool,
    ledger: QuotaLedger,
    reputation: Arc<ReputationService>,
    generation: Arc<GenerationService>,
) -> Router {
    Router::new()
        .merge(health::router())
        .merge(prompt::router(ledger, reputation, generation))
        .merge(account::router(db))
}
