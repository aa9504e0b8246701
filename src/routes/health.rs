use axum::{routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(liveness))
}

/// Marcatore di vita del servizio
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Servizio attivo", body = String),
    ),
    tag = "Sistema"
)]
pub async fn liveness() -> &'static str {
    "Generly API attiva"
}
