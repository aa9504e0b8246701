use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Parametro mancante: {0}")]
    MissingParam(String),

    #[error("Identity non valida")]
    InvalidIdentity,

    #[error("Identity malformata")]
    MalformedIdentity,

    #[error("Identity bannata")]
    Banned,

    #[error("Indirizzo IP non ammesso")]
    IpRejected,

    #[error("Limite giornaliero raggiunto")]
    QuotaExceeded,

    #[error("Identity non trovata")]
    UserNotFound,

    #[error("Troppe richieste: {0}")]
    RateLimited(String),

    #[error("Errore del servizio esterno")]
    Upstream(String),

    #[error("Errore interno del server")]
    Database(#[from] sqlx::Error),

    #[error("Errore interno del server")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MissingParam(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedIdentity => StatusCode::BAD_REQUEST,
            AppError::InvalidIdentity => StatusCode::FORBIDDEN,
            AppError::Banned => StatusCode::FORBIDDEN,
            AppError::IpRejected => StatusCode::FORBIDDEN,
            AppError::QuotaExceeded => StatusCode::FORBIDDEN,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Il dettaglio dei 500 va solo nei log, mai nella risposta
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            match &self {
                AppError::Upstream(detail) => tracing::error!("Errore upstream: {}", detail),
                AppError::Database(e) => tracing::error!("Errore database: {}", e),
                AppError::Internal(detail) => tracing::error!("Errore interno: {}", detail),
                _ => {}
            }
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
