use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::users::Tier;

#[derive(Debug, Serialize, ToSchema)]
pub struct PromptResponse {
    pub code: u16,
    /// URL pubblico dell'immagine generata
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TierResponse {
    /// "PAID" oppure "FREE"
    pub msg: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfoResponse {
    pub identity: String,
    pub tier: Tier,
    pub requests_made: i64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_request_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub premium_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BanResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
