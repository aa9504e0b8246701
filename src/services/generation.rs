//! Proxy verso il backend esterno di generazione immagini
//!
//! Una singola chiamata sincrona per richiesta: payload a forma fissa,
//! estrazione del riferimento immagine dalla risposta, URL pubblico
//! secondo la strategia configurata.

use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};

use crate::config::UrlStrategy;
use crate::services::storage::ObjectStorageService;

// Costanti del payload di generazione
const GEN_WIDTH: u32 = 512;
const GEN_HEIGHT: u32 = 768;
const GEN_STEPS: u32 = 28;
const GEN_CFG_SCALE: f64 = 7.0;
const GEN_SAMPLER: &str = "Euler a";
const NEGATIVE_PROMPT: &str = "lowres, bad anatomy, bad hands, text, error, \
missing fingers, extra digit, fewer digits, cropped, worst quality, \
low quality, normal quality, jpeg artifacts, signature, watermark, \
username, blurry";

/// Errori del proxy di generazione
///
/// Qualunque fallimento (stato HTTP non di successo, campo immagine
/// assente, errore di rete, upload fallito) diventa un `GenerationError`:
/// mai propagare errori grezzi allo strato HTTP.
#[derive(Debug)]
pub enum GenerationError {
    Backend(String),
    Rehost(String),
}

impl GenerationError {
    /// Dettaglio diagnostico, destinato ai soli log
    pub fn detail(&self) -> &str {
        match self {
            GenerationError::Backend(detail) => detail,
            GenerationError::Rehost(detail) => detail,
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::Backend(_) => write!(f, "failed to generate / parse response"),
            GenerationError::Rehost(_) => write!(f, "failed to rehost generated image"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Costruisce il payload a forma fissa per il backend
fn build_payload(prompt: &str, model_type: &str, seed: u32) -> Value {
    json!({
        "model": model_type,
        "prompt": prompt,
        "negative_prompt": NEGATIVE_PROMPT,
        "width": GEN_WIDTH,
        "height": GEN_HEIGHT,
        "steps": GEN_STEPS,
        "cfg_scale": GEN_CFG_SCALE,
        "sampler": GEN_SAMPLER,
        "seed": seed,
    })
}

/// Estrae l'URL dell'immagine dalla risposta del backend
fn extract_image_url(body: &Value) -> Option<String> {
    body.get("images")?
        .get(0)?
        .get("url")?
        .as_str()
        .map(|s| s.to_string())
}

/// Proxy di generazione
pub struct GenerationService {
    client: reqwest::Client,
    backend_url: String,
    session_cookie: String,
    model_type: String,
    strategy: UrlStrategy,
    storage: ObjectStorageService,
}

impl GenerationService {
    pub fn new(
        backend_url: String,
        session_cookie: String,
        model_type: String,
        strategy: UrlStrategy,
        storage: ObjectStorageService,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            backend_url,
            session_cookie,
            model_type,
            strategy,
            storage,
        }
    }

    /// Genera un'immagine e ritorna il suo URL pubblico
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let seed: u32 = rand::thread_rng().gen();
        let payload = build_payload(prompt, &self.model_type, seed);

        let response = self
            .client
            .post(format!("{}/generate", self.backend_url))
            .header("Cookie", &self.session_cookie)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GenerationError::Backend(format!("status {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        let image_url = extract_image_url(&body)
            .ok_or_else(|| GenerationError::Backend("campo immagine assente".to_string()))?;

        match self.strategy {
            UrlStrategy::Passthrough => Ok(image_url),
            UrlStrategy::Rehost => self.rehost(&image_url).await,
        }
    }

    /// Scarica i byte dell'immagine dal backend e li ricarica sullo storage
    /// sotto una chiave derivata dal timestamp
    async fn rehost(&self, image_url: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| GenerationError::Rehost(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GenerationError::Rehost(format!("status {}", status)));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Rehost(e.to_string()))?;

        let key = format!("images/{}.jpeg", Utc::now().timestamp_millis());

        self.storage
            .upload(&key, data, "image/jpeg")
            .await
            .map_err(|e| GenerationError::Rehost(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_image_url() {
        let body = json!({"images": [{"url": "https://cdn.example/img/1.jpeg"}]});
        assert_eq!(
            extract_image_url(&body),
            Some("https://cdn.example/img/1.jpeg".to_string())
        );
    }

    #[test]
    fn test_extract_image_url_missing_field() {
        assert_eq!(extract_image_url(&json!({})), None);
        assert_eq!(extract_image_url(&json!({"images": []})), None);
        assert_eq!(extract_image_url(&json!({"images": [{"id": 1}]})), None);
        assert_eq!(extract_image_url(&json!({"images": [{"url": 42}]})), None);
    }

    #[test]
    fn test_build_payload_shape() {
        let payload = build_payload("un gatto sul tetto", "anything-v5", 1234);
        assert_eq!(payload["prompt"], "un gatto sul tetto");
        assert_eq!(payload["model"], "anything-v5");
        assert_eq!(payload["seed"], 1234);
        assert_eq!(payload["width"], 512);
        assert_eq!(payload["height"], 768);
        assert_eq!(payload["sampler"], "Euler a");
        assert!(payload["negative_prompt"].as_str().unwrap().contains("lowres"));
    }

    #[test]
    fn test_backend_error_message_is_fixed() {
        let err = GenerationError::Backend("status 502".to_string());
        assert_eq!(err.to_string(), "failed to generate / parse response");
        assert_eq!(err.detail(), "status 502");
    }
}
