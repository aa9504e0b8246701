/// Politica di reset della finestra di quota giornaliera
///
/// Le due varianti osservate in produzione: reset al cambio di giorno
/// di calendario (UTC) oppure dopo 24 ore dall'ultima richiesta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolicy {
    CalendarDay,
    Rolling24h,
}

impl From<&str> for ResetPolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rolling-24h" | "rolling" => ResetPolicy::Rolling24h,
            _ => ResetPolicy::CalendarDay,
        }
    }
}

/// Strategia per l'URL pubblico dell'immagine generata
///
/// `Passthrough` ritorna l'URL CDN del backend; `Rehost` scarica i byte
/// e li ricarica sullo storage del servizio, scollegando i link pubblici
/// dalla vita degli URL del provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStrategy {
    Passthrough,
    Rehost,
}

impl From<&str> for UrlStrategy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rehost" => UrlStrategy::Rehost,
            _ => UrlStrategy::Passthrough,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub free_daily_limit: i64,
    pub reset_policy: ResetPolicy,
    pub url_strategy: UrlStrategy,
    pub backend_url: String,
    pub session_cookie: String,
    pub model_type: String,
    pub reputation_url: String,
    pub reputation_token: String,
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_key: String,
    pub storage_public_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            rate_limit_per_minute: 100,
            free_daily_limit: 3,
            reset_policy: ResetPolicy::CalendarDay,
            url_strategy: UrlStrategy::Passthrough,
            backend_url: "http://localhost:7860".to_string(),
            session_cookie: String::new(),
            model_type: "anything-v5".to_string(),
            reputation_url: "https://ipinfo.io".to_string(),
            reputation_token: String::new(),
            storage_url: "http://localhost:8000/storage/v1".to_string(),
            storage_bucket: "generated".to_string(),
            storage_key: String::new(),
            storage_public_url: "http://localhost:8000/storage/v1/object/public".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("GENERLY_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("GENERLY_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Ok(limit) = std::env::var("GENERLY_RATE_LIMIT") {
            if let Ok(l) = limit.parse() {
                config.rate_limit_per_minute = l;
            }
        }

        if let Ok(limit) = std::env::var("GENERLY_FREE_DAILY_LIMIT") {
            if let Ok(l) = limit.parse() {
                config.free_daily_limit = l;
            }
        }

        if let Ok(policy) = std::env::var("GENERLY_RESET_POLICY") {
            config.reset_policy = ResetPolicy::from(policy.as_str());
        }

        if let Ok(strategy) = std::env::var("GENERLY_URL_STRATEGY") {
            config.url_strategy = UrlStrategy::from(strategy.as_str());
        }

        if let Ok(url) = std::env::var("GENERLY_BACKEND_URL") {
            config.backend_url = url;
        }

        if let Ok(cookie) = std::env::var("GENERLY_SESSION_COOKIE") {
            config.session_cookie = cookie;
        }

        if let Ok(model) = std::env::var("GENERLY_MODEL_TYPE") {
            config.model_type = model;
        }

        if let Ok(url) = std::env::var("GENERLY_REPUTATION_URL") {
            config.reputation_url = url;
        }

        if let Ok(token) = std::env::var("GENERLY_REPUTATION_TOKEN") {
            config.reputation_token = token;
        }

        if let Ok(url) = std::env::var("GENERLY_STORAGE_URL") {
            config.storage_url = url;
        }

        if let Ok(bucket) = std::env::var("GENERLY_STORAGE_BUCKET") {
            config.storage_bucket = bucket;
        }

        if let Ok(key) = std::env::var("GENERLY_STORAGE_KEY") {
            config.storage_key = key;
        }

        if let Ok(url) = std::env::var("GENERLY_STORAGE_PUBLIC_URL") {
            config.storage_public_url = url;
        }

        config
    }
}
