//! Servizio di reputazione IP
//!
//! Interroga un lookup esterno in stile ipinfo e classifica l'indirizzo
//! come ammesso o rifiutato. Un errore del lookup si propaga al chiamante:
//! mai ammettere in silenzio quando il servizio non risponde.

use serde::Deserialize;

/// Errori del servizio di reputazione
#[derive(Debug)]
pub enum ReputationError {
    LookupFailed(String),
    ParseFailed(String),
}

impl std::fmt::Display for ReputationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReputationError::LookupFailed(msg) => write!(f, "Reputation lookup failed: {}", msg),
            ReputationError::ParseFailed(msg) => write!(f, "Reputation parse failed: {}", msg),
        }
    }
}

impl std::error::Error for ReputationError {}

/// Flag privacy riportati dal lookup
#[derive(Debug, Default, Deserialize)]
pub struct PrivacyFlags {
    #[serde(default)]
    pub vpn: bool,
    #[serde(default)]
    pub proxy: bool,
    #[serde(default)]
    pub tor: bool,
    #[serde(default)]
    pub relay: bool,
    #[serde(default)]
    pub hosting: bool,
}

/// Risposta del lookup di reputazione
#[derive(Debug, Deserialize)]
pub struct ReputationReport {
    #[serde(default)]
    pub bogon: bool,
    #[serde(default)]
    pub privacy: Option<PrivacyFlags>,
}

impl ReputationReport {
    /// Vero se nessun flag squalificante è presente
    pub fn is_allowed(&self) -> bool {
        if self.bogon {
            return false;
        }
        match &self.privacy {
            Some(p) => !(p.vpn || p.proxy || p.tor || p.relay || p.hosting),
            None => true,
        }
    }
}

/// Servizio di reputazione IP
pub struct ReputationService {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl ReputationService {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_url,
            token,
        }
    }

    /// Classifica un indirizzo IP: `Ok(true)` ammesso, `Ok(false)` rifiutato
    /// (bogon/proxy/VPN), `Err` se il lookup fallisce
    pub async fn check_ip(&self, ip: &str) -> Result<bool, ReputationError> {
        let url = format!("{}/{}?token={}", self.api_url, ip, self.token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReputationError::LookupFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ReputationError::LookupFailed(format!(
                "status {}",
                status
            )));
        }

        let report: ReputationReport = response
            .json()
            .await
            .map_err(|e| ReputationError::ParseFailed(e.to_string()))?;

        Ok(report.is_allowed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report_is_allowed() {
        let report: ReputationReport =
            serde_json::from_str(r#"{"ip":"1.2.3.4","privacy":{"vpn":false,"proxy":false}}"#)
                .unwrap();
        assert!(report.is_allowed());
    }

    #[test]
    fn test_vpn_is_rejected() {
        let report: ReputationReport =
            serde_json::from_str(r#"{"privacy":{"vpn":true}}"#).unwrap();
        assert!(!report.is_allowed());
    }

    #[test]
    fn test_bogon_is_rejected() {
        let report: ReputationReport = serde_json::from_str(r#"{"bogon":true}"#).unwrap();
        assert!(!report.is_allowed());
    }

    #[test]
    fn test_missing_privacy_block_is_allowed() {
        let report: ReputationReport = serde_json::from_str(r#"{"ip":"8.8.8.8"}"#).unwrap();
        assert!(report.is_allowed());
    }
}
