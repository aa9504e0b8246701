use serde::Deserialize;
use utoipa::IntoParams;

/// Query per la generazione di un'immagine
#[derive(Debug, Deserialize, IntoParams)]
pub struct PromptQuery {
    /// Prompt testuale per il backend di generazione
    pub prompt: Option<String>,
    /// Indirizzo IP del chiamante (verificato contro il servizio di reputazione)
    pub ip: Option<String>,
    /// Identity esadecimale di 16 caratteri
    pub id: Option<String>,
}

/// Query per l'upgrade a PAID
#[derive(Debug, Deserialize, IntoParams)]
pub struct AddQuery {
    /// Identity esadecimale di 16 caratteri
    pub id: Option<String>,
}
