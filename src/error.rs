//! Errores de la barbería

use thiserror::Error;

use crate::ClientId;

/// Condiciones recuperables. Las violaciones de invariantes no pasan por acá:
/// son `panic!` (fallan en el acto).
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Configuración inválida: {0}")]
    Config(String),

    #[error("La barbería está cerrada")]
    Closed,

    #[error("Se cortó la línea de comunicación con el cliente {0}")]
    LineClosed(ClientId),

    #[error("El agente '{0}' abortó")]
    AgentPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShopError>;
