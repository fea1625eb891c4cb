//! Taxonomía de errores del pipeline de análisis de documentos.
//!
//! Cada variante lleva un mensaje legible para humanos y sabe a qué código
//! HTTP corresponde. La política de propagación (exponer el error o
//! enmascararlo con una respuesta enlatada) se decide en la capa de API,
//! nunca dentro del pipeline.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Falta un campo obligatorio o llegó vacío.
    #[error("Petición inválida: {0}")]
    Validation(String),

    /// El tipo de fichero no es CSV ni PDF.
    #[error("Tipo de fichero no soportado: {0}")]
    UnsupportedMediaType(String),

    /// Los bytes del fichero no se pudieron decodificar como texto.
    #[error("No se pudo decodificar el fichero como UTF-8: {0}")]
    Decode(String),

    /// Fallo de red o timeout hablando con el servicio de IA.
    #[error("El servicio de IA no está disponible: {0}")]
    UpstreamUnavailable(String),

    /// El servicio de IA rechazó las credenciales (401/403).
    #[error("Credenciales rechazadas por el servicio de IA (HTTP {status})")]
    UpstreamAuth { status: u16 },

    /// El servicio de IA devolvió otro estado no-2xx.
    #[error("El servicio de IA rechazó la petición (HTTP {status}): {body}")]
    UpstreamRejected { status: u16, body: String },

    /// La respuesta llegó pero no trae contenido extraíble.
    #[error("Respuesta del servicio de IA sin contenido utilizable: {0}")]
    MalformedResponse(String),
}

impl PipelineError {
    /// Código HTTP con el que se expone este error cuando la política del
    /// endpoint es hacerlo visible.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamUnavailable(_)
            | Self::UpstreamAuth { .. }
            | Self::UpstreamRejected { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Indica si el fallo ocurrió en el servicio de IA externo.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_)
                | Self::UpstreamAuth { .. }
                | Self::UpstreamRejected { .. }
                | Self::MalformedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err = PipelineError::Validation("falta fileName".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_upstream());
    }

    #[test]
    fn upstream_errors_map_to_503() {
        let err = PipelineError::UpstreamAuth { status: 401 };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_upstream());

        let err = PipelineError::UpstreamRejected {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_upstream());
    }

    #[test]
    fn messages_are_human_readable() {
        let err = PipelineError::UnsupportedMediaType("image/png".into());
        assert!(err.to_string().contains("image/png"));
    }
}
