//! Orquestación del análisis de documentos.
//!
//! Flujo lineal, sin estado intermedio ni reanudación:
//!   1. Validar la petición (antes de gastar una llamada de IA).
//!   2. Componer el prompt según el tipo de documento.
//!   3. Una llamada al servicio de IA.
//!   4. Extraer sugerencias de la respuesta cruda.
//!   5. Ensamblar el resultado con sus metadatos.
//!
//! Cada petición tiene su propia instancia del flujo; no hay nada compartido
//! ni cacheado entre peticiones concurrentes.

use chrono::Utc;
use tracing::info;

use crate::error::PipelineError;
use crate::gateway::ChatCompletions;
use crate::models::{AnalysisMetadata, AnalysisRequest, AnalysisResult, ChatReply, MediaType};
use crate::prompt;
use crate::suggest::{self, SuggestionPolicy};

/// Respuesta fija cuando el modelo devolvió una cadena vacía: el campo
/// `reply` del resultado final nunca queda vacío.
pub const FALLBACK_REPLY: &str =
    "Lo siento, no he podido generar el análisis en este momento. \
     Vuelve a intentarlo en unos instantes.";

/// Rechaza peticiones sin texto extraído o sin nombre de fichero. Se ejecuta
/// antes de cualquier llamada externa.
pub fn validate(request: &AnalysisRequest) -> Result<(), PipelineError> {
    if request.extracted_text.trim().is_empty() {
        return Err(PipelineError::Validation(
            "el campo extractedText es obligatorio".to_string(),
        ));
    }
    if request.file_name.trim().is_empty() {
        return Err(PipelineError::Validation(
            "el campo fileName es obligatorio".to_string(),
        ));
    }
    Ok(())
}

/// Ensambla el resultado final. El timestamp se toma aquí, en el momento del
/// ensamblado, no al inicio de la petición.
pub fn assemble(
    reply: ChatReply,
    suggestions: Vec<String>,
    file_name: &str,
    media_type: MediaType,
    content_length: usize,
    model_id: &str,
) -> AnalysisResult {
    let reply_text = if reply.raw_text.trim().is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        reply.raw_text
    };

    AnalysisResult {
        reply: reply_text,
        suggestions,
        metadata: AnalysisMetadata {
            file_name: file_name.to_string(),
            file_type: media_type.label().to_string(),
            content_length,
            timestamp: Utc::now().to_rfc3339(),
            model_id: model_id.to_string(),
        },
    }
}

/// Ejecuta el pipeline completo para una petición de análisis de documento.
pub async fn run_analysis(
    gateway: &dyn ChatCompletions,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, PipelineError> {
    validate(request)?;

    let envelope = prompt::build_prompt(
        &request.extracted_text,
        request.question.as_deref(),
        &request.file_name,
        request.media_type,
    );

    let reply = gateway.complete(&envelope).await?;
    let suggestions = suggest::extract_suggestions(&reply.raw_text, SuggestionPolicy::Bulleted);

    info!(
        file = %request.file_name,
        suggestions = suggestions.len(),
        "Análisis de documento completado"
    );

    Ok(assemble(
        reply,
        suggestions,
        &request.file_name,
        request.media_type,
        request.extracted_text.len(),
        gateway.model(),
    ))
}
