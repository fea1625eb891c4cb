use axum::{
    extract::{Json, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    extract,
    models::{AnalysisRequest, AnalysisResult, ChatReply, ExtractionMethod, MediaType, UploadedDocument},
    pipeline,
    prompt,
    suggest::{self, SuggestionPolicy},
};

// --- Política de errores por endpoint ---

/// Qué hacer cuando el servicio de IA falla. Es una decisión de cada
/// endpoint, tomada aquí en la frontera, nunca dentro del pipeline:
/// - `Surface`: el error se expone con su código HTTP y detalle.
/// - `MaskWithFallback`: se responde 200 con un texto enlatado (el chat del
///   panel prefiere degradarse a romper la conversación).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorPolicy {
    Surface,
    MaskWithFallback,
}

const DOCUMENT_AI_POLICY: ErrorPolicy = ErrorPolicy::Surface;
const CHAT_POLICY: ErrorPolicy = ErrorPolicy::MaskWithFallback;

/// Respuesta enlatada del chat cuando el servicio de IA falla.
const CHAT_FALLBACK_REPLY: &str =
    "Ahora mismo no puedo contactar con el servicio de análisis. \
     Puedes seguir navegando por el panel y volver a preguntar en un momento.";

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAiPayload {
    #[serde(default)]
    extracted_text: Option<String>,
    /// El frontend histórico envía `message`; los clientes nuevos, `question`.
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    reply: String,
    suggestions: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractPdfResponse {
    file_name: String,
    text: String,
    estimated_pages: u32,
    extraction_method: ExtractionMethod,
    requires_manual_input: bool,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/analysis/document-ai", post(document_ai_handler))
        .route("/analysis/chat", post(chat_handler))
        .route("/analysis/upload", post(upload_handler))
        .route("/analysis/extract-pdf", post(extract_pdf_handler))
        .route("/analysis/test", get(ai_test_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

/// Análisis de documento. Su política es [`ErrorPolicy::Surface`]: un fallo
/// del servicio de IA se devuelve como 503 con detalle y `fallback: true`.
#[axum::debug_handler]
async fn document_ai_handler(
    State(state): State<AppState>,
    Json(payload): Json<DocumentAiPayload>,
) -> Result<Json<AnalysisResult>, (StatusCode, Json<serde_json::Value>)> {
    let extracted_text = payload.extracted_text.unwrap_or_default();
    let file_name = payload.file_name.unwrap_or_default();
    if extracted_text.trim().is_empty() || file_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Petición inválida",
                "message": "Los campos extractedText y fileName son obligatorios.",
            })),
        ));
    }

    let media_type = payload
        .file_type
        .as_deref()
        .map(MediaType::from_mime)
        .unwrap_or_else(|| MediaType::from_file_name(&file_name));

    let request = AnalysisRequest {
        extracted_text,
        question: payload.message.or(payload.question),
        file_name,
        media_type,
    };

    match pipeline::run_analysis(state.gateway.as_ref(), &request).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!("Fallo analizando {}: {e}", request.file_name);
            match DOCUMENT_AI_POLICY {
                ErrorPolicy::Surface => Err((
                    e.status_code(),
                    Json(json!({
                        "error": "Fallo en el análisis con IA",
                        "message": "No se pudo completar el análisis del documento.",
                        "details": e.to_string(),
                        "fallback": e.is_upstream(),
                    })),
                )),
                ErrorPolicy::MaskWithFallback => Ok(Json(pipeline::assemble(
                    ChatReply {
                        raw_text: String::new(),
                    },
                    Vec::new(),
                    &request.file_name,
                    request.media_type,
                    request.extracted_text.len(),
                    state.gateway.model(),
                ))),
            }
        }
    }
}

/// Chat libre del panel. Su política es [`ErrorPolicy::MaskWithFallback`]:
/// si la IA falla se responde 200 con un texto enlatado en vez de propagar
/// el error.
#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    let message = payload.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Petición inválida",
                "message": "El campo message es obligatorio.",
            })),
        ));
    }

    let envelope = prompt::build_chat_prompt(&message, payload.context.as_deref());

    match state.gateway.complete(&envelope).await {
        Ok(reply) => {
            let suggestions =
                suggest::extract_suggestions(&reply.raw_text, SuggestionPolicy::LeadingSentences);
            Ok(Json(ChatResponse {
                reply: reply.raw_text,
                suggestions,
            }))
        }
        Err(e) => match CHAT_POLICY {
            ErrorPolicy::Surface => Err((
                e.status_code(),
                Json(json!({
                    "error": "Fallo en el chat con IA",
                    "message": "No se pudo generar la respuesta.",
                    "details": e.to_string(),
                })),
            )),
            ErrorPolicy::MaskWithFallback => {
                warn!("El chat degrada a respuesta enlatada: {e}");
                Ok(Json(ChatResponse {
                    reply: CHAT_FALLBACK_REPLY.to_string(),
                    suggestions: Vec::new(),
                }))
            }
        },
    }
}

/// Subida de documento. De momento devuelve un resumen de proyecto simulado:
/// el análisis real se lanza desde el frontend vía `/analysis/document-ai`.
#[axum::debug_handler]
async fn upload_handler(
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let file = read_file_field(multipart).await?;

    if file.media_type == MediaType::Other {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Tipo de fichero no soportado",
                "message": "Solo se aceptan ficheros text/csv o application/pdf.",
            })),
        ));
    }

    info!(
        "Fichero recibido: {} ({} bytes, tipo {})",
        file.file_name,
        file.size_bytes(),
        file.media_type.label()
    );

    Ok(Json(json!({
        "id": Uuid::new_v4(),
        "fileName": file.file_name,
        "fileType": file.media_type.label(),
        "sizeBytes": file.size_bytes(),
        "projectSummary": {
            "status": "pendiente-de-analisis",
            "financials": "Sin analizar todavía.",
            "resources": "Sin analizar todavía.",
            "risks": "Sin analizar todavía.",
            "milestones": "Sin analizar todavía.",
        },
    })))
}

/// Extracción de texto de un PDF. Siempre responde 200: si el extractor no
/// devuelve texto útil, el cuerpo lleva el marcador solo-metadatos y
/// `requiresManualInput: true`.
#[axum::debug_handler]
async fn extract_pdf_handler(
    multipart: Multipart,
) -> Result<Json<ExtractPdfResponse>, (StatusCode, Json<serde_json::Value>)> {
    let mut file = read_file_field(multipart).await?;
    // Este endpoint solo trata PDFs, declare lo que declare el navegador.
    file.media_type = MediaType::Pdf;

    let doc = match extract::normalize(&file) {
        Ok(doc) => doc,
        Err(e) => {
            error!("Extracción de PDF fallida para {}: {e}", file.file_name);
            extract::metadata_fallback(&file)
        }
    };

    Ok(Json(ExtractPdfResponse {
        file_name: file.file_name,
        requires_manual_input: doc.method == ExtractionMethod::MetadataOnlyFallback,
        text: doc.text,
        estimated_pages: doc.estimated_pages,
        extraction_method: doc.method,
    }))
}

/// Diagnóstico: una llamada trivial al servicio de IA para comprobar
/// credenciales y conectividad desde el propio panel.
#[axum::debug_handler]
async fn ai_test_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.gateway.probe().await {
        Ok(reply) => Ok(Json(json!({
            "status": "ok",
            "model": state.gateway.model(),
            "reply": reply,
        }))),
        Err(e) => {
            error!("Diagnóstico del servicio de IA fallido: {e}");
            Err((
                e.status_code(),
                Json(json!({
                    "status": "error",
                    "details": e.to_string(),
                })),
            ))
        }
    }
}

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

// --- Utilidades ---

/// Lee el campo `file` de un formulario multipart y lo convierte en un
/// [`UploadedDocument`]. El tipo se toma del Content-Type declarado y, si el
/// navegador no declaró ninguno, del nombre del fichero.
async fn read_file_field(
    mut multipart: Multipart,
) -> Result<UploadedDocument, (StatusCode, Json<serde_json::Value>)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Petición inválida",
                        "message": "Falta el campo de fichero 'file' en el formulario.",
                    })),
                ));
            }
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Petición inválida",
                        "message": format!("No se pudo leer el formulario multipart: {e}"),
                    })),
                ));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("sin-nombre").to_string();
        let media_type = match field.content_type() {
            Some(mime) => MediaType::from_mime(mime),
            None => MediaType::from_file_name(&file_name),
        };

        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Petición inválida",
                    "message": format!("No se pudo leer el fichero: {e}"),
                })),
            )
        })?;

        return Ok(UploadedDocument {
            file_name,
            media_type,
            bytes: bytes.to_vec(),
        });
    }
}
