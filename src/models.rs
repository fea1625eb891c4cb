//! Modelos de dominio del pipeline de análisis (todos efímeros, ligados a
//! una única petición; nada se persiste ni se comparte entre peticiones).

use serde::{Deserialize, Serialize};

/// Tipo de documento reconocido por el pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Csv,
    Pdf,
    Other,
}

impl MediaType {
    /// Interpreta el tipo declarado por el cliente. Acepta tanto tipos MIME
    /// completos como las etiquetas cortas que usa el frontend.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_lowercase().as_str() {
            "text/csv" | "application/csv" | "csv" => Self::Csv,
            "application/pdf" | "pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }

    /// Deduce el tipo a partir del nombre de fichero cuando el cliente no
    /// declaró ninguno.
    pub fn from_file_name(name: &str) -> Self {
        mime_guess::from_path(name)
            .first()
            .map(|m| Self::from_mime(m.essence_str()))
            .unwrap_or(Self::Other)
    }

    /// Etiqueta corta para prompts y respuestas JSON.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Pdf => "PDF",
            Self::Other => "documento",
        }
    }
}

/// Cómo se obtuvo el texto de un documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Decodificación directa de los bytes (CSV).
    DirectDecode,
    /// Extractor de texto externo (PDF).
    ExternalExtractor,
    /// El extractor no devolvió texto útil; `text` contiene un marcador
    /// explicativo, no contenido real del documento.
    MetadataOnlyFallback,
}

/// Fichero recién subido, tal y como llega del navegador.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Resultado de normalizar un documento a texto plano.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub estimated_pages: u32,
    pub method: ExtractionMethod,
    pub success: bool,
}

/// Petición de análisis ya normalizada: texto extraído + pregunta del usuario.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub extracted_text: String,
    pub question: Option<String>,
    pub file_name: String,
    pub media_type: MediaType,
}

/// Par de instrucciones (sistema + usuario) que se envía al servicio de IA.
/// Se compone una vez por petición y nunca se reutiliza.
#[derive(Debug, Clone)]
pub struct PromptEnvelope {
    pub system: String,
    pub user: String,
}

/// Salida cruda del modelo, sin parsear.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub raw_text: String,
}

/// Metadatos que acompañan a cada resultado de análisis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub file_name: String,
    pub file_type: String,
    pub content_length: usize,
    /// Momento del ensamblado de la respuesta, en RFC 3339.
    pub timestamp: String,
    pub model_id: String,
}

/// Resultado estructurado del pipeline: respuesta + sugerencias + metadatos.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub reply: String,
    pub suggestions: Vec<String>,
    pub metadata: AnalysisMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_from_mime() {
        assert_eq!(MediaType::from_mime("text/csv"), MediaType::Csv);
        assert_eq!(MediaType::from_mime("application/pdf"), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("PDF"), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("image/png"), MediaType::Other);
        assert_eq!(MediaType::from_mime(""), MediaType::Other);
    }

    #[test]
    fn media_type_from_file_name() {
        assert_eq!(MediaType::from_file_name("gastos.csv"), MediaType::Csv);
        assert_eq!(MediaType::from_file_name("informe.pdf"), MediaType::Pdf);
        assert_eq!(MediaType::from_file_name("foto.png"), MediaType::Other);
    }
}
