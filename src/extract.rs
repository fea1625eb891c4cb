//! Normalización de documentos subidos a texto plano con metadatos ligeros
//! (páginas estimadas, método de extracción, éxito de la operación).

use tracing::warn;

use crate::error::PipelineError;
use crate::models::{ExtractedDocument, ExtractionMethod, MediaType, UploadedDocument};

/// Heurística de páginas para PDFs sin texto extraíble: una página por cada
/// ~50 KB, mínimo una.
const BYTES_PER_PAGE: usize = 50 * 1024;

/// Convierte un fichero subido en texto plano.
///
/// - CSV: decodificación UTF-8 directa.
/// - PDF: extractor externo; si no devuelve texto útil se degrada de forma
///   explícita a un resultado solo-metadatos (la operación sigue contando
///   como exitosa, pero `text` es un marcador, no contenido real).
/// - Cualquier otro tipo se rechaza.
pub fn normalize(file: &UploadedDocument) -> Result<ExtractedDocument, PipelineError> {
    match file.media_type {
        MediaType::Csv => decode_csv(file),
        MediaType::Pdf => Ok(extract_pdf(file)),
        MediaType::Other => Err(PipelineError::UnsupportedMediaType(format!(
            "\"{}\" no es CSV ni PDF",
            file.file_name
        ))),
    }
}

fn decode_csv(file: &UploadedDocument) -> Result<ExtractedDocument, PipelineError> {
    let text = std::str::from_utf8(&file.bytes)
        .map_err(|e| PipelineError::Decode(format!("{}: {e}", file.file_name)))?
        .to_string();

    Ok(ExtractedDocument {
        text,
        estimated_pages: 1,
        method: ExtractionMethod::DirectDecode,
        success: true,
    })
}

fn extract_pdf(file: &UploadedDocument) -> ExtractedDocument {
    match pdf_extract::extract_text_from_mem(&file.bytes) {
        Ok(text) if !text.trim().is_empty() => ExtractedDocument {
            estimated_pages: estimate_pages(file.size_bytes()),
            text,
            method: ExtractionMethod::ExternalExtractor,
            success: true,
        },
        Ok(_) => {
            warn!(
                "El PDF {} no contiene texto extraíble; se devuelve solo metadatos",
                file.file_name
            );
            metadata_fallback(file)
        }
        Err(e) => {
            warn!(
                "No se pudo extraer texto del PDF {}: {e}; se devuelve solo metadatos",
                file.file_name
            );
            metadata_fallback(file)
        }
    }
}

/// Resultado degradado cuando el extractor de PDF no está disponible o no
/// devuelve texto útil. El marcador incluye el nombre del fichero y la
/// estimación de páginas para que el usuario sepa qué pasó.
pub fn metadata_fallback(file: &UploadedDocument) -> ExtractedDocument {
    let pages = estimate_pages(file.size_bytes());
    let text = format!(
        "No se pudo extraer el contenido real del PDF \"{}\". \
         El fichero ocupa {} bytes (aprox. {} página(s)). \
         Introduce el texto manualmente si quieres analizarlo.",
        file.file_name,
        file.size_bytes(),
        pages
    );

    ExtractedDocument {
        text,
        estimated_pages: pages,
        method: ExtractionMethod::MetadataOnlyFallback,
        success: true,
    }
}

pub fn estimate_pages(size_bytes: usize) -> u32 {
    (size_bytes / BYTES_PER_PAGE).max(1) as u32
}
