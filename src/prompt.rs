//! Composición de prompts para el servicio de IA.
//!
//! Hay tres familias de plantillas (CSV / PDF / genérica) elegidas por el
//! tipo de documento. Todas embeben el texto extraído completo tal cual:
//! no hay truncado ni troceado, así que un PDF enorme genera una petición
//! enorme (hueco conocido, documentado en DESIGN.md).

use crate::models::{MediaType, PromptEnvelope};

/// Pregunta que se usa cuando el usuario no formuló ninguna.
pub const DEFAULT_QUESTION: &str =
    "Proporciona un análisis general con los puntos más relevantes del documento.";

/// Instrucción fija de formato: cinco secciones etiquetadas, con encabezados
/// y viñetas.
const SECTION_INSTRUCTION: &str = "\
Estructura tu respuesta en exactamente cinco secciones, cada una con su \
encabezado y viñetas:

## Resumen general
## Puntos clave
## Estadísticas y hallazgos
## Recomendaciones
## Preguntas de seguimiento";

const CSV_SYSTEM: &str = "\
Eres un analista de datos experto. Recibirás el contenido de un fichero CSV \
de un panel de gestión de proyectos y una pregunta del usuario. Analiza las \
columnas, detecta tendencias y anomalías, y responde en español de forma \
clara y concisa.";

const PDF_SYSTEM: &str = "\
Eres un analista documental experto. Recibirás el texto extraído de un PDF \
de un panel de gestión de proyectos y una pregunta del usuario. Identifica \
el asunto central y los hechos clave del documento completo, no solo de la \
introducción, y responde en español de forma clara y concisa.";

const GENERIC_SYSTEM: &str = "\
Eres un asistente de análisis documental. Recibirás el contenido de un \
documento y una pregunta del usuario. Responde en español de forma clara y \
concisa usando únicamente la información suministrada.";

/// Instrucción de sistema para el chat libre del panel (sin documento).
const CHAT_SYSTEM: &str = "\
Eres el asistente del panel de gestión de proyectos. Respondes en español, \
de forma breve y útil. Si no tienes información suficiente, dilo \
explícitamente y sugiere qué documento subir.";

/// Compone el prompt de análisis de documento.
///
/// El texto extraído se embebe literal; la pregunta del usuario se sustituye
/// por [`DEFAULT_QUESTION`] si llegó vacía.
pub fn build_prompt(
    text: &str,
    question: Option<&str>,
    file_name: &str,
    media_type: MediaType,
) -> PromptEnvelope {
    let system = match media_type {
        MediaType::Csv => CSV_SYSTEM,
        MediaType::Pdf => PDF_SYSTEM,
        MediaType::Other => GENERIC_SYSTEM,
    };

    let question = match question.map(str::trim) {
        Some(q) if !q.is_empty() => q,
        _ => DEFAULT_QUESTION,
    };

    let user = format!(
        "Documento: {file_name} (tipo: {})\n\n\
         Contenido del documento:\n{text}\n\n\
         Pregunta del usuario:\n{question}\n\n\
         {SECTION_INSTRUCTION}",
        media_type.label()
    );

    PromptEnvelope {
        system: system.to_string(),
        user,
    }
}

/// Compone el prompt del endpoint de chat. El contexto opcional (por ejemplo,
/// un resumen de la conversación previa) se añade a la instrucción de sistema.
pub fn build_chat_prompt(message: &str, context: Option<&str>) -> PromptEnvelope {
    let system = match context.map(str::trim) {
        Some(ctx) if !ctx.is_empty() => {
            format!("{CHAT_SYSTEM}\n\nContexto de la conversación:\n{ctx}")
        }
        _ => CHAT_SYSTEM.to_string(),
    };

    PromptEnvelope {
        system,
        user: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_text_question_and_file_name_verbatim() {
        let csv = "Name,Score\nA,1\nB,2";
        let envelope = build_prompt(csv, Some("summarize"), "scores.csv", MediaType::Csv);
        assert!(envelope.user.contains(csv));
        assert!(envelope.user.contains("summarize"));
        assert!(envelope.user.contains("scores.csv"));
    }

    #[test]
    fn template_family_follows_media_type() {
        let csv = build_prompt("x", None, "a.csv", MediaType::Csv);
        let pdf = build_prompt("x", None, "a.pdf", MediaType::Pdf);
        let generic = build_prompt("x", None, "a.bin", MediaType::Other);
        assert!(csv.system.contains("CSV"));
        assert!(pdf.system.contains("PDF"));
        assert_ne!(generic.system, csv.system);
        assert_ne!(generic.system, pdf.system);
    }

    #[test]
    fn empty_question_falls_back_to_default() {
        let envelope = build_prompt("x", Some("   "), "a.csv", MediaType::Csv);
        assert!(envelope.user.contains(DEFAULT_QUESTION));
    }

    #[test]
    fn requests_the_five_labeled_sections() {
        let envelope = build_prompt("x", None, "a.pdf", MediaType::Pdf);
        for heading in [
            "Resumen general",
            "Puntos clave",
            "Estadísticas y hallazgos",
            "Recomendaciones",
            "Preguntas de seguimiento",
        ] {
            assert!(envelope.user.contains(heading), "falta la sección {heading}");
        }
    }

    #[test]
    fn chat_prompt_folds_context_into_system() {
        let plain = build_chat_prompt("hola", None);
        let with_ctx = build_chat_prompt("hola", Some("el usuario subió gastos.csv"));
        assert_eq!(plain.user, "hola");
        assert!(!plain.system.contains("gastos.csv"));
        assert!(with_ctx.system.contains("gastos.csv"));
    }
}
