//! Extracción heurística de sugerencias a partir de la respuesta cruda del
//! modelo.
//!
//! Históricamente el sistema tuvo dos variantes con políticas ligeramente
//! distintas según el punto de entrada. Se conservan como dos estrategias con
//! nombre que elige el llamante, no se unifican:
//!
//! - [`SuggestionPolicy::Bulleted`]: viñetas y listas numeradas, máximo 5;
//!   si no hay ninguna, frases de más de 20 caracteres, máximo 3.
//! - [`SuggestionPolicy::LeadingSentences`]: las tres primeras frases no
//!   vacías, sin filtro de longitud.
//!
//! Ambas son puras y deterministas: misma entrada, misma salida.

/// Estrategia de extracción elegida por el punto de entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionPolicy {
    Bulleted,
    LeadingSentences,
}

/// Tope duro de sugerencias por respuesta.
pub const MAX_SUGGESTIONS: usize = 5;
/// Tope de la ruta de respaldo basada en frases.
const MAX_FALLBACK_SENTENCES: usize = 3;
/// Longitud mínima (ya recortada) para que una frase cuente como sugerencia.
const MIN_SENTENCE_LEN: usize = 20;

pub fn extract_suggestions(raw_text: &str, policy: SuggestionPolicy) -> Vec<String> {
    match policy {
        SuggestionPolicy::Bulleted => bulleted(raw_text),
        SuggestionPolicy::LeadingSentences => leading_sentences(raw_text),
    }
}

fn bulleted(raw_text: &str) -> Vec<String> {
    let items: Vec<String> = raw_text
        .lines()
        .filter_map(strip_list_marker)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .take(MAX_SUGGESTIONS)
        .collect();

    if !items.is_empty() {
        return items;
    }

    // Sin viñetas ni numeración: nos quedamos con las frases sustanciales.
    sentences(raw_text)
        .filter(|s| s.len() > MIN_SENTENCE_LEN)
        .map(str::to_string)
        .take(MAX_FALLBACK_SENTENCES)
        .collect()
}

fn leading_sentences(raw_text: &str) -> Vec<String> {
    sentences(raw_text)
        .map(str::to_string)
        .take(MAX_FALLBACK_SENTENCES)
        .collect()
}

/// Reconoce `- texto`, `• texto`, `* texto` y `N. texto`. El marcador debe ir
/// seguido de un espacio para no confundirlo con énfasis Markdown (`**...**`)
/// o con números decimales.
fn strip_list_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();

    for marker in ['-', '•', '*'] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            if rest.starts_with(char::is_whitespace) {
                return Some(rest.trim());
            }
        }
    }

    let digits_end = trimmed.find(|c: char| !c.is_ascii_digit())?;
    if digits_end > 0 {
        let rest = &trimmed[digits_end..];
        if let Some(rest) = rest.strip_prefix('.') {
            if rest.starts_with(char::is_whitespace) {
                return Some(rest.trim());
            }
        }
    }

    None
}

fn sentences(raw_text: &str) -> impl Iterator<Item = &str> {
    raw_text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_and_numbers_are_recognized_in_order() {
        let raw = "- A\n- B\n1. C";
        assert_eq!(
            extract_suggestions(raw, SuggestionPolicy::Bulleted),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn all_marker_variants_are_stripped() {
        let raw = "• Revisa el presupuesto\n* Habla con el equipo\n12. Planifica el sprint";
        assert_eq!(
            extract_suggestions(raw, SuggestionPolicy::Bulleted),
            vec![
                "Revisa el presupuesto",
                "Habla con el equipo",
                "Planifica el sprint"
            ]
        );
    }

    #[test]
    fn markdown_emphasis_is_not_a_bullet() {
        let raw = "**Resumen general**\n- Único punto real";
        assert_eq!(
            extract_suggestions(raw, SuggestionPolicy::Bulleted),
            vec!["Único punto real"]
        );
    }

    #[test]
    fn never_more_than_five() {
        let raw = "- a\n- b\n- c\n- d\n- e\n- f\n- g";
        let got = extract_suggestions(raw, SuggestionPolicy::Bulleted);
        assert_eq!(got.len(), MAX_SUGGESTIONS);
        assert_eq!(got, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn sentence_fallback_keeps_three_long_sentences() {
        // Cuatro frases de más de 20 caracteres, sin viñetas: deben quedar
        // exactamente tres, recortadas y sin la puntuación final.
        let raw = "La primera frase es bastante larga. La segunda también lo es sin duda! \
                   La tercera frase supera el umbral? La cuarta frase igualmente lo supera.";
        let got = extract_suggestions(raw, SuggestionPolicy::Bulleted);
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], "La primera frase es bastante larga");
        assert!(got.iter().all(|s| !s.ends_with(['.', '!', '?'])));
    }

    #[test]
    fn sentence_fallback_filters_short_sentences() {
        let raw = "Corta. Esta frase sí que supera los veinte caracteres. No.";
        assert_eq!(
            extract_suggestions(raw, SuggestionPolicy::Bulleted),
            vec!["Esta frase sí que supera los veinte caracteres"]
        );
    }

    #[test]
    fn leading_sentences_takes_first_three_without_length_filter() {
        let raw = "Uno. Dos. Tres. Cuatro.";
        assert_eq!(
            extract_suggestions(raw, SuggestionPolicy::LeadingSentences),
            vec!["Uno", "Dos", "Tres"]
        );
    }

    #[test]
    fn is_idempotent() {
        let raw = "- A\ntexto suelto\n2. B";
        let first = extract_suggestions(raw, SuggestionPolicy::Bulleted);
        let second = extract_suggestions(raw, SuggestionPolicy::Bulleted);
        assert_eq!(first, second);
        assert_eq!(first, vec!["A", "B"]);
    }

    #[test]
    fn empty_input_yields_no_suggestions() {
        assert!(extract_suggestions("", SuggestionPolicy::Bulleted).is_empty());
        assert!(extract_suggestions("   \n ", SuggestionPolicy::LeadingSentences).is_empty());
    }
}
