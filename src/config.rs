//! Carga y gestión de configuración de la aplicación (servidor + servicio de IA).
//!
//! La configuración se construye una sola vez al arrancar y se inyecta en los
//! componentes; la lógica de negocio nunca lee variables de entorno por su
//! cuenta. Los valores numéricos fuera de rango no son fatales: se sustituyen
//! por el valor por defecto dejando un aviso en el log.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::warn;

/// Backend de chat-completion compatible con la API de OpenAI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AiProvider {
    OpenAI,
    DeepSeek,
    Ollama,
}

impl AiProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "deepseek" => Ok(Self::DeepSeek),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Proveedor de IA no soportado: {other}")),
        }
    }

    /// URL base por defecto de cada proveedor.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com",
            Self::DeepSeek => "https://api.deepseek.com",
            Self::Ollama => "http://localhost:11434",
        }
    }

    /// Modelo de chat por defecto de cada proveedor.
    pub fn default_chat_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
            Self::Ollama => "llama3.2",
        }
    }

    /// Ollama corre en local y no exige credenciales.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    pub ai_provider: AiProvider,
    pub ai_api_base: String,
    pub ai_api_key: String,
    pub ai_chat_model: String,

    /// Timeout de cada llamada al servicio de IA, en milisegundos.
    pub ai_timeout_ms: u64,
    pub ai_max_tokens: u32,
    pub ai_temperature: f32,
    pub ai_top_p: f32,
}

pub const DEFAULT_TIMEOUT_MS: u64 = 25_000;
pub const DEFAULT_MAX_TOKENS: u32 = 2_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 1.0;

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3344".to_string());

        let provider_str = env::var("AI_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let ai_provider = AiProvider::from_str(&provider_str)?;

        let ai_api_key = env::var("AI_API_KEY").unwrap_or_default();
        if ai_api_key.is_empty() && ai_provider.requires_api_key() {
            return Err(anyhow!(
                "Falta AI_API_KEY en el entorno (obligatoria para el proveedor {provider_str})"
            ));
        }

        let ai_api_base = env::var("AI_API_BASE")
            .unwrap_or_else(|_| ai_provider.default_api_base().to_string())
            .trim_end_matches('/')
            .to_string();
        let ai_chat_model = env::var("AI_CHAT_MODEL")
            .unwrap_or_else(|_| ai_provider.default_chat_model().to_string());

        let ai_timeout_ms =
            env_in_range("AI_TIMEOUT_MS", DEFAULT_TIMEOUT_MS, 1_000, 60_000);
        let ai_max_tokens = env_in_range("AI_MAX_TOKENS", DEFAULT_MAX_TOKENS, 100, 4_000);
        let ai_temperature =
            env_in_range("AI_TEMPERATURE", DEFAULT_TEMPERATURE, 0.0, 2.0);
        let ai_top_p = env_in_range("AI_TOP_P", DEFAULT_TOP_P, 0.0, 1.0);

        Ok(Self {
            server_addr,
            ai_provider,
            ai_api_base,
            ai_api_key,
            ai_chat_model,
            ai_timeout_ms,
            ai_max_tokens,
            ai_temperature,
            ai_top_p,
        })
    }

    /// Configuración fija para tests, sin tocar el entorno del proceso.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            ai_provider: AiProvider::Ollama,
            ai_api_base: "http://localhost:11434".to_string(),
            ai_api_key: String::new(),
            ai_chat_model: "modelo-de-prueba".to_string(),
            ai_timeout_ms: DEFAULT_TIMEOUT_MS,
            ai_max_tokens: DEFAULT_MAX_TOKENS,
            ai_temperature: DEFAULT_TEMPERATURE,
            ai_top_p: DEFAULT_TOP_P,
        }
    }
}

/// Lee una variable numérica del entorno. Si no existe se usa el valor por
/// defecto en silencio; si no parsea o queda fuera de rango, también, pero
/// dejando constancia en el log.
fn env_in_range<T>(name: &str, default: T, min: T, max: T) -> T
where
    T: FromStr + PartialOrd + Copy + Display,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) if v >= min && v <= max => v,
        Ok(v) => {
            warn!(
                "{name}={v} fuera de rango [{min}, {max}]; se usa el valor por defecto {default}"
            );
            default
        }
        Err(_) => {
            warn!("{name}={raw:?} no es un número válido; se usa el valor por defecto {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Los tests de env_in_range fijan variables de proceso; se usan nombres
    // únicos por test para que puedan correr en paralelo.

    #[test]
    fn missing_var_uses_default() {
        assert_eq!(env_in_range("CFG_TEST_MISSING", 25_000u64, 1_000, 60_000), 25_000);
    }

    #[test]
    fn out_of_range_falls_back_to_default() {
        env::set_var("CFG_TEST_RANGE", "999999");
        assert_eq!(env_in_range("CFG_TEST_RANGE", 25_000u64, 1_000, 60_000), 25_000);
        env::remove_var("CFG_TEST_RANGE");
    }

    #[test]
    fn unparseable_falls_back_to_default() {
        env::set_var("CFG_TEST_PARSE", "mucho");
        assert_eq!(env_in_range("CFG_TEST_PARSE", 0.7f32, 0.0, 2.0), 0.7);
        env::remove_var("CFG_TEST_PARSE");
    }

    #[test]
    fn in_range_value_is_kept() {
        env::set_var("CFG_TEST_OK", "1.5");
        assert_eq!(env_in_range("CFG_TEST_OK", 0.7f32, 0.0, 2.0), 1.5);
        env::remove_var("CFG_TEST_OK");
    }

    #[test]
    fn provider_parsing() {
        assert_eq!(AiProvider::from_str("OpenAI").unwrap(), AiProvider::OpenAI);
        assert_eq!(AiProvider::from_str("deepseek").unwrap(), AiProvider::DeepSeek);
        assert!(AiProvider::from_str("gemini").is_err());
    }

    #[test]
    fn provider_defaults() {
        assert!(AiProvider::OpenAI.requires_api_key());
        assert!(!AiProvider::Ollama.requires_api_key());
        assert_eq!(AiProvider::DeepSeek.default_chat_model(), "deepseek-chat");
    }
}
