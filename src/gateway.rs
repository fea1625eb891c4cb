//! Cliente del servicio externo de chat-completion (compatible con la API de
//! OpenAI).
//!
//! Cada llamada es exactamente una petición HTTP: sin reintentos, sin
//! streaming, sin circuit breaker. El fallo siempre se devuelve tipado al
//! llamante; la decisión de exponerlo o enmascararlo es de la capa de API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::models::{ChatReply, PromptEnvelope};

/// Puerto del servicio de IA. El gateway real habla HTTP; los tests usan un
/// doble que cuenta llamadas.
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    /// Envía un prompt y devuelve la respuesta cruda del modelo.
    async fn complete(&self, envelope: &PromptEnvelope) -> Result<ChatReply, PipelineError>;

    /// Identificador del modelo que atiende las peticiones.
    fn model(&self) -> &str;

    /// Llamada de diagnóstico: prompt trivial, respuesta recortada.
    async fn probe(&self) -> Result<String, PipelineError> {
        let envelope = PromptEnvelope {
            system: "Eres un servicio de diagnóstico.".to_string(),
            user: "Responde únicamente: ok".to_string(),
        };
        let reply = self.complete(&envelope).await?;
        Ok(reply.raw_text.trim().to_string())
    }
}

/// Cliente HTTP contra `{base}/v1/chat/completions`.
pub struct AiGateway {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

// --- Formato de cable de la API de chat-completion ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl AiGateway {
    /// Construye el gateway a partir de la configuración. El timeout se fija
    /// a nivel de cliente: una llamada que lo supere falla como
    /// `UpstreamUnavailable` en vez de quedarse colgada.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.ai_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            api_base: cfg.ai_api_base.clone(),
            api_key: cfg.ai_api_key.clone(),
            model: cfg.ai_chat_model.clone(),
            temperature: cfg.ai_temperature,
            max_tokens: cfg.ai_max_tokens,
            top_p: cfg.ai_top_p,
        })
    }
}

#[async_trait]
impl ChatCompletions for AiGateway {
    async fn complete(&self, envelope: &PromptEnvelope) -> Result<ChatReply, PipelineError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: &envelope.system,
                },
                ChatTurn {
                    role: "user",
                    content: &envelope.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            stream: false,
        };

        let url = format!("{}/v1/chat/completions", self.api_base);
        debug!(model = %self.model, prompt_chars = envelope.user.len(), "Llamando al servicio de IA");

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PipelineError::UpstreamAuth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::UpstreamRejected {
                status: status.as_u16(),
                body: truncate_for_log(&body),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::MalformedResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(PipelineError::MalformedResponse(
                "la respuesta no contiene choices[0].message.content".to_string(),
            ));
        }

        Ok(ChatReply { raw_text: content })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Los cuerpos de error de algunos proveedores son páginas HTML enteras; para
/// el mensaje nos basta con el principio.
fn truncate_for_log(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn gateway_is_built_from_config() {
        let cfg = AppConfig::for_tests();
        let gateway = AiGateway::from_config(&cfg).unwrap();
        assert_eq!(gateway.model(), "modelo-de-prueba");
        assert_eq!(gateway.api_base, "http://localhost:11434");
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let short = truncate_for_log(&body);
        assert!(short.chars().count() <= 301);
        assert!(short.ends_with('…'));
        assert_eq!(truncate_for_log("breve"), "breve");
    }
}
