use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};

use std::net::Ipv6Addr;

const DEFAULT_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        let (host, port) = split_base_url(base_url)?;
        Ok(Self {
            client: Ollama::builder().host(host).port(port).build(),
            model,
        })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Split `scheme://host[:port]` into the host URL and port Ollama expects.
///
/// IPv6 hosts must be bracketed (`http://[::1]:11434`). Anything after the
/// port is rejected, as is any scheme other than http(s).
fn split_base_url(base_url: &str) -> Result<(String, u16)> {
    let invalid = |reason: &str| {
        AppError::Configuration(format!("Invalid Ollama base_url '{}': {}", base_url, reason))
    };

    let trimmed = base_url.trim().trim_end_matches('/');
    let (scheme, authority) = trimmed.split_once("://").unwrap_or(("http", trimmed));
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return Err(invalid("scheme must be http or https"));
    }
    if authority.contains(['/', '?', '#']) {
        return Err(invalid("expected scheme://host[:port] without a path"));
    }

    let (host, port) = if authority.starts_with('[') {
        let end = authority
            .find(']')
            .ok_or_else(|| invalid("unclosed '[' in IPv6 host"))?;
        let (host, rest) = authority.split_at(end + 1);
        if host[1..end].parse::<Ipv6Addr>().is_err() {
            return Err(invalid("malformed IPv6 address"));
        }
        match rest {
            "" => (host, None),
            _ => match rest.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => return Err(invalid("unexpected text after IPv6 host")),
            },
        }
    } else {
        if authority.matches(':').count() > 1 {
            return Err(invalid("IPv6 hosts must be enclosed in brackets"));
        }
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    let valid_name = host.starts_with('[')
        || host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if host.is_empty() || !valid_name {
        return Err(invalid("missing or malformed host"));
    }

    let port = match port {
        Some(port) => port.parse().map_err(|_| invalid("invalid port"))?,
        None => DEFAULT_PORT,
    };

    Ok((format!("{}://{}", scheme.to_ascii_lowercase(), host), port))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
