use crate::analysis::{
    build_user_prompt, prepare_prompt_context, NarrativeService, TokenSink, EMPTY_RESPONSE,
    SYSTEM_PROMPT,
};
use crate::config::toml_config::AnalysisConfig;
use crate::domain::model::Astrolabe;
use crate::utils::error::{ChartError, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

fn analysis_error(message: impl Into<String>) -> ChartError {
    ChartError::Analysis {
        message: message.into(),
    }
}

/// OpenAI 相容的 chat completions 端點。
#[derive(Debug, Clone)]
pub struct OpenAiNarrator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    timeout: Option<Duration>,
}

impl OpenAiNarrator {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.6,
            timeout: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let api_key = config.resolved_api_key().ok_or_else(|| ChartError::MissingConfig {
            field: "analysis.api_key (or OPENAI_API_KEY)".to_string(),
        })?;

        let mut narrator = Self::new(config.endpoint.clone(), api_key, config.model.clone())
            .with_temperature(config.temperature);
        if let Some(seconds) = config.timeout_seconds {
            narrator = narrator.with_timeout(Duration::from_secs(seconds));
        }
        Ok(narrator)
    }

    fn request_body(&self, astrolabe: &Astrolabe, stream: bool) -> Value {
        let context = prepare_prompt_context(astrolabe);
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "stream": stream,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_user_prompt(&context) },
            ],
        })
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("📡 POST {} (model {})", self.endpoint, self.model);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(analysis_error(format!(
                "OpenAI request failed: {} {}",
                status.as_u16(),
                detail
            )));
        }
        Ok(response)
    }
}

/// Handles one server-sent-events line. Returns `true` on `[DONE]`.
fn handle_sse_line(line: &str, sink: &mut dyn TokenSink) -> Result<bool> {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return Ok(false);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(false);
    }
    if data == "[DONE]" {
        return Ok(true);
    }

    let event: Value = serde_json::from_str(data)
        .map_err(|e| analysis_error(format!("stream parse error: {}", e)))?;
    let delta = &event["choices"][0]["delta"];
    if let Some(reasoning) = delta["reasoning_content"].as_str().filter(|s| !s.is_empty()) {
        sink.on_reasoning_token(reasoning);
    }
    if let Some(content) = delta["content"].as_str().filter(|s| !s.is_empty()) {
        sink.on_token(content);
    }
    Ok(false)
}

#[async_trait::async_trait]
impl NarrativeService for OpenAiNarrator {
    async fn analyze(&self, astrolabe: &Astrolabe) -> Result<String> {
        let response = self.send(&self.request_body(astrolabe, false)).await?;
        let data: Value = response
            .json()
            .await
            .map_err(|e| analysis_error(format!("invalid response body: {}", e)))?;

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();
        if content.is_empty() {
            tracing::warn!("Narrative service returned an empty message");
            return Ok(EMPTY_RESPONSE.to_string());
        }
        Ok(content.to_string())
    }

    async fn analyze_stream(&self, astrolabe: &Astrolabe, sink: &mut dyn TokenSink) -> Result<()> {
        let mut response = self.send(&self.request_body(astrolabe, true)).await?;
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);
            // 只處理完整的行，避免切斷多位元組字元
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if handle_sse_line(&String::from_utf8_lossy(&line), sink)? {
                    return Ok(());
                }
            }
        }

        if !buffer.is_empty() {
            handle_sse_line(&String::from_utf8_lossy(&buffer), sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CollectingSink;

    #[test]
    fn test_sse_line_routes_channels() {
        let mut sink = CollectingSink::default();
        let done = handle_sse_line(
            r#"data: {"choices":[{"delta":{"reasoning_content":"想","content":"命"}}]}"#,
            &mut sink,
        )
        .unwrap();
        assert!(!done);
        assert_eq!(sink.content, "命");
        assert_eq!(sink.reasoning, "想");
    }

    #[test]
    fn test_sse_line_done_and_noise() {
        let mut sink = CollectingSink::default();
        assert!(handle_sse_line("data: [DONE]", &mut sink).unwrap());
        assert!(!handle_sse_line(": keep-alive", &mut sink).unwrap());
        assert!(!handle_sse_line("", &mut sink).unwrap());
        assert!(sink.content.is_empty());
    }

    #[test]
    fn test_sse_line_parse_error() {
        let mut sink = CollectingSink::default();
        let err = handle_sse_line("data: {not json", &mut sink).unwrap_err();
        assert!(matches!(err, ChartError::Analysis { .. }));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = AnalysisConfig {
            api_key: Some("${UNSET_ZIWEI_TEST_KEY}".to_string()),
            ..AnalysisConfig::default()
        };
        if std::env::var("OPENAI_API_KEY").is_err() && std::env::var("API_KEY").is_err() {
            assert!(matches!(
                OpenAiNarrator::from_config(&config),
                Err(ChartError::MissingConfig { .. })
            ));
        }
    }
}
