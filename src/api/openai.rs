use crate::config::Config;
use crate::script::{Script, ScriptSource, VideoRequest};
use crate::{logi, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiScriptSource {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiScriptSource {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.openai_api_key.clone(),
            model: cfg.openai_model.clone(),
        }
    }
}

pub fn build_prompt(request: &VideoRequest) -> String {
    let keywords = match request.keywords.as_deref().map(str::trim) {
        Some(k) if !k.is_empty() => format!("Include these keywords: {}.", k),
        _ => String::new(),
    };
    let instructions = match request.additional_instructions.as_deref().map(str::trim) {
        Some(i) if !i.is_empty() => format!("Additional instructions: {}", i),
        _ => String::new(),
    };

    format!(
        "Create an engaging script for a {} YouTube video about {}.\n{}\n{}\n\nThe script should include:\n1. An attention-grabbing intro\n2. Clear sections with logical flow\n3. A strong call to action at the end\n\nFormat the output as a JSON object with these properties:\n- title: A catchy title for the video\n- description: YouTube description with relevant hashtags\n- script: The full narration script\n- scenes: An array of scene objects, each containing:\n  - narration: What should be said in this scene\n  - visual_description: What should be shown visually\n  - duration: Approximate duration in seconds\n",
        request.video_type.content_length(),
        request.niche,
        keywords,
        instructions
    )
}

fn extract_message_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error message: {}", msg));
        }
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ScriptSource for OpenAiScriptSource {
    async fn generate(&self, request: &VideoRequest) -> Result<Script> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a professional YouTube script writer."},
                {"role": "user", "content": build_prompt(request)},
            ],
            "response_format": {"type": "json_object"},
        });

        logi(format!("Requesting OpenAI script ({}) for \"{}\"...", self.model, request.niche));
        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let snippet = raw.chars().take(800).collect::<String>();
            anyhow::bail!("OpenAI HTTP {}: {}", status.as_u16(), snippet);
        }

        let content = extract_message_content(&raw).context("OpenAI response parse failed")?;
        let script = Script::from_json(&content)?;
        logi(format!(
            "OpenAI script received: \"{}\" ({} scenes)",
            script.title,
            script.scenes.len()
        ));
        Ok(script)
    }
}
