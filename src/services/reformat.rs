use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ServiceError, check_response, http_client};
use crate::extraction::TextRefiner;
use crate::settings::ReformatSettings;

pub const REFORMAT_INSTRUCTION: &str = "The following text was extracted from a PDF. \
Remove line breaks and spaces that were introduced by the page layout, keep real paragraph \
breaks, do not change the wording, and reply with the cleaned text only.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Cleans up extracted text through an OpenAI-compatible chat endpoint
pub struct ChatReformatter {
    settings: ReformatSettings,
    client: Client,
}

impl ChatReformatter {
    /// `None` unless refinement is switched on and has a key
    pub fn from_settings(settings: &ReformatSettings) -> Result<Option<Self>, ServiceError> {
        if !settings.is_active() {
            return Ok(None);
        }
        Ok(Some(Self {
            client: http_client(settings.timeout_secs)?,
            settings: settings.clone(),
        }))
    }
}

impl TextRefiner for ChatReformatter {
    fn refine(&self, text: &str) -> Result<String, ServiceError> {
        let api_key = self
            .settings
            .api_key()
            .ok_or_else(|| ServiceError::NotConfigured("reformat.api_key is not set".into()))?;
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: REFORMAT_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()?;
        let body = check_response(response)?.text()?;
        let cleaned = parse_reply(&body)?;
        debug!(
            "Reformatted {} chars into {}",
            text.chars().count(),
            cleaned.chars().count()
        );
        Ok(cleaned)
    }
}

fn parse_reply(body: &str) -> Result<String, ServiceError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ServiceError::Malformed("empty completion".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> ReformatSettings {
        ReformatSettings {
            enabled: true,
            api_key: Some("sk-test".into()),
            endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
            timeout_secs: 2,
            ..ReformatSettings::default()
        }
    }

    #[test]
    fn inactive_settings_give_no_reformatter() {
        assert!(
            ChatReformatter::from_settings(&ReformatSettings::default())
                .unwrap()
                .is_none()
        );
        let no_key = ReformatSettings {
            api_key: None,
            ..active()
        };
        assert!(ChatReformatter::from_settings(&no_key).unwrap().is_none());
    }

    #[test]
    fn parses_completion() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  Clean text.\n"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Clean text.");
    }

    #[test]
    fn empty_completion_is_malformed() {
        assert!(parse_reply(r#"{"choices":[]}"#).is_err());
        assert!(parse_reply(r#"{"choices":[{"message":{"content":null}}]}"#).is_err());
        assert!(parse_reply(r#"{"choices":[{"message":{"content":"  "}}]}"#).is_err());
    }

    #[test]
    fn unreachable_endpoint_is_an_error() {
        let reformatter = ChatReformatter::from_settings(&active()).unwrap().unwrap();
        assert!(matches!(
            reformatter.refine("some text"),
            Err(ServiceError::Http(_))
        ));
    }
}
