use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ServiceError, check_response, choose_target, http_client};
use crate::settings::TranslationSettings;

pub const NOT_CONFIGURED_MESSAGE: &str = "Translation is not configured. Set translation.api_key \
in config.json (`readhelper config init` creates one with defaults).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Source language reported by the service
    pub source_lang: String,
    pub target_lang: String,
    pub text: String,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<TranslatedText>,
}

#[derive(Deserialize)]
struct TranslatedText {
    #[serde(default)]
    detected_source_language: String,
    text: String,
}

/// DeepL-compatible translation client
pub struct Translator {
    settings: TranslationSettings,
    client: Option<Client>,
}

impl Translator {
    pub fn new(settings: TranslationSettings) -> Self {
        Self {
            settings,
            client: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key().is_some()
    }

    /// Target language this text would be translated into
    pub fn target_for<'a>(&'a self, text: &str) -> &'a str {
        choose_target(
            text,
            &self.settings.default_target,
            &self.settings.alternate_target,
        )
    }

    pub fn translate(&mut self, text: &str) -> Result<Translation, ServiceError> {
        let Some(api_key) = self.settings.api_key().map(str::to_string) else {
            return Err(ServiceError::NotConfigured(NOT_CONFIGURED_MESSAGE.to_string()));
        };
        let target = self.target_for(text).to_string();

        let client = match self.client.take() {
            Some(client) => client,
            None => http_client(self.settings.timeout_secs)?,
        };
        let result = self.send(&client, &api_key, text, &target);
        self.client = Some(client);
        result
    }

    fn send(
        &self,
        client: &Client,
        api_key: &str,
        text: &str,
        target: &str,
    ) -> Result<Translation, ServiceError> {
        info!("Translating {} chars to {target}", text.chars().count());
        let response = client
            .post(&self.settings.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {api_key}"))
            .json(&TranslateRequest {
                text: [text],
                target_lang: target,
            })
            .send()?;
        let body = check_response(response)?.text()?;
        let translation = parse_translation(&body, target)?;
        debug!(
            "Translation done, detected source {}",
            translation.source_lang
        );
        Ok(translation)
    }
}

fn parse_translation(body: &str, target: &str) -> Result<Translation, ServiceError> {
    let response: TranslateResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let first = response
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Malformed("no translations in response".to_string()))?;
    Ok(Translation {
        source_lang: first.detected_source_language,
        target_lang: target.to_string(),
        text: first.text,
    })
}
