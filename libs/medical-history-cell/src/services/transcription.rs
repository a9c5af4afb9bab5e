use anyhow::{Result, anyhow};
use reqwest::{Client, header, multipart};
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{TranscriptionResult, EnhanceTextRequest};

/// Talks to the external voice-transcription and text-enhancement
/// endpoints. Failures surface as plain error strings and leave the
/// caller's form state untouched.
pub struct TranscriptionService {
    api_url: String,
    api_key: String,
    http_client: Client,
}

impl TranscriptionService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if !config.is_transcription_configured() {
            return Err(anyhow!("Transcription service is not configured"));
        }

        Ok(Self {
            api_url: config.transcription_api_url.clone(),
            api_key: config.transcription_api_key.clone(),
            http_client: Client::new(),
        })
    }

    /// Multipart audio + client name in, structured follow-up fields out.
    pub async fn transcribe_audio(
        &self,
        audio_bytes: Vec<u8>,
        file_name: String,
        client_name: &str,
    ) -> Result<TranscriptionResult> {
        debug!("Transcribing audio note for client: {}", client_name);

        let part = multipart::Part::bytes(audio_bytes)
            .file_name(file_name)
            .mime_str("audio/webm")?;

        let form = multipart::Form::new()
            .part("audio", part)
            .text("clientName", client_name.to_string());

        let url = format!("{}/transcribe", self.api_url);
        let response = self.http_client.post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Transcription error ({}): {}", status, error_text);
            return Err(anyhow!("Transcription failed: {}", error_text));
        }

        let result: TranscriptionResult = response.json().await?;
        Ok(result)
    }

    /// Sends draft follow-up text for AI cleanup, returning improved
    /// fields with the same shape.
    pub async fn enhance_text(
        &self,
        request: EnhanceTextRequest,
    ) -> Result<TranscriptionResult> {
        debug!("Enhancing follow-up text for client: {}", request.client_name);

        let body = serde_json::json!({
            "description": request.description,
            "recommendations": request.recommendations,
            "followUpType": request.follow_up_type,
            "clientName": request.client_name
        });

        let url = format!("{}/enhance", self.api_url);
        let response = self.http_client.post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Enhancement error ({}): {}", status, error_text);
            return Err(anyhow!("Text enhancement failed: {}", error_text));
        }

        let value: Value = response.json().await?;
        let result: TranscriptionResult = serde_json::from_value(value)?;
        Ok(result)
    }
}
