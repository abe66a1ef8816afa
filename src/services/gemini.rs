use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::models::config::AppConfig;
use crate::models::error::AppError;
use crate::models::gemini::{
    ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig, RequestContent,
    RequestPart,
};
use crate::models::image::EncodedImage;

pub const TRY_ON_PROMPT: &str = r#"You are an expert virtual stylist AI. Your task is to perform a high-fidelity virtual try-on, replacing the person's current outfit with a new one.

**INPUT:**
- Image 1: A photo of a person wearing an article of clothing.
- Image 2: A photo of a single clothing item.

**INSTRUCTIONS:**
1.  **Analyze Person:** Identify the person's pose, body shape, and the lighting in Image 1.
2.  **Isolate New Clothing:** Precisely isolate the clothing item from Image 2, ignoring any background or mannequins.
3.  **Replace and Fit:** You MUST COMPLETELY REMOVE the primary clothing item (e.g., shirt, jacket, dress) the person is currently wearing in Image 1. Then, realistically place and drape the new clothing item from Image 2 onto the person.
    - The new clothing must conform to the person's body contours, pose, and posture naturally.
    - Create realistic wrinkles, folds, and shadows on the new clothing that are consistent with the person's pose and the lighting from Image 1.
4.  **Preserve Identity & Background:** CRITICAL - The person's original head, face, hair, skin tone, and any visible body parts (like hands or legs) not covered by the new clothing MUST remain completely unchanged from Image 1. The background from Image 1 must also be fully preserved.
5.  **Seamless Integration:** Ensure the final image is photorealistic and seamless. The lighting on the new clothing should match the ambient lighting of Image 1 perfectly.

**OUTPUT:**
- Return ONLY the final, edited image. Do not include any text, explanations, or additional content in your response."#;

/// Thin client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends both images plus the try-on instruction. One call, no retry.
    pub async fn try_on(
        &self,
        api_key: &str,
        person: EncodedImage,
        clothing: EncodedImage,
    ) -> Result<GenerateContentResponse, AppError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        info!(
            model = %self.model,
            person_mime = %person.mime_type,
            person_bytes = person.data.len(),
            clothing_mime = %clothing.mime_type,
            clothing_bytes = clothing.data.len(),
            "Sending try-on request to Gemini"
        );

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::InlineData { inline_data: person },
                    RequestPart::InlineData { inline_data: clothing },
                    RequestPart::Text { text: TRY_ON_PROMPT.to_string() },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("Gemini API error {}: {}", status, body));
            warn!(status = status.as_u16(), "Gemini returned an error");
            return Err(AppError::translate_upstream(message));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Gemini response: {}", e)))
    }
}
