use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::models::config::{ClientConfig, Credentials};
use crate::models::error::{AppError, ClientError, ErrorBody};
use crate::models::image::{mime_for_path, ClothingSelection, EncodedImage, ImageResource};
use crate::services::classifier::classify;
use crate::services::encoder::encode;
use crate::services::gemini::GeminiClient;

/// How the gateway reaches the model.
#[derive(Clone)]
pub enum Route {
    /// POST to the proxy endpoint, which holds the credential.
    Proxy { endpoint: String },
    /// Call the model directly with a locally held credential.
    Direct { gemini: GeminiClient, credentials: Credentials },
}

/// Turns a person image and a clothing choice into a rendered try-on image.
#[derive(Clone)]
pub struct GenerationGateway {
    http: Client,
    route: Route,
    context: String,
}

impl GenerationGateway {
    pub fn new(route: Route, config: &ClientConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            route,
            context: config.context.clone(),
        }
    }

    pub fn proxy(config: &ClientConfig) -> Self {
        Self::new(
            Route::Proxy {
                endpoint: config.proxy_url.clone(),
            },
            config,
        )
    }

    /// Returns a `data:` URL for the generated image.
    pub async fn generate(
        &self,
        person: &ImageResource,
        clothing: &ClothingSelection,
    ) -> Result<String, ClientError> {
        let person_image = encode(person).await?;
        let clothing_image = match clothing {
            ClothingSelection::Uploaded(image) => encode(image).await?,
            ClothingSelection::GalleryReference { url, name } => {
                let fetched = self.fetch_gallery_image(url, name).await?;
                encode(&fetched).await?
            }
        };

        let image = match &self.route {
            Route::Proxy { endpoint } => self.post_to_proxy(endpoint, person_image, clothing_image).await?,
            Route::Direct { gemini, credentials } => {
                let api_key = credentials.resolve().ok_or_else(|| {
                    ClientError::from(AppError::MissingApiKey {
                        var: credential_label(credentials),
                    })
                })?;
                let response = gemini.try_on(&api_key, person_image, clothing_image).await?;
                classify(&response).into_image(&self.context)?
            }
        };

        if image.mime_type.is_empty() || image.data.is_empty() {
            return Err(ClientError::Transport {
                message: "Сервер вернул пустое изображение.".to_string(),
                code: None,
            });
        }
        Ok(image.data_url())
    }

    async fn fetch_gallery_image(&self, url: &str, name: &str) -> Result<ImageResource, ClientError> {
        info!(url = %url, "Fetching gallery outfit");

        let response = self.http.get(url).send().await.map_err(|e| ClientError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .or_else(|| mime_for_path(std::path::Path::new(url)).map(str::to_string));

        let bytes = response.bytes().await.map_err(|e| ClientError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ImageResource::from_bytes(name, mime_type, bytes.to_vec()))
    }

    async fn post_to_proxy(
        &self,
        endpoint: &str,
        person: EncodedImage,
        clothing: EncodedImage,
    ) -> Result<EncodedImage, ClientError> {
        info!(endpoint = %endpoint, "Sending try-on request to proxy");

        let body = serde_json::json!({
            "personImage": person,
            "clothingImage": clothing,
        });

        let response = self
            .http
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                message: format!("Не удалось связаться с сервером: {}", e),
                code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = response.json::<ErrorBody>().await.unwrap_or_else(|_| ErrorBody {
                error: format!(
                    "Сервер вернул ошибку {}. Пожалуйста, проверьте журнал серверной функции.",
                    status.as_u16()
                ),
                error_code: None,
            });
            warn!(status = status.as_u16(), code = ?error.error_code, "Proxy returned an error");
            return Err(ClientError::Transport {
                message: error.error,
                code: error.error_code,
            });
        }

        response.json::<EncodedImage>().await.map_err(|e| ClientError::Transport {
            message: format!("Некорректный ответ сервера: {}", e),
            code: None,
        })
    }
}

fn credential_label(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Env(var) => var.clone(),
        Credentials::Static(_) => "API_KEY".to_string(),
    }
}
