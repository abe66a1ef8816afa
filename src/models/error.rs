use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::outcome::ModelRejection;

/// Machine-readable code for a server without a model credential.
pub const MISSING_API_KEY: &str = "MISSING_API_KEY";

/// Error payload relayed by the proxy endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Server-side failures of the proxy endpoint.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Empty request body")]
    EmptyBody,

    #[error("Request body is missing images")]
    MissingImages,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Model credential is not configured (env {var})")]
    MissingApiKey { var: String },

    #[error("Model credential was rejected")]
    InvalidApiKey,

    #[error(transparent)]
    Model(#[from] ModelRejection),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    /// Rewrites known upstream failures into targeted guidance.
    pub fn translate_upstream(message: String) -> Self {
        if message.contains("API key not valid") {
            return AppError::InvalidApiKey;
        }
        if message.contains("did not match the expected pattern") {
            return AppError::Upstream(
                "Произошла ошибка при обработке одного из изображений. Пожалуйста, попробуйте использовать другое фото с хорошим освещением и четким фокусом, где объект хорошо виден."
                    .to_string(),
            );
        }
        AppError::Upstream(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::EmptyBody | AppError::MissingImages | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::MissingApiKey { .. } | AppError::Model(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            AppError::MissingApiKey { .. } => Some(MISSING_API_KEY),
            _ => None,
        }
    }

    /// Localized message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MethodNotAllowed => "Method Not Allowed".to_string(),
            AppError::EmptyBody => "Пустое тело запроса.".to_string(),
            AppError::MissingImages => "Отсутствуют изображения в запросе.".to_string(),
            AppError::InvalidBody(detail) => format!("Некорректное тело запроса: {}", detail),
            AppError::MissingApiKey { var } => format!(
                "Ошибка конфигурации сервера: переменная окружения {var} не найдена. Убедитесь, что в окружении сервера задана переменная с именем ровно '{var}' и вашим ключом в качестве значения, а затем перезапустите сервер."
            ),
            AppError::InvalidApiKey => {
                "API-ключ недействителен. Пожалуйста, проверьте ключ в переменных окружения сервера.".to_string()
            }
            AppError::Model(rejection) => rejection.message.clone(),
            AppError::Upstream(detail) => detail.clone(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.user_message(),
            error_code: self.error_code().map(str::to_string),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut response = (self.status(), Json(self.to_body())).into_response();
        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("X-Request-Id", value);
        }
        response
    }
}

/// Client-side failures of a generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Decode(String),

    #[error("Не удалось загрузить изображение {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{message}")]
    Transport { message: String, code: Option<String> },

    #[error(transparent)]
    Model(#[from] ModelRejection),
}

impl ClientError {
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Transport { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_missing_credential(&self) -> bool {
        self.code() == Some(MISSING_API_KEY)
    }
}

impl From<AppError> for ClientError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Model(rejection) => ClientError::Model(rejection),
            other => ClientError::Transport {
                message: other.user_message(),
                code: other.error_code().map(str::to_string),
            },
        }
    }
}
