use super::image::EncodedImage;

/// What a model reply amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(EncodedImage),
    Blocked { reason: String, message: Option<String> },
    AbnormalStop { reason: String },
    EmptyReply { text: Option<String> },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }

    /// User-facing explanation for a non-success outcome.
    pub fn describe(&self, context: &str) -> Option<String> {
        let message = match self {
            GenerationOutcome::Success(_) => return None,
            GenerationOutcome::Blocked { reason, message } => {
                let base = format!("Запрос ({}) заблокирован. Причина: {}.", context, reason);
                match message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
                    Some(extra) => format!("{} {}", base, extra),
                    None => base,
                }
            }
            GenerationOutcome::AbnormalStop { reason } => {
                format!("Генерация изображения ({}) прервалась. Причина: {}.", context, reason)
            }
            GenerationOutcome::EmptyReply { text } => {
                let tail = match text {
                    Some(text) => format!("Вместо этого она ответила текстом: \"{}\"", text),
                    None => "Это может быть связано с внутренними фильтрами безопасности или сложностью запроса."
                        .to_string(),
                };
                format!("Модель ИИ не вернула изображение ({}). {}", context, tail)
            }
        };
        Some(message)
    }

    /// Unwraps the image, turning every other outcome into a [`ModelRejection`].
    pub fn into_image(self, context: &str) -> Result<EncodedImage, ModelRejection> {
        match self {
            GenerationOutcome::Success(image) => Ok(image),
            other => {
                let message = other.describe(context).unwrap_or_default();
                Err(ModelRejection { outcome: other, message })
            }
        }
    }
}

/// A model reply that did not contain an image.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ModelRejection {
    pub outcome: GenerationOutcome,
    pub message: String,
}
