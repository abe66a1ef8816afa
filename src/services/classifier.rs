use crate::models::gemini::GenerateContentResponse;
use crate::models::image::EncodedImage;
use crate::models::outcome::GenerationOutcome;

const NORMAL_STOP: &str = "STOP";

/// Decides what a model reply amounts to.
///
/// Checks run in a fixed order and the first match wins: prompt block,
/// first complete inline image, abnormal finish reason, empty reply.
pub fn classify(response: &GenerateContentResponse) -> GenerationOutcome {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = non_empty(feedback.block_reason.as_deref()) {
            return GenerationOutcome::Blocked {
                reason: reason.to_string(),
                message: non_empty(feedback.block_reason_message.as_deref()).map(str::to_string),
            };
        }
    }

    if let Some(image) = first_image(response) {
        return GenerationOutcome::Success(image);
    }

    let finish_reason = response
        .candidates
        .first()
        .and_then(|c| non_empty(c.finish_reason.as_deref()));
    if let Some(reason) = finish_reason {
        if reason != NORMAL_STOP {
            return GenerationOutcome::AbnormalStop { reason: reason.to_string() };
        }
    }

    GenerationOutcome::EmptyReply {
        text: response
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
    }
}

fn first_image(response: &GenerateContentResponse) -> Option<EncodedImage> {
    response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find_map(|inline| {
            let data = non_empty(inline.data.as_deref())?;
            let mime_type = non_empty(inline.mime_type.as_deref())?;
            Some(EncodedImage {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            })
        })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
