use base64::Engine as _;
use tokio::fs;

use crate::models::error::ClientError;
use crate::models::image::{EncodedImage, ImageResource, ImageSource};

/// Reads an image and turns it into a base64 payload plus MIME type.
pub async fn encode(image: &ImageResource) -> Result<EncodedImage, ClientError> {
    let bytes = match &image.source {
        ImageSource::File(path) => fs::read(path).await.map_err(|e| {
            ClientError::Decode(format!("Не удалось прочитать файл {}: {}", image.name, e))
        })?,
        ImageSource::Bytes(bytes) => bytes.to_vec(),
    };

    let data_url = to_data_url(image.mime_type.as_deref().unwrap_or(""), &bytes);
    parse_data_url(&data_url)
}

pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Splits a `data:<mime>;base64,<payload>` string.
pub fn parse_data_url(data_url: &str) -> Result<EncodedImage, ClientError> {
    let (header, data) = data_url
        .split_once(',')
        .ok_or_else(|| ClientError::Decode("Неверный URL данных".to_string()))?;

    let mime_type = header
        .split_once(':')
        .and_then(|(_, rest)| rest.split_once(';'))
        .map(|(mime, _)| mime.trim())
        .filter(|mime| !mime.is_empty())
        .ok_or_else(|| ClientError::Decode("Не удалось извлечь MIME-тип из URL данных".to_string()))?;

    Ok(EncodedImage {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}

/// Decodes the payload of a data URL back into raw bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), ClientError> {
    let encoded = parse_data_url(data_url)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.data.as_bytes())
        .map_err(|e| ClientError::Decode(format!("Некорректные данные base64: {}", e)))?;
    Ok((encoded.mime_type, bytes))
}
