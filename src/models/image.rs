use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Where the bytes of an [`ImageResource`] live.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A local file, read when the image is encoded.
    File(PathBuf),
    /// Bytes already in memory, e.g. fetched from a gallery URL.
    Bytes(Arc<[u8]>),
}

/// A user-supplied image plus its MIME type.
#[derive(Debug, Clone)]
pub struct ImageResource {
    pub name: String,
    pub mime_type: Option<String>,
    pub source: ImageSource,
}

impl ImageResource {
    /// Image backed by a local file; the MIME type is guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Self {
            name,
            mime_type: mime_for_path(path).map(str::to_string),
            source: ImageSource::File(path.to_path_buf()),
        }
    }

    pub fn from_bytes(name: impl Into<String>, mime_type: Option<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            source: ImageSource::Bytes(bytes.into()),
        }
    }
}

/// Base64 image payload in the shape both the proxy and the model expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// The clothing half of a try-on request.
#[derive(Debug, Clone)]
pub enum ClothingSelection {
    Uploaded(Arc<ImageResource>),
    GalleryReference { url: String, name: String },
}

impl ClothingSelection {
    pub fn label(&self) -> &str {
        match self {
            ClothingSelection::Uploaded(image) => &image.name,
            ClothingSelection::GalleryReference { name, .. } => name,
        }
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
