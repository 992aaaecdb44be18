use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::EditorError;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Encode an image file as an inline `data:` URL.
///
/// The mime type is guessed from the file name; anything that is not an
/// image is rejected.
pub fn image_data_url(file_name: &str, bytes: &[u8]) -> Result<String, EditorError> {
    if bytes.is_empty() {
        return Err(EditorError::EmptyImage);
    }

    let mime = mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(FALLBACK_MIME);
    if !mime.starts_with("image/") {
        return Err(EditorError::NotAnImage {
            mime: mime.to_string(),
        });
    }

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
