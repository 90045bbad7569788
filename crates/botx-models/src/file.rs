//! File attachments and the `data:` URI codec used on the wire.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type used when the file name gives no hint.
pub const FALLBACK_MEDIA_TYPE: &str = "text/plain";

/// Errors raised while decoding a wire-encoded file.
#[derive(Debug, Error)]
pub enum FileError {
    /// The `data` field is not a `data:<mime>;base64,<payload>` URI.
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),

    /// The base64 payload could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A file attachment as it travels on the wire.
///
/// `data` carries the full `data:<media-type>;base64,<payload>` URI; the
/// media type and raw bytes are recoverable with [`File::media_type`] and
/// [`File::raw_data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Original file name, extension included.
    pub file_name: String,
    /// `data:` URI with the base64-encoded contents.
    pub data: String,
}

impl File {
    /// Encodes raw bytes into the wire form.
    ///
    /// The media type is guessed from the file name extension and falls back
    /// to `text/plain` when the extension is unknown.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Self {
        let file_name = file_name.into();
        let media_type = mime_guess::from_path(&file_name)
            .first_raw()
            .unwrap_or(FALLBACK_MEDIA_TYPE);

        Self {
            data: format!("data:{};base64,{}", media_type, BASE64.encode(bytes)),
            file_name,
        }
    }

    /// Returns the media type embedded in the data URI.
    pub fn media_type(&self) -> &str {
        self.data
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .filter(|mime| !mime.is_empty())
            .unwrap_or(FALLBACK_MEDIA_TYPE)
    }

    /// Decodes the base64 payload back into raw bytes.
    pub fn raw_data(&self) -> Result<Vec<u8>, FileError> {
        let (_, payload) = self
            .data
            .split_once("base64,")
            .ok_or_else(|| FileError::MalformedDataUri(self.data.clone()))?;
        Ok(BASE64.decode(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_name_and_bytes() {
        let bytes = b"column_a,column_b\n1,2\n";
        let file = File::from_bytes("report.csv", bytes);

        assert_eq!(file.file_name, "report.csv");
        assert_eq!(file.media_type(), "text/csv");
        assert_eq!(file.raw_data().unwrap(), bytes);
    }

    #[test]
    fn unknown_extension_falls_back_to_text_plain() {
        let file = File::from_bytes("blob.unknownext", b"payload");
        assert_eq!(file.media_type(), "text/plain");
        assert!(file.data.starts_with("data:text/plain;base64,"));
    }

    #[test]
    fn binary_contents_survive_the_codec() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let file = File::from_bytes("noise.png", &bytes);
        assert_eq!(file.media_type(), "image/png");
        assert_eq!(file.raw_data().unwrap(), bytes);
    }

    #[test]
    fn missing_base64_marker_is_rejected() {
        let file = File {
            file_name: "x.txt".into(),
            data: "data:text/plain,plain-not-base64".into(),
        };
        assert!(matches!(
            file.raw_data(),
            Err(FileError::MalformedDataUri(_))
        ));
    }
}
