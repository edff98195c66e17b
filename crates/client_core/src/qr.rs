use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum QrDecodeError {
    #[error("qr code is not a data uri")]
    NotDataUri,
    #[error("qr code data uri is not base64 encoded")]
    NotBase64,
    #[error("invalid qr code payload: {0}")]
    Payload(#[from] base64::DecodeError),
}

impl QrCode {
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn decode(&self) -> Result<QrImage, QrDecodeError> {
        let rest = self
            .data_uri
            .trim()
            .strip_prefix("data:")
            .ok_or(QrDecodeError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(QrDecodeError::NotDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(QrDecodeError::NotBase64)?;
        let mime_type = if mime_type.is_empty() {
            "text/plain"
        } else {
            mime_type
        };
        Ok(QrImage {
            mime_type: mime_type.to_string(),
            bytes: STANDARD.decode(payload)?,
        })
    }
}
