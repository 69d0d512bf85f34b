//! Parsing of `data:` URLs carrying uploaded files.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::error::AppError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("missing 'data:' prefix")]
    MissingPrefix,
    #[error("missing ',' separator")]
    MissingSeparator,
    #[error("only base64 payloads are accepted")]
    NotBase64,
    #[error("payload is not valid base64")]
    InvalidPayload,
    #[error("payload is empty")]
    Empty,
}

/// A decoded `data:<mime>;base64,<payload>` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn parse_data_url(value: &str) -> Result<DataUrl, DataUrlError> {
    let rest = value
        .strip_prefix("data:")
        .ok_or(DataUrlError::MissingPrefix)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingSeparator)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| DataUrlError::InvalidPayload)?;
    if bytes.is_empty() {
        return Err(DataUrlError::Empty);
    }

    Ok(DataUrl {
        mime_type: if mime_type.is_empty() {
            "text/plain".to_string()
        } else {
            mime_type.to_string()
        },
        bytes,
    })
}

/// Checks an optional data URL field of a request.
pub fn check_data_url(field: &str, value: Option<&str>) -> Result<(), AppError> {
    match value {
        Some(value) => parse_data_url(value).map(|_| ()).map_err(|e| AppError::InvalidDataUrl {
            field: field.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_base64_payload() {
        let parsed = parse_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert_eq!(&parsed.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert_eq!(parse_data_url("image/png;base64,AAAA"), Err(DataUrlError::MissingPrefix));
        assert_eq!(parse_data_url("data:image/png;base64"), Err(DataUrlError::MissingSeparator));
        assert_eq!(parse_data_url("data:text/plain,hello"), Err(DataUrlError::NotBase64));
        assert_eq!(parse_data_url("data:image/png;base64,@@@"), Err(DataUrlError::InvalidPayload));
        assert_eq!(parse_data_url("data:image/png;base64,"), Err(DataUrlError::Empty));
    }

    #[test]
    fn test_check_maps_to_app_error() {
        assert!(check_data_url("logo", None).is_ok());
        let err = check_data_url("logo", Some("not a url")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDataUrl { field, .. } if field == "logo"));
    }
}
