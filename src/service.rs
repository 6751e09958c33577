//! The external conversion capability.
//!
//! [`ConversionService`] is the seam between the workflow controller and
//! whatever performs the conversion. [`ConvertApiClient`] is the production
//! implementation; tests plug in their own.
//!
//! ## Request shape
//!
//! ```text
//! POST {base_url}/convert/{from}/to/{to}
//! Authorization: Bearer <secret>
//! multipart: File=<bytes; filename>, StoreFile=true
//!
//! 200 { "ConversionCost": 1, "Files": [{ "FileName": "...", "FileSize": 123, "Url": "https://..." }] }
//! ```

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::state::{ConversionResult, SelectedFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Converts a file between two format tags and fetches the result.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Convert `file` from `source_tag` to `target_tag` (both lowercase).
    async fn convert(
        &self,
        source_tag: &str,
        target_tag: &str,
        file: &SelectedFile,
    ) -> Result<ConversionResult, ServiceError>;

    /// Download the bytes of a converted artifact.
    async fn fetch(&self, result: &ConversionResult) -> Result<Vec<u8>, ServiceError>;
}

/// HTTP client for ConvertAPI.
pub struct ConvertApiClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl ConvertApiClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fileconvert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[async_trait]
impl ConversionService for ConvertApiClient {
    async fn convert(
        &self,
        source_tag: &str,
        target_tag: &str,
        file: &SelectedFile,
    ) -> Result<ConversionResult, ServiceError> {
        let url = self.config.convert_url(source_tag, target_tag);
        debug!("POST {} ({} bytes, '{}')", url, file.len(), file.name);

        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("File", part).text("StoreFile", "true");

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret)
            .multipart(form);
        if let Some(secs) = self.config.api_timeout_secs {
            request = request.timeout(Duration::from_secs(secs));
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.api_timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.config.api_timeout_secs))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body, source_tag, target_tag));
        }

        let result = parse_convert_response(&body)?;
        debug!("Converted '{}' → {}", file.name, result.url);
        Ok(result)
    }

    async fn fetch(&self, result: &ConversionResult) -> Result<Vec<u8>, ServiceError> {
        let secs = self.config.download_timeout_secs;
        debug!("GET {}", result.url);

        let response = self
            .http
            .get(&result.url)
            .timeout(Duration::from_secs(secs))
            .send()
            .await
            .map_err(|e| transport_error(e, Some(secs)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message: format!("artifact download returned HTTP {status}"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, Some(secs)))?;
        Ok(bytes.to_vec())
    }
}

fn transport_error(e: reqwest::Error, timeout_secs: Option<u64>) -> ServiceError {
    match timeout_secs {
        Some(secs) if e.is_timeout() => ServiceError::Timeout { secs },
        _ => ServiceError::Network(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertResponse {
    #[serde(default)]
    files: Vec<ConvertedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedFile {
    url: Option<String>,
    file_name: Option<String>,
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    message: Option<String>,
}

/// Extract the first converted file from a success body.
pub(crate) fn parse_convert_response(body: &str) -> Result<ConversionResult, ServiceError> {
    let parsed: ConvertResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

    let first = parsed
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::InvalidResponse("response contains no files".into()))?;

    let url = first
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ServiceError::InvalidResponse("converted file has no Url".into()))?;

    Ok(ConversionResult {
        url,
        file_name: first.file_name,
        file_size: first.file_size,
    })
}

/// Map a non-success HTTP status to a [`ServiceError`].
pub(crate) fn classify_failure(
    status: StatusCode,
    body: &str,
    source_tag: &str,
    target_tag: &str,
) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Auth {
            status: status.as_u16(),
            detail: message,
        },
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ServiceError::UnsupportedFormat {
            source_format: source_tag.to_string(),
            target_format: target_tag.to_string(),
        },
        _ => ServiceError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_file() {
        let body = r#"{
            "ConversionCost": 1,
            "Files": [
                {"FileName": "drawing.pdf", "FileExt": "pdf", "FileSize": 4096, "FileId": "abc", "Url": "https://cdn/drawing.pdf"},
                {"FileName": "second.pdf", "Url": "https://cdn/second.pdf"}
            ]
        }"#;
        let result = parse_convert_response(body).unwrap();
        assert_eq!(result.url, "https://cdn/drawing.pdf");
        assert_eq!(result.file_name.as_deref(), Some("drawing.pdf"));
        assert_eq!(result.file_size, Some(4096));
    }

    #[test]
    fn empty_files_is_invalid() {
        let err = parse_convert_response(r#"{"Files": []}"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[test]
    fn missing_url_is_invalid() {
        let err = parse_convert_response(r#"{"Files": [{"FileName": "a.pdf"}]}"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[test]
    fn garbage_body_is_invalid() {
        let err = parse_convert_response("<html>502</html>").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[test]
    fn auth_statuses() {
        let body = r#"{"Code": 4013, "Message": "Secret is invalid"}"#;
        let err = classify_failure(StatusCode::UNAUTHORIZED, body, "dwg", "pdf");
        assert_eq!(
            err,
            ServiceError::Auth {
                status: 401,
                detail: "Secret is invalid".into()
            }
        );
        let err = classify_failure(StatusCode::FORBIDDEN, "", "dwg", "pdf");
        assert!(matches!(err, ServiceError::Auth { status: 403, .. }));
    }

    #[test]
    fn unsupported_media_type() {
        let err = classify_failure(StatusCode::UNSUPPORTED_MEDIA_TYPE, "", "xls", "dwg");
        assert_eq!(
            err,
            ServiceError::UnsupportedFormat {
                source_format: "xls".into(),
                target_format: "dwg".into()
            }
        );
    }

    #[test]
    fn other_status_falls_back_to_reason_phrase() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "not json", "dwg", "pdf");
        assert_eq!(
            err,
            ServiceError::Rejected {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
    }

    #[test]
    fn client_builds_from_config() {
        let config = ServiceConfig::builder().secret("s").build().unwrap();
        let client = ConvertApiClient::new(config).unwrap();
        assert_eq!(client.config().base_url, crate::config::DEFAULT_BASE_URL);
    }
}
