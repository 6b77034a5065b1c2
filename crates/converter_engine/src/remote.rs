use std::time::Duration;

use converter_logging::{converter_debug, converter_info};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{
    ConversionBackend, ConversionError, ConversionOutput, ConvertedFile, FailureKind, SqlFile,
};

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// Multi-file conversion endpoint.
    pub endpoint: String,
    /// Multipart field name shared by every uploaded file.
    pub field_name: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/convert-multiple".to_string(),
            field_name: "files".to_string(),
            connect_timeout: Duration::from_secs(10),
            // The service runs every file through a language model.
            request_timeout: Duration::from_secs(300),
            max_response_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(alias = "results")]
    files: Vec<ConvertedEntry>,
}

#[derive(Debug, Deserialize)]
struct ConvertedEntry {
    #[serde(default)]
    name: Option<String>,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Delegates conversion to an HTTP service with one multipart request per batch.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    settings: RemoteSettings,
}

impl RemoteBackend {
    pub fn new(settings: RemoteSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, ConversionError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| ConversionError::new(FailureKind::Network, err.to_string()))
    }

    fn build_form(&self, files: &[SqlFile]) -> Result<Form, ConversionError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::stream_with_length(file.contents.clone(), file.contents.len() as u64)
                .file_name(file.name.clone())
                .mime_str("application/octet-stream")
                .map_err(|err| ConversionError::new(FailureKind::Network, err.to_string()))?;
            form = form.part(self.settings.field_name.clone(), part);
        }
        Ok(form)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ConversionError> {
        let max_bytes = self.settings.max_response_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(too_large(max_bytes));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(too_large(max_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ConversionBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn convert(&self, files: &[SqlFile]) -> Result<ConversionOutput, ConversionError> {
        let url = reqwest::Url::parse(&self.settings.endpoint).map_err(|err| {
            ConversionError::new(
                FailureKind::InvalidEndpoint,
                format!("invalid conversion endpoint {}: {err}", self.settings.endpoint),
            )
        })?;
        let client = self.build_client()?;
        let form = self.build_form(files)?;

        converter_info!("Posting {} file(s) to {}", files.len(), url);
        let response = client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = self.read_body(response).await?;
        converter_debug!("Conversion service answered {} with {} bytes", status, body.len());

        if !status.is_success() {
            let message = match error_reason(&body) {
                Some(reason) => format!("conversion service returned {status}: {reason}"),
                None => format!("conversion service returned {status}"),
            };
            return Err(ConversionError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        parse_response(&body)
    }
}

fn parse_response(body: &[u8]) -> Result<ConversionOutput, ConversionError> {
    let parsed: ConvertResponse = serde_json::from_slice(body).map_err(|err| {
        ConversionError::new(
            FailureKind::InvalidResponse,
            format!("unexpected response from conversion service: {err}"),
        )
    })?;
    Ok(ConversionOutput::Files(
        parsed
            .files
            .into_iter()
            .map(|entry| ConvertedFile {
                name: entry.name,
                content: entry.content,
            })
            .collect(),
    ))
}

/// Extracts `{"error": "..."}` from an error body, or a short plain-text body as-is.
fn error_reason(body: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return Some(parsed.error);
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() || text.len() > 200 || text.starts_with('<') {
        None
    } else {
        Some(text.to_string())
    }
}

fn too_large(max_bytes: u64) -> ConversionError {
    ConversionError::new(
        FailureKind::TooLarge { max_bytes },
        format!("conversion response exceeded {max_bytes} bytes"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ConversionError {
    if err.is_timeout() {
        return ConversionError::new(FailureKind::Timeout, format!("conversion timed out: {err}"));
    }
    if err.is_connect() {
        return ConversionError::new(
            FailureKind::Network,
            format!("could not reach conversion service: {err}"),
        );
    }
    ConversionError::new(FailureKind::Network, err.to_string())
}
