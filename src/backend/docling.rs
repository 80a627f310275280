//! HTTP client for a docling-serve conversion backend.
//!
//! docling-serve exposes the Docling parser over HTTP: URL sources go to
//! `/v1alpha/convert/source` as JSON, local files are uploaded to
//! `/v1alpha/convert/file` as multipart. Either way the response carries
//! the document exported in every requested representation, so one
//! round-trip yields a [`ParsedDocument`] whose export methods are plain
//! field reads.
//!
//! Every failure mode of the backend — unreachable endpoint, HTTP error
//! status, `"failure"` conversion status in the payload — maps to a
//! [`ConvertError`] and stays scoped to the one document being converted.

use crate::backend::{is_url, DocumentConverter, ParsedDocument};
use crate::config::{ConvertOptions, ExportFormat};
use crate::error::{ConvertError, Doc2AnyError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Conversion backend talking to a docling-serve instance.
pub struct DoclingServeConverter {
    base_url: String,
    client: reqwest::Client,
}

impl DoclingServeConverter {
    /// Create a converter against the given base URL, e.g.
    /// `http://localhost:5001`.
    pub fn new(base_url: &str) -> Result<Self, Doc2AnyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Doc2AnyError::BackendUnavailable {
                detail: e.to_string(),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn convert_url(
        &self,
        url: &str,
        options: &ConvertOptions,
    ) -> Result<ServeDocument, ConvertError> {
        info!("Converting URL source: {}", url);

        let body = SourceRequest {
            options: ServeOptions::from(options),
            http_sources: vec![HttpSource {
                url: url.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1alpha/convert/source", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ConvertError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Self::parse_response(url, response).await
    }

    async fn convert_file(
        &self,
        path_str: &str,
        options: &ConvertOptions,
    ) -> Result<ServeDocument, ConvertError> {
        let path = Path::new(path_str);
        if !path.exists() {
            return Err(ConvertError::SourceNotFound {
                source: path_str.to_string(),
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|_| ConvertError::SourceNotFound {
                source: path_str.to_string(),
            })?;
        debug!("Uploading {} ({} bytes)", path_str, bytes.len());

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let serve_options = ServeOptions::from(options);
        let mut form = reqwest::multipart::Form::new().part(
            "files",
            reqwest::multipart::Part::bytes(bytes).file_name(filename),
        );
        for fmt in serve_options.to_formats {
            form = form.text("to_formats", fmt);
        }
        form = form
            .text("do_ocr", serve_options.do_ocr.to_string())
            .text(
                "do_table_structure",
                serve_options.do_table_structure.to_string(),
            );

        let response = self
            .client
            .post(format!("{}/v1alpha/convert/file", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::Backend {
                detail: format!("backend request failed: {e}"),
            })?;

        Self::parse_response(path_str, response).await
    }

    async fn parse_response(
        source: &str,
        response: reqwest::Response,
    ) -> Result<ServeDocument, ConvertError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE {
            let detail = response.text().await.unwrap_or_default();
            return Err(ConvertError::UnsupportedFormat {
                source: source.to_string(),
                detail,
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ConvertError::Backend {
                detail: format!("HTTP {status}: {detail}"),
            });
        }

        let payload: ServeResponse =
            response
                .json()
                .await
                .map_err(|e| ConvertError::Backend {
                    detail: format!("malformed backend response: {e}"),
                })?;

        if payload.status == "failure" {
            let detail = payload
                .errors
                .first()
                .cloned()
                .unwrap_or_else(|| "backend reported failure".to_string());
            warn!("Backend failed to convert {}: {}", source, detail);
            return Err(ConvertError::Backend { detail });
        }

        payload.document.ok_or_else(|| ConvertError::Backend {
            detail: "backend response carried no document".to_string(),
        })
    }
}

#[async_trait]
impl DocumentConverter for DoclingServeConverter {
    async fn convert(
        &self,
        source: &str,
        options: &ConvertOptions,
    ) -> Result<Box<dyn ParsedDocument>, ConvertError> {
        let document = if is_url(source) {
            self.convert_url(source, options).await?
        } else {
            self.convert_file(source, options).await?
        };
        Ok(Box::new(document))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SourceRequest {
    options: ServeOptions,
    http_sources: Vec<HttpSource>,
}

#[derive(Debug, Serialize)]
struct HttpSource {
    url: String,
}

#[derive(Debug, Serialize)]
struct ServeOptions {
    to_formats: Vec<String>,
    do_ocr: bool,
    do_table_structure: bool,
}

impl From<&ConvertOptions> for ServeOptions {
    fn from(options: &ConvertOptions) -> Self {
        // Request every representation up front: the parse dominates the
        // cost, and a single round-trip keeps ParsedDocument export calls
        // free of further I/O.
        Self {
            to_formats: ExportFormat::all()
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
            do_ocr: options.ocr_enabled,
            do_table_structure: options.table_structure_enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    errors: Vec<String>,
    document: Option<ServeDocument>,
}

/// The exported representations returned by docling-serve for one document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServeDocument {
    #[serde(default)]
    md_content: Option<String>,
    #[serde(default)]
    json_content: Option<serde_json::Value>,
    #[serde(default)]
    html_content: Option<String>,
    #[serde(default)]
    doctags_content: Option<String>,
}

impl ParsedDocument for ServeDocument {
    fn export_to_markdown(&self) -> String {
        self.md_content.clone().unwrap_or_default()
    }

    fn export_to_json(&self) -> String {
        self.json_content
            .as_ref()
            .and_then(|v| serde_json::to_string_pretty(v).ok())
            .unwrap_or_default()
    }

    fn export_to_html(&self) -> String {
        self.html_content.clone().unwrap_or_default()
    }

    fn export_to_doctags(&self) -> String {
        self.doctags_content.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_options_mirror_convert_options() {
        let options = ConvertOptions::builder()
            .ocr_enabled(true)
            .table_structure_enabled(false)
            .build();
        let serve = ServeOptions::from(&options);
        assert!(serve.do_ocr);
        assert!(!serve.do_table_structure);
        assert_eq!(serve.to_formats, vec!["md", "json", "html", "doctags"]);
    }

    #[test]
    fn serve_document_exports_by_format() {
        let doc = ServeDocument {
            md_content: Some("# Title".into()),
            json_content: Some(serde_json::json!({"name": "doc"})),
            html_content: Some("<h1>Title</h1>".into()),
            doctags_content: Some("<title>Title</title>".into()),
        };

        assert_eq!(ExportFormat::Markdown.export(&doc), "# Title");
        assert!(ExportFormat::Json.export(&doc).contains("\"name\""));
        assert_eq!(ExportFormat::Html.export(&doc), "<h1>Title</h1>");
        assert_eq!(ExportFormat::Doctags.export(&doc), "<title>Title</title>");
    }

    #[test]
    fn missing_exports_become_empty_strings() {
        let doc = ServeDocument::default();
        for fmt in ExportFormat::all() {
            assert!(fmt.export(&doc).is_empty());
        }
    }

    #[test]
    fn failure_payload_deserializes() {
        let json = r#"{"status": "failure", "errors": ["corrupt header"], "document": null}"#;
        let payload: ServeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.status, "failure");
        assert_eq!(payload.errors, vec!["corrupt header"]);
        assert!(payload.document.is_none());
    }
}
