//! Document download and PDF-vs-image classification.
//!
//! Unlike the single-page model calls, the initial fetch is a hard
//! precondition: if the document cannot be downloaded there is nothing to
//! degrade to, so every failure here propagates as [`ExtractError`] and
//! becomes the endpoint's 500 response.

use crate::error::ExtractError;
use tracing::{debug, info};

/// What the downloaded bytes represent, decided from the URL suffix and the
/// response's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Multi-page PDF: split and process page by page.
    Pdf,
    /// Anything else: treat as a single image and make exactly one call.
    Image,
}

/// The downloaded document, ready for the split or extract stage.
#[derive(Debug)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
}

/// Classify a document from its URL and the `Content-Type` response header.
///
/// PDF iff the URL path ends in `.pdf` (case-insensitive, query string
/// ignored) or the content type mentions pdf. Everything else is an image.
pub fn classify(url: &str, content_type: Option<&str>) -> DocumentKind {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.to_ascii_lowercase().ends_with(".pdf") {
        return DocumentKind::Pdf;
    }
    if let Some(ct) = content_type {
        if ct.to_ascii_lowercase().contains("pdf") {
            return DocumentKind::Pdf;
        }
    }
    DocumentKind::Image
}

/// Download the document with a bounded timeout.
///
/// Follows redirects (reqwest default) and reports the final content type.
/// A non-2xx status is a hard failure — the caller gets `HttpStatus`, not an
/// empty document.
pub async fn fetch_document(url: &str, timeout_secs: u64) -> Result<FetchedDocument, ExtractError> {
    info!("Downloading: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let kind = classify(url, content_type.as_deref());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    debug!(
        "Downloaded {} bytes, content-type {:?}, classified as {:?}",
        bytes.len(),
        content_type,
        kind
    );

    Ok(FetchedDocument { bytes, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_by_url_suffix() {
        assert_eq!(classify("https://x.com/bill.pdf", None), DocumentKind::Pdf);
        assert_eq!(classify("https://x.com/BILL.PDF", None), DocumentKind::Pdf);
        assert_eq!(
            classify("https://x.com/bill.pdf?sig=abc", None),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn pdf_by_content_type() {
        assert_eq!(
            classify("https://x.com/download/123", Some("application/pdf")),
            DocumentKind::Pdf
        );
        assert_eq!(
            classify("https://x.com/download/123", Some("application/pdf; charset=binary")),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn image_otherwise() {
        assert_eq!(
            classify("https://x.com/scan.jpg", Some("image/jpeg")),
            DocumentKind::Image
        );
        assert_eq!(classify("https://x.com/scan.jpg", None), DocumentKind::Image);
        assert_eq!(
            classify("https://x.com/download/123", Some("application/octet-stream")),
            DocumentKind::Image
        );
    }
}
