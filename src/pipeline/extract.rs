//! Text extraction: turn an uploaded PDF into page-level text fragments.
//!
//! Parsing is synchronous and CPU-bound, so both public entry points hop onto
//! the blocking pool with `tokio::task::spawn_blocking`.
//!
//! Only text is needed for quiz generation, so pages are never rasterised:
//! `lopdf` walks each page's content stream and returns the text runs.
//! A page that yields several runs has them joined with the configured
//! separator, and pages that end up empty are dropped.

use crate::error::{ExtractionError, QuizgenError};
use lopdf::Document;
use serde::Serialize;
use tracing::{debug, warn};

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextFragment {
    /// 1-indexed page number.
    pub page_num: usize,
    pub text: String,
}

/// Document-level facts shown by `pdfquiz inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pdf_version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub encrypted: bool,
}

/// Extract one fragment per page that has text.
///
/// # Errors
/// Every variant of [`ExtractionError`]: all of them mean the upload is
/// unusable and should be reported as a client error.
pub async fn extract_fragments(
    bytes: &[u8],
    separator: &str,
) -> Result<Vec<TextFragment>, QuizgenError> {
    check_magic(bytes)?;
    let bytes = bytes.to_vec();
    let separator = separator.to_string();

    let fragments = tokio::task::spawn_blocking(move || extract_blocking(&bytes, &separator))
        .await
        .map_err(|e| QuizgenError::Internal(format!("extraction task panicked: {e}")))??;
    Ok(fragments)
}

/// Read page count and metadata without extracting text.
pub async fn inspect(bytes: &[u8]) -> Result<DocumentInfo, QuizgenError> {
    check_magic(bytes)?;
    let bytes = bytes.to_vec();

    let info = tokio::task::spawn_blocking(move || inspect_blocking(&bytes))
        .await
        .map_err(|e| QuizgenError::Internal(format!("inspect task panicked: {e}")))??;
    Ok(info)
}

fn check_magic(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyUpload);
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractionError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

fn load(bytes: &[u8]) -> Result<Document, ExtractionError> {
    Document::load_mem(bytes).map_err(|e| {
        let detail = e.to_string();
        if detail.to_lowercase().contains("encrypt") {
            ExtractionError::Encrypted
        } else {
            ExtractionError::CorruptPdf { detail }
        }
    })
}

fn extract_blocking(bytes: &[u8], separator: &str) -> Result<Vec<TextFragment>, ExtractionError> {
    let doc = load(bytes)?;
    if doc.is_encrypted() {
        return Err(ExtractionError::Encrypted);
    }

    let pages = doc.get_pages();
    let page_count = pages.len();
    let mut fragments = Vec::with_capacity(page_count);

    for (page_num, _object_id) in pages {
        let raw = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Page {}: text extraction failed: {}", page_num, e);
                continue;
            }
        };
        let text = join_runs(&raw, separator);
        if text.is_empty() {
            debug!("Page {}: no text", page_num);
            continue;
        }
        fragments.push(TextFragment {
            page_num: page_num as usize,
            text,
        });
    }

    if fragments.is_empty() {
        return Err(ExtractionError::NoExtractableText { pages: page_count });
    }

    debug!(
        "Extracted {} of {} pages, {} chars",
        fragments.len(),
        page_count,
        fragments.iter().map(|f| f.text.chars().count()).sum::<usize>()
    );
    Ok(fragments)
}

/// Join the non-blank text runs of a page with `separator`.
fn join_runs(raw: &str, separator: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn inspect_blocking(bytes: &[u8]) -> Result<DocumentInfo, ExtractionError> {
    let doc = load(bytes)?;
    let (title, author) = info_strings(&doc);
    Ok(DocumentInfo {
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        title,
        author,
        encrypted: doc.is_encrypted(),
    })
}

/// `/Title` and `/Author` from the trailer's `/Info` dictionary.
fn info_strings(doc: &Document) -> (Option<String>, Option<String>) {
    let Some(info) = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|o| o.as_reference().ok())
        .and_then(|id| doc.get_object(id).ok())
        .and_then(|o| o.as_dict().ok())
    else {
        return (None, None);
    };

    let field = |key: &[u8]| {
        info.get(key)
            .ok()
            .and_then(|o| o.as_str().ok())
            .map(|b| String::from_utf8_lossy(b).trim().to_string())
            .filter(|s| !s.is_empty())
    };
    (field(b"Title"), field(b"Author"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(pages: &[Option<&str>]) -> Vec<u8> {
        crate::testing::pdf_with_pages(pages).unwrap()
    }

    #[tokio::test]
    async fn one_page_sky_is_blue() {
        let bytes = pdf(&[Some("The sky is blue.")]);
        let fragments = extract_fragments(&bytes, " ").await.unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].page_num, 1);
        assert!(fragments[0].text.contains("The sky is blue."), "got {:?}", fragments[0].text);
    }

    #[tokio::test]
    async fn blank_pages_are_filtered() {
        let bytes = pdf(&[None, Some("Second page."), None]);
        let fragments = extract_fragments(&bytes, " ").await.unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].page_num, 2);
    }

    #[tokio::test]
    async fn zero_text_is_rejected() {
        let bytes = pdf(&[None, None]);
        let err = extract_fragments(&bytes, " ").await.unwrap_err();
        assert!(matches!(
            err,
            QuizgenError::Extraction(ExtractionError::NoExtractableText { pages: 2 })
        ));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let err = extract_fragments(b"hello world", " ").await.unwrap_err();
        assert!(matches!(
            err,
            QuizgenError::Extraction(ExtractionError::NotAPdf { .. })
        ));
        let err = extract_fragments(b"", " ").await.unwrap_err();
        assert!(matches!(err, QuizgenError::Extraction(ExtractionError::EmptyUpload)));
    }

    #[tokio::test]
    async fn truncated_pdf_is_corrupt() {
        let err = extract_fragments(b"%PDF-1.5\n%garbage", " ").await.unwrap_err();
        assert!(matches!(
            err,
            QuizgenError::Extraction(ExtractionError::CorruptPdf { .. })
        ));
    }

    #[tokio::test]
    async fn inspect_counts_pages() {
        let bytes = pdf(&[Some("a"), None, Some("c")]);
        let info = inspect(&bytes).await.unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(info.pdf_version, "1.5");
        assert!(!info.encrypted);
        assert!(info.title.is_none());
    }

    #[test]
    fn runs_are_joined_with_separator() {
        assert_eq!(join_runs("  alpha \n\n beta\n", " "), "alpha beta");
        assert_eq!(join_runs("alpha\nbeta", " | "), "alpha | beta");
        assert_eq!(join_runs(" \n \n", " "), "");
    }
}
