use anyhow::{Context, Result};

/// Check whether an upload looks like a PDF, by MIME type or extension when
/// the client sends a generic type.
pub fn is_pdf(content_type: &str, filename: &str) -> bool {
    if content_type == "application/pdf" {
        return true;
    }
    content_type == "application/octet-stream"
        && extension_from_filename(filename).is_some_and(|ext| ext == "pdf")
}

/// Extract the text layer of a PDF.
///
/// Extraction is CPU-bound, so it runs on the blocking thread pool via
/// `spawn_blocking`, with a hard timeout to avoid hanging forever on
/// pathological files.
pub async fn extract_text(bytes: Vec<u8>, filename: &str) -> Result<String> {
    let fname = filename.to_string();
    tracing::info!(
        "extract_text: starting extraction for '{fname}' ({} bytes)",
        bytes.len()
    );

    let handle = tokio::task::spawn_blocking(move || {
        let result = extract_pdf_sync(&bytes);
        match &result {
            Ok(text) => {
                tracing::info!("extract_text: '{fname}' succeeded, {} chars", text.len())
            }
            Err(e) => tracing::error!("extract_text: '{fname}' failed: {e:#}"),
        }
        result
    });

    match tokio::time::timeout(std::time::Duration::from_secs(120), handle).await {
        Ok(join_result) => join_result.context("Text extraction task panicked")?,
        Err(_) => anyhow::bail!("Text extraction timed out after 120s for '{filename}'"),
    }
}

fn extract_pdf_sync(bytes: &[u8]) -> Result<String> {
    // Try pdftotext (poppler) first — much faster and handles complex PDFs better
    match extract_pdf_pdftotext(bytes) {
        Ok(text) if !text.trim().is_empty() => {
            tracing::info!("PDF extracted via pdftotext ({} chars)", text.len());
            return Ok(text);
        }
        Ok(_) => tracing::warn!("pdftotext returned empty text, falling back to pdf_extract"),
        Err(e) => tracing::warn!("pdftotext failed ({e:#}), falling back to pdf_extract"),
    }

    // Fallback to pure-Rust pdf_extract
    tracing::info!("Extracting PDF via pdf_extract (this may be slow for large files)");
    pdf_extract::extract_text_from_mem(bytes).context("Failed to extract text from PDF")
}

fn extract_pdf_pdftotext(bytes: &[u8]) -> Result<String> {
    use std::io::Write;
    use std::process::Command;

    // pdftotext reads from a file, so spill the upload to a temp path
    let mut tmp = tempfile::NamedTempFile::new().context("Failed to create temp file")?;
    tmp.write_all(bytes).context("Failed to write PDF to temp file")?;
    tmp.flush()?;

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(tmp.path())
        .arg("-") // output to stdout
        .output()
        .context("Failed to run pdftotext — is poppler-utils installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("pdftotext exited with {}: {stderr}", output.status);
    }

    String::from_utf8(output.stdout).context("pdftotext output is not valid UTF-8")
}

fn extension_from_filename(filename: &str) -> Option<String> {
    filename.rsplit('.').next().map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf("application/pdf", "notes.pdf"));
        assert!(is_pdf("application/octet-stream", "Textbook.PDF"));
        assert!(!is_pdf("application/octet-stream", "image.png"));
        assert!(!is_pdf("text/plain", "notes.txt"));
    }
}
