//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트를 추출합니다.

use crate::error::ExtractionError;

/// PDF 추출 결과
#[derive(Debug, Clone)]
pub struct PdfText {
    /// 공백이 아닌 페이지들을 줄바꿈으로 이은 텍스트
    pub text: String,
    /// 전체 페이지 수 (빈 페이지 포함)
    pub page_count: usize,
}

/// PDF 바이트에서 텍스트 추출
///
/// 문서를 열 수 없거나 추출된 텍스트가 비어있으면 에러입니다.
pub fn extract_pdf(bytes: &[u8], file_name: &str) -> Result<PdfText, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        ExtractionError::Pdf {
            file_name: file_name.to_string(),
            message: e.to_string(),
        }
    })?;

    let page_count = pages.len();
    let text = join_pages(&pages);

    if text.is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {}. It might be a scanned document.",
            file_name
        );
        return Err(ExtractionError::Empty {
            file_name: file_name.to_string(),
        });
    }

    Ok(PdfText { text, page_count })
}

/// 빈 페이지를 버리고 이어 붙임
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .filter(|page| !page.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    /// 페이지마다 Helvetica 한 줄씩 쓰는 최소 PDF (빈 문자열이면 빈 페이지)
    pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let font_id = 3 + pages.len();
        let first_content_id = font_id + 1;

        let kids = (0..pages.len())
            .map(|i| format!("{} 0 R", 3 + i))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        ];
        for i in 0..pages.len() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                font_id,
                first_content_id + i
            ));
        }
        objects.push(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        );
        for text in pages {
            let stream = if text.is_empty() {
                String::new()
            } else {
                format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text)
            };
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::testing::build_pdf;
    use super::*;

    #[test]
    fn test_extract_pdf_counts_blank_pages() {
        let bytes = build_pdf(&["Jane Doe Rust engineer", ""]);
        let extracted = extract_pdf(&bytes, "jane.pdf").unwrap();

        assert_eq!(extracted.page_count, 2);
        assert!(extracted.text.contains("Jane Doe Rust engineer"));
        assert_eq!(extracted.text, extracted.text.trim());
    }

    #[test]
    fn test_extract_pdf_only_blank_pages_is_empty() {
        let bytes = build_pdf(&["", ""]);
        let err = extract_pdf(&bytes, "scan.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Empty { ref file_name } if file_name == "scan.pdf"));
    }

    #[test]
    fn test_join_pages_skips_blank() {
        let pages = vec![
            "Page 1 content".to_string(),
            "   \n".to_string(),
            "Page 3 content\n".to_string(),
        ];
        assert_eq!(join_pages(&pages), "Page 1 content\nPage 3 content");
    }

    #[test]
    fn test_join_pages_all_blank() {
        let pages = vec![" ".to_string(), "\n\n".to_string()];
        assert!(join_pages(&pages).is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let err = extract_pdf(b"definitely not a pdf", "x.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf { .. }));
    }
}
