//! Delivered-file naming.
//!
//! The invoice number is user input; it must never be able to inject path
//! separators or header syntax into the suggested filename.

const PREFIX: &str = "invoice_";
const EXTENSION: &str = "pdf";
const MAX_STEM_CHARS: usize = 64;
const FALLBACK_STEM: &str = "unnamed";

/// Reduce an invoice number to `[A-Za-z0-9._-]`, without leading dots,
/// at most 64 characters, never empty.
pub fn sanitize_file_stem(invoice_number: &str) -> String {
    let replaced: String = invoice_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem: String = replaced
        .trim_start_matches('.')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// `invoice_<sanitized number>.pdf`
pub fn document_filename(invoice_number: &str) -> String {
    format!("{PREFIX}{}.{EXTENSION}", sanitize_file_stem(invoice_number))
}
