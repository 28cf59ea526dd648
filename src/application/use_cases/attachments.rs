use crate::domain::session::AttachmentMeta;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use validator::Validate;

pub const TRUNCATION_MARKER: &str = "\n... (truncado)";

/// One uploaded document, already reduced to plain text by the client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachmentInput {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedAttachments {
    pub text: String,
    pub meta: Vec<AttachmentMeta>,
}

/// First 8 hex chars of the SHA-256 of the content.
pub fn fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    hex::encode(digest)[..8].to_string()
}

fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Concatenates every attachment under a `### Fuente: name (fingerprint)`
/// heading. Once the next block would exceed `max_chars` it is cut, the
/// truncation marker is appended and the remaining files are ignored.
/// Files without text still get their metadata recorded.
pub fn consolidate_attachments(
    inputs: &[AttachmentInput],
    max_chars: usize,
) -> ConsolidatedAttachments {
    let mut parts: Vec<String> = Vec::new();
    let mut meta = Vec::with_capacity(inputs.len());
    let mut total = 0usize;

    for input in inputs {
        let print = fingerprint(input.text.as_bytes());
        meta.push(AttachmentMeta {
            filename: input.filename.clone(),
            fingerprint: print.clone(),
            ext: extension_of(&input.filename),
            size_bytes: input.text.len(),
        });

        let text = input.text.trim();
        if text.is_empty() {
            debug!(file = %input.filename, "Attachment without text");
            continue;
        }

        let block = format!("\n\n### Fuente: {} ({})\n{}", input.filename, print, text);
        let block_chars = block.chars().count();
        if total + block_chars > max_chars {
            let keep = max_chars.saturating_sub(total);
            let mut cut: String = block.chars().take(keep).collect();
            cut.push_str(TRUNCATION_MARKER);
            parts.push(cut);
            info!(file = %input.filename, max_chars, "Attachment text truncated");
            break;
        }

        total += block_chars;
        parts.push(block);
    }

    ConsolidatedAttachments {
        text: parts.concat().trim().to_string(),
        meta,
    }
}
