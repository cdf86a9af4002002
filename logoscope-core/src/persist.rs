use crate::error::{CoreError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use logoscope_scanner::ImageCandidate;
use logoscope_scanner::urls;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Decoded payload of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .or_else(|| uri.strip_prefix("DATA:"))
            .ok_or_else(|| CoreError::Decode("not a data URI".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CoreError::Decode("data URI without payload".into()))?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(cleaned)
                .map_err(|e| CoreError::Decode(format!("base64: {}", e)))?
        } else {
            percent_decode(payload)
        };

        Ok(Self {
            mime: if mime.is_empty() { "text/plain".into() } else { mime },
            bytes,
        })
    }

    /// File extension for the MIME type.
    pub fn extension(&self) -> &str {
        match self.mime.as_str() {
            "image/svg+xml" => "svg",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
            other => other
                .strip_prefix("image/")
                .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or("bin"),
        }
    }
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(b) = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(b);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Write one data-URI candidate to `dir/logo_<index>.<ext>`.
///
/// Records the byte size and path on the candidate. Score and the other
/// fields are left alone.
pub fn persist_data_uri(candidate: &mut ImageCandidate, dir: &Path, index: usize) -> Result<PathBuf> {
    let data = DataUri::parse(&candidate.url)?;
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("logo_{}.{}", index, data.extension()));
    fs::write(&path, &data.bytes)?;
    debug!("Saved {} bytes to {}", data.bytes.len(), path.display());

    candidate.byte_size = Some(data.bytes.len());
    candidate.saved_path = Some(path.clone());
    Ok(path)
}

/// Persist every data-URI image candidate. Failures are logged and skipped.
pub fn persist_all(candidates: &mut [ImageCandidate], dir: &Path) -> usize {
    let mut saved = 0;
    for candidate in candidates.iter_mut().filter(|c| urls::is_data_image(&c.url)) {
        match persist_data_uri(candidate, dir, saved + 1) {
            Ok(_) => saved += 1,
            Err(e) => warn!("Could not save inline image ({}): {}", candidate.source_kind.as_str(), e),
        }
    }
    saved
}
