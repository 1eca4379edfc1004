//! Inline attachment encoding for the intake flow.
//!
//! The remote store keeps attachments embedded in the record itself as data
//! URLs, so the intake flow reads each image file once and encodes it here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use color_eyre::{eyre::eyre, Result};
use std::path::Path;

/// Maximum number of attachments a single record may carry.
pub const MAX_ATTACHMENTS: usize = 2;

/// Encode a local image file as a `data:<mime>;base64,` URL.
///
/// Only the image types the original form accepted are allowed; anything
/// else is rejected before the file is read.
pub fn encode_image(path: &Path) -> Result<String> {
  let mime = mime_for(path).ok_or_else(|| {
    eyre!(
      "Unsupported attachment type: {} (expected png/jpg/jpeg/gif/webp)",
      path.display()
    )
  })?;

  let bytes = std::fs::read(path)
    .map_err(|e| eyre!("Failed to read attachment {}: {}", path.display(), e))?;

  Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Encode a list of attachment paths, enforcing the per-record limit.
pub fn encode_all(paths: &[String]) -> Result<Vec<String>> {
  if paths.len() > MAX_ATTACHMENTS {
    return Err(eyre!(
      "Too many attachments: {} (limit is {})",
      paths.len(),
      MAX_ATTACHMENTS
    ));
  }

  paths
    .iter()
    .map(|p| encode_image(Path::new(p)))
    .collect()
}

fn mime_for(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_lowercase();
  match ext.as_str() {
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    "gif" => Some("image/gif"),
    "webp" => Some("image/webp"),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("gopy-test-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn test_encode_image_data_url() {
    let path = temp_file("a.png", b"\x89PNG");
    let url = encode_image(&path).unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
    std::fs::remove_file(path).ok();
  }

  #[test]
  fn test_encode_rejects_unknown_extension() {
    let path = temp_file("a.pdf", b"%PDF");
    assert!(encode_image(&path).is_err());
    std::fs::remove_file(path).ok();
  }

  #[test]
  fn test_encode_missing_file() {
    assert!(encode_image(Path::new("/nonexistent/gopy.png")).is_err());
  }

  #[test]
  fn test_encode_all_enforces_limit() {
    let paths: Vec<String> = (0..3).map(|i| format!("/tmp/{}.png", i)).collect();
    assert!(encode_all(&paths).is_err());
  }

  #[test]
  fn test_mime_for_case_insensitive() {
    assert_eq!(mime_for(Path::new("x.JPG")), Some("image/jpeg"));
    assert_eq!(mime_for(Path::new("x.webp")), Some("image/webp"));
    assert_eq!(mime_for(Path::new("x")), None);
  }
}
