//! Turning local files into upload payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io;
use std::path::Path;

use crate::api::types::FilePayload;

/// Name prefix the backend uses to recognise a project's cover image.
pub const COVER_PREFIX: &str = "cover_";

/// Read `path` and encode it as a [`FilePayload`].
pub fn encode_file(path: &Path) -> io::Result<FilePayload> {
  let bytes = std::fs::read(path)?;
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("not a file: {}", path.display()),
      )
    })?;

  Ok(FilePayload {
    name,
    mime_type: mime_guess::from_path(path)
      .first_or_octet_stream()
      .essence_str()
      .to_string(),
    base64: STANDARD.encode(bytes),
  })
}

/// Encode `path` as a project's cover image.
pub fn encode_cover(path: &Path) -> io::Result<FilePayload> {
  let mut payload = encode_file(path)?;
  payload.name = format!("{}{}", COVER_PREFIX, payload.name);
  Ok(payload)
}
