//! Streaming CRC32 and MD5 digests used as change-detection keys.

use std::io::{BufReader, Read};

use md5::{Digest as _, Md5};

use crate::error::AssetReadError;
use crate::fs_view::FileSystemView;
use crate::models::FileDigest;

const CHUNK_SIZE: usize = 8192;

/// CRC32 and MD5 of one byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digest {
  /// IEEE CRC32 checksum.
  pub crc32: u32,
  /// MD5 digest bytes.
  pub md5: [u8; 16],
}

/// Compute both digests in a single pass over `reader`.
///
/// The input is consumed in fixed-size chunks so arbitrarily large streams never have to be
/// held in memory.
pub fn digest<R: Read>(reader: R) -> std::io::Result<Digest> {
  let mut reader = BufReader::new(reader);
  let mut crc = crc32fast::Hasher::new();
  let mut md5 = Md5::new();
  let mut buffer = [0u8; CHUNK_SIZE];

  loop {
    let bytes_read = match reader.read(&mut buffer) {
      Ok(0) => break,
      Ok(n) => n,
      Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
      Err(err) => return Err(err),
    };
    crc.update(&buffer[..bytes_read]);
    md5.update(&buffer[..bytes_read]);
  }

  Ok(Digest {
    crc32: crc.finalize(),
    md5: md5.finalize().into(),
  })
}

/// Digest a project file through the provided view.
pub fn digest_file<V: FileSystemView + ?Sized>(
  view: &V,
  path: &str,
) -> Result<FileDigest, AssetReadError> {
  let into_error = |source| AssetReadError {
    path: path.to_string(),
    source,
  };
  let reader = view.open(path).map_err(into_error)?;
  let Digest { crc32, md5 } = digest(reader).map_err(into_error)?;
  Ok(FileDigest {
    path: path.to_string(),
    crc32,
    md5,
  })
}

/// Render a CRC32 value as eight lower-case hex digits.
pub fn crc32_hex(value: u32) -> String {
  format!("{value:08x}")
}

/// Render an MD5 digest as 32 lower-case hex digits.
pub fn md5_hex(value: &[u8; 16]) -> String {
  value.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// MD5 of a string, rendered as hex. Used for hashed bundle names.
pub fn md5_hex_of(text: &str) -> String {
  let bytes: [u8; 16] = Md5::digest(text.as_bytes()).into();
  md5_hex(&bytes)
}
