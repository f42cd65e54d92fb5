// mysql-backup/src/backup/compression.rs
use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Gzip-wraps `payload` at maximum compression.
pub fn gzip_compress(payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// Inverse of [`gzip_compress`].
pub fn gzip_decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload)?;
    Ok(payload)
}

/// Decodes a zlib-wrapped stream, the container older dumps were written with.
pub fn zlib_decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload)?;
    Ok(payload)
}
