//! Blob encodings for masks and index lists.

use alvox_core::errors::StorageError;

/// Pack a mask into bytes, least significant bit first.
pub fn pack_mask(mask: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; mask.len().div_ceil(8)];
    for (i, _) in mask.iter().enumerate().filter(|(_, labeled)| **labeled) {
        bytes[i / 8] |= 1 << (i % 8);
    }
    bytes
}

/// Unpack `len` bits. The blob must be exactly `ceil(len / 8)` bytes and
/// its padding bits must be zero.
pub fn unpack_mask(bytes: &[u8], len: usize) -> Result<Vec<bool>, StorageError> {
    if bytes.len() != len.div_ceil(8) {
        return Err(StorageError::CorruptRecord {
            details: format!("mask blob of {} bytes cannot hold {len} bits", bytes.len()),
        });
    }
    let padding = len % 8;
    if padding != 0 {
        if let Some(&last) = bytes.last() {
            if last >> padding != 0 {
                return Err(StorageError::CorruptRecord {
                    details: "mask blob has bits set past its length".to_string(),
                });
            }
        }
    }
    Ok((0..len).map(|i| bytes[i / 8] & (1 << (i % 8)) != 0).collect())
}

pub fn encode_indices(indices: &[u32]) -> Vec<u8> {
    indices.iter().flat_map(|i| i.to_le_bytes()).collect()
}

pub fn decode_indices(bytes: &[u8]) -> Result<Vec<u32>, StorageError> {
    if bytes.len() % 4 != 0 {
        return Err(StorageError::CorruptRecord {
            details: format!("index blob of {} bytes is not a u32 array", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
