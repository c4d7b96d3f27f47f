pub mod index;
pub mod insights;
pub mod notes;
pub mod reflect;
pub mod store;
pub mod types;

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Decode a sqlite-vec float32 blob. `None` if the length is not a multiple of four.
pub fn embedding_from_bytes(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let v = vec![0.25f32, -1.5, 3.0];
        let bytes = embedding_to_bytes(&v).to_vec();
        assert_eq!(bytes.len(), 12);
        assert_eq!(embedding_from_bytes(&bytes), Some(v));
    }

    #[test]
    fn ragged_blob_is_rejected() {
        assert_eq!(embedding_from_bytes(&[0, 1, 2]), None);
    }
}
