//! JSON codec helpers shared by the repository layers.
//!
//! Every repository in the workspace persists typed records as JSON bytes.
//! These helpers centralize the error mapping so serde failures surface as
//! [`StorageError::Serialization`] with the source preserved.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{StorageError, StorageResult};

/// Serializes a record to its stored byte form.
pub fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| StorageError::serialization("encoding record", Some(std::sync::Arc::new(e))))
}

/// Deserializes a record from its stored byte form.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::serialization("decoding record", Some(std::sync::Arc::new(e))))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: i64,
        label: String,
    }

    #[test]
    fn round_trip() {
        let sample = Sample { id: 7, label: "ill".into() };
        let bytes = encode(&sample).expect("encode");
        let back: Sample = decode(&bytes).expect("decode");
        assert_eq!(back, sample);
    }

    #[test]
    fn decode_garbage_is_serialization_error() {
        let err = decode::<Sample>(b"not json").expect_err("must fail");
        assert!(matches!(err, StorageError::Serialization { .. }));
    }
}
