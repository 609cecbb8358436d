/*
 * Responsibility
 * - 公開 ID ↔ 内部 ID の変換 (encode/decode)
 * - 方式 (sqids) の詳細をここに閉じ込める
 * - Extractor / response 組み立てからはこの service を使う
 */
use sqids::{Error as SqidsError, Sqids};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdCodecError>;

#[derive(Debug, Error)]
pub enum IdCodecError {
    #[error("SQIDS_MIN_LENGTH must be between 0 and 255, got {value}")]
    InvalidMinLength { value: usize },
    #[error("Sqids error: {0}")]
    Sqids(#[from] SqidsError),
    #[error("id must be non-negative, got {value}")]
    NegativeId { value: i64 },
    #[error("invalid public id format")]
    DecodeInvalidFormat,
    #[error("decoded id is out of range")]
    DecodeOutOfRange,
}

#[derive(Clone, Debug)]
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: usize, alphabet: &str) -> Result<Self> {
        let min_length: u8 = min_length
            .try_into()
            .map_err(|_| IdCodecError::InvalidMinLength { value: min_length })?;

        let sqids = Sqids::builder()
            .min_length(min_length)
            .alphabet(alphabet.chars().collect())
            .build()?;

        Ok(Self { sqids })
    }

    pub fn encode(&self, id: i64) -> Result<String> {
        if id < 0 {
            return Err(IdCodecError::NegativeId { value: id });
        }
        Ok(self.sqids.encode(&[id as u64])?)
    }

    pub fn decode(&self, public_id: &str) -> Result<i64> {
        let nums = self.sqids.decode(public_id);
        if nums.len() != 1 {
            return Err(IdCodecError::DecodeInvalidFormat);
        }
        // sqids decodes many strings; only the canonical encoding is accepted.
        if self.sqids.encode(&nums)? != public_id {
            return Err(IdCodecError::DecodeInvalidFormat);
        }
        i64::try_from(nums[0]).map_err(|_| IdCodecError::DecodeOutOfRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SQIDS_ALPHABET;

    fn codec() -> IdCodec {
        IdCodec::new(10, DEFAULT_SQIDS_ALPHABET).unwrap()
    }

    #[test]
    fn encoded_ids_have_min_length_and_decode_back() {
        let codec = codec();
        let public = codec.encode(7).unwrap();

        assert!(public.len() >= 10);
        assert_eq!(codec.decode(&public).unwrap(), 7);
    }

    #[test]
    fn rejects_garbage_and_non_canonical_ids() {
        let codec = codec();

        assert!(matches!(
            codec.decode(""),
            Err(IdCodecError::DecodeInvalidFormat)
        ));
        assert!(matches!(
            codec.decode("not-a-valid-id!"),
            Err(IdCodecError::DecodeInvalidFormat)
        ));

        let public = codec.encode(7).unwrap();
        let shortened = &public[..public.len() - 1];
        assert!(codec.decode(shortened).is_err());
    }

    #[test]
    fn rejects_negative_ids_and_oversized_min_length() {
        assert!(matches!(
            codec().encode(-1),
            Err(IdCodecError::NegativeId { value: -1 })
        ));
        assert!(matches!(
            IdCodec::new(300, DEFAULT_SQIDS_ALPHABET),
            Err(IdCodecError::InvalidMinLength { value: 300 })
        ));
    }
}
