use crate::error::Error;
use crate::Generator;
use burrow_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use burrow_core::{CanonicalUrl, ShortCode};
use sha2::{Digest, Sha256};
use typed_builder::TypedBuilder;

pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Number of digest bytes fed into the encoder.
///
/// 128 bits leave far more entropy than the widest code needs, so the
/// low-order base58 digits of this value are uniform over the alphabet.
const ENCODED_DIGEST_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct HashGeneratorSettings {
    /// Length of the produced codes, in the range `[6, 10]`.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub length: usize,
}

impl Default for HashGeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Derives short codes from a SHA-256 digest of the canonical URL.
///
/// Attempt 0 hashes the URL alone, so the same URL always yields the same
/// first candidate. Later attempts mix a counter into the digest:
/// `sha256(url || 0x00 || attempt_be)`.
#[derive(Debug, Clone)]
pub struct HashGenerator {
    length: usize,
}

impl HashGenerator {
    pub fn new(settings: HashGeneratorSettings) -> Result<Self, Error> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&settings.length) {
            return Err(Error::InvalidLength {
                length: settings.length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }

        Ok(Self {
            length: settings.length,
        })
    }

    fn digest(url: &CanonicalUrl, attempt: u32) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        if attempt > 0 {
            hasher.update([0u8]);
            hasher.update(attempt.to_be_bytes());
        }
        hasher.finalize().into()
    }

    fn encode(&self, digest: &[u8; 32]) -> String {
        // bs58 writes one '1' per leading zero byte, so 16 input bytes always
        // encode to at least 16 characters and the tail is the low-order digits.
        let encoded = bs58::encode(&digest[..ENCODED_DIGEST_BYTES]).into_string();
        encoded[encoded.len() - self.length..].to_string()
    }
}

impl Default for HashGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl Generator for HashGenerator {
    fn candidate(&self, url: &CanonicalUrl, attempt: u32) -> ShortCode {
        let digest = Self::digest(url, attempt);
        ShortCode::new_unchecked(self.encode(&digest))
    }
}
