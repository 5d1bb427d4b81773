use std::fmt;

use bitvec::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{definitions::CANONICAL_HASH_BITS, Error};

/// A fixed-length bit string produced by a perceptual or DCT image hash.
///
/// Hashes are compared by hamming distance. Two hashes are only comparable when they are
/// non-empty and of equal length.
///
/// The textual form is lowercase hexadecimal, which is also how hashes are serialized.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameHash {
    bits: BitVec<u64, Msb0>,
}

impl FrameHash {
    /// Parse a hash from hex text, as emitted by the fingerprint extractor.
    ///
    /// * Empty text means the extractor failed to produce a hash, so `Ok(None)` is returned.
    /// * A `0x` prefix is accepted.
    /// * Text shorter than 16 digits is zero-filled up to [`CANONICAL_HASH_BITS`] bits, because
    ///   leading zero nibbles are stripped when hashes are printed as integers.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHash`] if the text contains a non-hex character.
    pub fn from_hex(text: &str) -> Result<Option<Self>, Error> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Ok(None);
        }

        let nibbles = digits
            .chars()
            .map(|c| c.to_digit(16))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| Error::InvalidHash(text.to_owned()))?;

        let num_bits = (nibbles.len() * 4).max(CANONICAL_HASH_BITS);
        let mut bits: BitVec<u64, Msb0> = BitVec::with_capacity(num_bits);
        bits.resize(num_bits - nibbles.len() * 4, false);
        for nibble in nibbles {
            for shift in (0..4).rev() {
                bits.push((nibble >> shift) & 1 == 1);
            }
        }

        Ok(Some(Self { bits }))
    }

    /// Build a hash from raw bits, most significant first.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            bits: bits.into_iter().collect(),
        }
    }

    /// A canonical 64 bit hash.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self {
            bits: BitVec::from_element(value),
        }
    }

    /// Number of bits in the hash.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[must_use]
    pub fn bits(&self) -> &BitSlice<u64, Msb0> {
        &self.bits
    }

    /// The number of differing bits, or `None` if the two hashes cannot be compared.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> Option<u32> {
        if self.is_empty() || self.len() != other.len() {
            return None;
        }

        let distance = self
            .bits
            .iter()
            .by_vals()
            .zip(other.bits.iter().by_vals())
            .filter(|(x, y)| x != y)
            .count();

        u32::try_from(distance).ok()
    }

    /// `1 - hamming_distance / len`, or `None` if the two hashes cannot be compared.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> Option<f64> {
        let distance = self.hamming_distance(other)?;
        Some(1.0 - f64::from(distance) / self.len() as f64)
    }
}

impl fmt::Display for FrameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        //left-pad so that the first nibble is complete.
        let pad = (4 - self.bits.len() % 4) % 4;
        let padded = std::iter::repeat(false)
            .take(pad)
            .chain(self.bits.iter().by_vals());

        for nibble in &padded.chunks(4) {
            let value = nibble.fold(0u32, |acc, bit| (acc << 1) | u32::from(bit));
            let digit = char::from_digit(value, 16).expect("a nibble is always a hex digit");
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl From<FrameHash> for String {
    fn from(hash: FrameHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for FrameHash {
    type Error = Error;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::from_hex(&text)?.ok_or(Error::InvalidHash(text))
    }
}

impl std::str::FromStr for FrameHash {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::try_from(text.to_owned())
    }
}

/// Deserialize an optional hash field, mapping `null` and `""` to `None`.
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<FrameHash>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    match text {
        None => Ok(None),
        Some(text) => FrameHash::from_hex(&text).map_err(serde::de::Error::custom),
    }
}

//Utilities for testing
#[cfg(any(feature = "test-util", test))]
#[doc(hidden)]
pub mod test_util {
    use bitvec::prelude::*;
    use rand::prelude::*;

    use super::FrameHash;
    use crate::definitions::CANONICAL_HASH_BITS;

    #[doc(hidden)]
    impl FrameHash {
        pub fn random_hash(rng: &mut StdRng) -> Self {
            Self::from_u64(rng.random())
        }

        pub fn empty_hash() -> Self {
            Self::from_u64(0)
        }

        pub fn full_hash() -> Self {
            Self::from_u64(u64::MAX)
        }

        /// A copy of this hash with exactly `target_distance` bits flipped.
        #[must_use]
        pub fn hash_with_distance(&self, target_distance: usize, rng: &mut StdRng) -> Self {
            assert!(target_distance <= self.len());
            let mut bits: BitVec<u64, Msb0> = self.bits.clone();
            for idx in rand::seq::index::sample(rng, self.len(), target_distance) {
                let old = bits[idx];
                bits.set(idx, !old);
            }
            let ret = Self { bits };
            assert_eq!(
                self.hamming_distance(&ret),
                u32::try_from(target_distance).ok()
            );
            ret
        }

        pub fn canonical_len() -> usize {
            CANONICAL_HASH_BITS
        }
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::FrameHash;
    use crate::Error;

    #[test]
    fn test_hex_round_trip_keeps_leading_zeros() {
        let hash = FrameHash::from_hex("00ff00ff00ff00ff").unwrap().unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash.to_string(), "00ff00ff00ff00ff");
    }

    #[test]
    fn test_short_hex_is_zero_filled_to_64_bits() {
        let short = FrameHash::from_hex("ff").unwrap().unwrap();
        let full = FrameHash::from_hex("00000000000000ff").unwrap().unwrap();
        assert_eq!(short.len(), 64);
        assert_eq!(short, full);
        assert_eq!(short, FrameHash::from_u64(0xff));
    }

    #[test]
    fn test_long_hex_keeps_its_length() {
        let long = FrameHash::from_hex(&"a".repeat(64)).unwrap().unwrap();
        assert_eq!(long.len(), 256);
    }

    #[test]
    fn test_prefix_and_empty_text() {
        assert_eq!(
            FrameHash::from_hex("0xFF").unwrap(),
            Some(FrameHash::from_u64(0xff))
        );
        assert_eq!(FrameHash::from_hex("").unwrap(), None);
        assert_eq!(FrameHash::from_hex("0x").unwrap(), None);
    }

    #[test]
    fn test_invalid_hex_is_rejected() {
        assert_eq!(
            FrameHash::from_hex("12g4"),
            Err(Error::InvalidHash("12g4".to_string()))
        );
    }

    #[test]
    fn test_distance_between_two_empty_hashes_is_0() {
        let dist = FrameHash::empty_hash().hamming_distance(&FrameHash::empty_hash());
        assert_eq!(Some(0), dist);
    }

    #[test]
    fn test_distance_between_empty_and_full_hash_is_64() {
        let dist = FrameHash::empty_hash().hamming_distance(&FrameHash::full_hash());
        assert_eq!(Some(64), dist);
        assert_eq!(
            FrameHash::empty_hash().similarity(&FrameHash::full_hash()),
            Some(0.0)
        );
    }

    #[test]
    fn test_mismatched_lengths_are_not_comparable() {
        let short = FrameHash::from_u64(7);
        let long = FrameHash::from_hex(&"0".repeat(32)).unwrap().unwrap();
        assert_eq!(short.hamming_distance(&long), None);
        assert_eq!(short.similarity(&long), None);

        let nothing = FrameHash::from_bits(std::iter::empty());
        assert_eq!(nothing.hamming_distance(&nothing), None);
    }

    #[test]
    fn test_similarity_is_one_minus_k_over_64() {
        let mut rng = StdRng::seed_from_u64(1);
        let start = FrameHash::random_hash(&mut rng);
        for k in 0..=64 {
            let other = start.hash_with_distance(k, &mut rng);
            assert_eq!(start.similarity(&other), Some(1.0 - k as f64 / 64.0));
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let mut rng = StdRng::seed_from_u64(2);
        for _i in 0..1_000 {
            let h1 = FrameHash::random_hash(&mut rng);
            let h2 = FrameHash::random_hash(&mut rng);
            let h3 = FrameHash::random_hash(&mut rng);

            let d12 = h1.hamming_distance(&h2).unwrap();
            let d13 = h1.hamming_distance(&h3).unwrap();
            let d23 = h2.hamming_distance(&h3).unwrap();

            assert!(d12 <= d13 + d23);
        }
    }

    #[test]
    fn test_symmetry() {
        let mut rng = StdRng::seed_from_u64(3);
        for _i in 0..1_000 {
            let h1 = FrameHash::random_hash(&mut rng);
            let h2 = FrameHash::random_hash(&mut rng);

            assert_eq!(h1.hamming_distance(&h2), h2.hamming_distance(&h1));
        }
    }

    #[test]
    fn test_serializes_as_hex() {
        let hash = FrameHash::from_u64(0xdead_beef);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"00000000deadbeef\"");
        let back: FrameHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert!(serde_json::from_str::<FrameHash>("\"\"").is_err());
    }
}
