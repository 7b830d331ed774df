//! Canonical BN254 field-element codec.
//!
//! Every leaf and every internal node of the tree is a residue of the BN254
//! scalar field. Inputs arrive from foreign systems in several shapes (hex
//! strings with or without a radix marker, decimal strings, raw integers)
//! and MUST be reduced into `[0, p)` before use: a non-canonical value
//! silently breaks root agreement with the on-chain tree.

use std::{
    fmt,
    sync::OnceLock,
};

use alloy::primitives::{
    B256,
    U256,
};
use ark_bn254::Fr;
use ark_ff::{
    BigInteger,
    PrimeField,
};
use num_bigint::BigUint;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use thiserror::Error;

/// Errors from normalizing external input into a field element.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid hex digits in field input: {0:?}")]
    InvalidHexDigits(String),

    #[error("invalid decimal digits in field input: {0:?}")]
    InvalidDecimalDigits(String),
}

/// A canonical residue of the BN254 scalar field, stored as 32 big-endian
/// bytes. Always strictly less than the field modulus; construction goes
/// through [`FieldInput::to_field`] or the `Fr` conversions, both of which
/// reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(B256);

impl FieldElement {
    pub const ZERO: Self = Self(B256::ZERO);

    /// Convert from an ark field element (already reduced by construction).
    pub fn from_fr(value: Fr) -> Self {
        let bytes = value.into_bigint().to_bytes_be();
        Self(B256::from_slice(&bytes))
    }

    /// Convert to an ark field element for arithmetic.
    pub fn to_fr(&self) -> Fr {
        Fr::from_be_bytes_mod_order(self.0.as_ref())
    }

    /// The raw 32-byte big-endian form.
    pub fn as_b256(&self) -> B256 {
        self.0
    }

    /// Unprefixed lowercase 64-digit hex, the form used in the state file.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        FieldInput::Hex(raw)
            .to_field()
            .map_err(serde::de::Error::custom)
    }
}

/// External input to the codec. A closed sum replaces the original's
/// duck-typed coercion: strings are tagged as hex or decimal by the caller,
/// integers come in as `U256`, and nothing else can reach the reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    /// Decimal digits, optionally with a leading `-` (reduced with true
    /// modulo, so `-1` maps to `p - 1`).
    Decimal(String),
    /// Hex digits, optionally `0x`/`0X`-prefixed, any case, any length.
    Hex(String),
    /// A raw 256-bit unsigned integer.
    Uint(U256),
}

impl FieldInput {
    /// Reduce this input into a canonical field element.
    pub fn to_field(&self) -> Result<FieldElement, FieldError> {
        match self {
            Self::Hex(raw) => {
                let trimmed = raw.trim();
                let digits = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .unwrap_or(trimmed);
                if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(FieldError::InvalidHexDigits(raw.clone()));
                }
                if digits.is_empty() {
                    return Ok(FieldElement::ZERO);
                }
                let value = BigUint::parse_bytes(digits.as_bytes(), 16)
                    .ok_or_else(|| FieldError::InvalidHexDigits(raw.clone()))?;
                Ok(reduce(&value))
            }
            Self::Decimal(raw) => {
                let trimmed = raw.trim();
                let (negative, digits) = match trimmed.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, trimmed),
                };
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(FieldError::InvalidDecimalDigits(raw.clone()));
                }
                let value = BigUint::parse_bytes(digits.as_bytes(), 10)
                    .ok_or_else(|| FieldError::InvalidDecimalDigits(raw.clone()))?;
                let reduced = reduce(&value);
                if negative && reduced != FieldElement::ZERO {
                    // true modulo: -x ≡ p - (x mod p)
                    let negated = modulus() - BigUint::from_bytes_be(reduced.as_b256().as_ref());
                    Ok(reduce(&negated))
                } else {
                    Ok(reduced)
                }
            }
            Self::Uint(value) => Ok(FieldElement::from_fr(Fr::from_be_bytes_mod_order(
                &value.to_be_bytes::<32>(),
            ))),
        }
    }

    /// The input as the caller supplied it, recorded as the leaf's opaque
    /// payload.
    pub fn raw(&self) -> String {
        match self {
            Self::Decimal(raw) | Self::Hex(raw) => raw.clone(),
            Self::Uint(value) => value.to_string(),
        }
    }
}

impl From<u64> for FieldInput {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl From<U256> for FieldInput {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<B256> for FieldInput {
    fn from(value: B256) -> Self {
        Self::Uint(U256::from_be_bytes(value.0))
    }
}

impl From<FieldElement> for FieldInput {
    fn from(value: FieldElement) -> Self {
        Self::Uint(U256::from_be_bytes(value.as_b256().0))
    }
}

fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be()))
}

fn reduce(value: &BigUint) -> FieldElement {
    let reduced = value % modulus();
    let bytes = reduced.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    FieldElement(B256::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULUS_DEC: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495617";

    #[test]
    fn test_hex_representations_equivalent() {
        let plain = FieldInput::Hex("2a".into()).to_field().unwrap();
        let prefixed = FieldInput::Hex("0x2a".into()).to_field().unwrap();
        let upper = FieldInput::Hex("0X2A".into()).to_field().unwrap();
        let padded = FieldInput::Hex("0x000000002a".into()).to_field().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain, upper);
        assert_eq!(plain, padded);
        assert_eq!(plain, FieldInput::from(42u64).to_field().unwrap());
    }

    #[test]
    fn test_empty_hex_is_zero() {
        assert_eq!(
            FieldInput::Hex("0x".into()).to_field().unwrap(),
            FieldElement::ZERO
        );
    }

    #[test]
    fn test_invalid_hex_rejected() {
        let err = FieldInput::Hex("0xzz".into()).to_field().unwrap_err();
        assert!(matches!(err, FieldError::InvalidHexDigits(_)));
    }

    #[test]
    fn test_invalid_decimal_rejected() {
        let err = FieldInput::Decimal("12a".into()).to_field().unwrap_err();
        assert!(matches!(err, FieldError::InvalidDecimalDigits(_)));
        let err = FieldInput::Decimal("".into()).to_field().unwrap_err();
        assert!(matches!(err, FieldError::InvalidDecimalDigits(_)));
    }

    #[test]
    fn test_values_at_and_above_modulus_reduce() {
        let p = FieldInput::Decimal(MODULUS_DEC.into()).to_field().unwrap();
        assert_eq!(p, FieldElement::ZERO);

        let p_plus_one = FieldInput::Decimal(format!(
            "{}",
            BigUint::parse_bytes(MODULUS_DEC.as_bytes(), 10).unwrap() + 1u32
        ))
        .to_field()
        .unwrap();
        assert_eq!(p_plus_one, FieldInput::from(1u64).to_field().unwrap());
    }

    #[test]
    fn test_negative_decimal_true_modulo() {
        let minus_one = FieldInput::Decimal("-1".into()).to_field().unwrap();
        assert_eq!(
            minus_one.to_hex(),
            "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000000"
        );
        // -0 is still zero, not p
        let minus_zero = FieldInput::Decimal("-0".into()).to_field().unwrap();
        assert_eq!(minus_zero, FieldElement::ZERO);
    }

    #[test]
    fn test_decimal_matches_hex() {
        let dec = FieldInput::Decimal("255".into()).to_field().unwrap();
        let hx = FieldInput::Hex("ff".into()).to_field().unwrap();
        assert_eq!(dec, hx);
    }

    #[test]
    fn test_display_and_serde_round_trip() {
        let value = FieldInput::Hex("0xDEADBEEF".into()).to_field().unwrap();
        assert_eq!(
            value.to_string(),
            "0x00000000000000000000000000000000000000000000000000000000deadbeef"
        );
        let json = serde_json::to_string(&value).unwrap();
        let back: FieldElement = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn test_fr_round_trip() {
        let value = FieldInput::Decimal("123456789".into()).to_field().unwrap();
        assert_eq!(FieldElement::from_fr(value.to_fr()), value);
    }

    #[test]
    fn test_hex_and_decimal_tags_disambiguate() {
        // "10" is 16 as hex and 10 as decimal; the sum type forces the
        // caller to say which one they mean.
        let as_hex = FieldInput::Hex("10".into()).to_field().unwrap();
        let as_dec = FieldInput::Decimal("10".into()).to_field().unwrap();
        assert_ne!(as_hex, as_dec);
    }
}
