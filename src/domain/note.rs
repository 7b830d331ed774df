use alloy::primitives::B256;
use rand::Rng;
use serde::{
    Deserialize,
    Serialize,
};

use crate::domain::field::{
    FieldElement,
    FieldInput,
};

/// The depositor's secret preimage: a nullifier revealed (hashed) at
/// withdrawal to prevent double-spends, and a blinding secret. The
/// commitment binding the two is computed by the external proving toolchain
/// and inserted as a tree leaf at deposit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositNote {
    pub nullifier: FieldElement,
    pub secret: FieldElement,
}

impl DepositNote {
    /// Generate a fresh note. Scalars are drawn as 31 random bytes so they
    /// sit below the field modulus without reduction bias.
    pub fn random() -> Self {
        Self {
            nullifier: random_scalar(),
            secret: random_scalar(),
        }
    }
}

fn random_scalar() -> FieldElement {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes[1..]);
    FieldInput::from(B256::from(bytes))
        .to_field()
        .expect("31-byte scalar is below the modulus")
}
