//! Protobuf message types for the Fog ledger services, and conversions between them and
//! the types of [`fog_protocol`].

use std::error;
use std::fmt;

use fog_protocol::{
    BlockRange, KeyImage, MaskedAmount, TxOut, TxOutMembershipElement, TxOutMembershipProof,
    TxOutPublicKey,
};

#[rustfmt::skip]
#[allow(unknown_lints)]
#[allow(clippy::derive_partial_eq_without_eq)]
pub mod external;

#[rustfmt::skip]
#[allow(unknown_lints)]
#[allow(clippy::derive_partial_eq_without_eq)]
pub mod ledger;

/// Errors that can occur when converting a protobuf message into its domain type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// A required sub-message was not present.
    MissingField(&'static str),
    /// A fixed-size byte field had the wrong length.
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A range or index field was internally inconsistent.
    InvalidRange(&'static str),
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtoError::MissingField(field) => write!(f, "Expected field missing: {}", field),
            ProtoError::InvalidLength {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Field {} has length {}, expected {}",
                field, actual, expected
            ),
            ProtoError::InvalidRange(field) => write!(f, "Field {} has an invalid range", field),
        }
    }
}

impl error::Error for ProtoError {}

fn read_32(field: &'static str, bytes: &[u8]) -> Result<[u8; 32], ProtoError> {
    bytes.try_into().map_err(|_| ProtoError::InvalidLength {
        field,
        expected: 32,
        actual: bytes.len(),
    })
}

fn compressed(bytes: &[u8; 32]) -> external::CompressedRistretto {
    external::CompressedRistretto {
        data: bytes.to_vec(),
    }
}

impl TryFrom<external::TxOut> for TxOut {
    type Error = ProtoError;

    fn try_from(value: external::TxOut) -> Result<Self, Self::Error> {
        let public_key = value
            .public_key
            .ok_or(ProtoError::MissingField("public_key"))?;
        let target_key = value
            .target_key
            .ok_or(ProtoError::MissingField("target_key"))?;
        let masked_amount = value
            .masked_amount
            .map(|amount| {
                let commitment = amount
                    .commitment
                    .ok_or(ProtoError::MissingField("masked_amount.commitment"))?;
                Ok(MaskedAmount::from_parts(
                    read_32("masked_amount.commitment", &commitment.data)?,
                    amount.masked_value,
                    amount.masked_token_id,
                ))
            })
            .transpose()?;

        Ok(TxOut::from_parts(
            TxOutPublicKey::from_bytes(read_32("public_key", &public_key.data)?),
            read_32("target_key", &target_key.data)?,
            masked_amount,
            value.e_fog_hint,
            value.e_memo,
        ))
    }
}

impl From<&TxOut> for external::TxOut {
    fn from(tx_out: &TxOut) -> Self {
        external::TxOut {
            masked_amount: tx_out.masked_amount().map(|amount| external::MaskedAmount {
                commitment: Some(compressed(amount.commitment())),
                masked_value: amount.masked_value(),
                masked_token_id: amount.masked_token_id().to_vec(),
            }),
            target_key: Some(compressed(tx_out.target_key())),
            public_key: Some(compressed(tx_out.public_key().as_ref())),
            e_fog_hint: tx_out.e_fog_hint().to_vec(),
            e_memo: tx_out.e_memo().map(|memo| memo.to_vec()),
        }
    }
}

impl TryFrom<external::TxOutMembershipProof> for TxOutMembershipProof {
    type Error = ProtoError;

    fn try_from(value: external::TxOutMembershipProof) -> Result<Self, Self::Error> {
        let elements = value
            .elements
            .into_iter()
            .map(|element| {
                let range = element.range.ok_or(ProtoError::MissingField("elements.range"))?;
                let hash = element.hash.ok_or(ProtoError::MissingField("elements.hash"))?;
                TxOutMembershipElement::new(
                    range.from,
                    range.to,
                    read_32("elements.hash", &hash.data)?,
                )
                .ok_or(ProtoError::InvalidRange("elements.range"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        TxOutMembershipProof::new(value.index, value.highest_index, elements)
            .ok_or(ProtoError::InvalidRange("index"))
    }
}

impl From<&TxOutMembershipProof> for external::TxOutMembershipProof {
    fn from(proof: &TxOutMembershipProof) -> Self {
        external::TxOutMembershipProof {
            index: proof.index(),
            highest_index: proof.highest_index(),
            elements: proof
                .elements()
                .iter()
                .map(|element| external::TxOutMembershipElement {
                    range: Some(external::Range {
                        from: element.from(),
                        to: element.to(),
                    }),
                    hash: Some(external::TxOutMembershipHash {
                        data: element.hash().to_vec(),
                    }),
                })
                .collect(),
        }
    }
}

impl TryFrom<&external::KeyImage> for KeyImage {
    type Error = ProtoError;

    fn try_from(value: &external::KeyImage) -> Result<Self, Self::Error> {
        read_32("key_image", &value.data).map(KeyImage::from_bytes)
    }
}

impl From<&KeyImage> for external::KeyImage {
    fn from(key_image: &KeyImage) -> Self {
        external::KeyImage {
            data: key_image.as_bytes().to_vec(),
        }
    }
}

impl From<&BlockRange> for ledger::BlockRange {
    fn from(range: &BlockRange) -> Self {
        ledger::BlockRange {
            start_block: range.start(),
            end_block: range.end(),
        }
    }
}
