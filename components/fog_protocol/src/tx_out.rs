//! Ledger outputs as observed by a Fog client.

use crate::keys::TxOutPublicKey;

/// The blinded amount of a [`TxOut`]: a Pedersen commitment together with the value and
/// token id masked under the shared secret of the recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskedAmount {
    commitment: [u8; 32],
    masked_value: u64,
    masked_token_id: Vec<u8>,
}

impl MaskedAmount {
    /// Constructs a masked amount from its constituent parts.
    pub fn from_parts(commitment: [u8; 32], masked_value: u64, masked_token_id: Vec<u8>) -> Self {
        MaskedAmount {
            commitment,
            masked_value,
            masked_token_id,
        }
    }

    pub fn commitment(&self) -> &[u8; 32] {
        &self.commitment
    }

    pub fn masked_value(&self) -> u64 {
        self.masked_value
    }

    pub fn masked_token_id(&self) -> &[u8] {
        &self.masked_token_id
    }
}

/// A transaction output as it appears on the ledger.
///
/// Everything but the public key is encrypted to the recipient; a client can only learn
/// the value of a `TxOut` it owns, via view-key trial decryption. A `TxOut` never changes
/// once it has been observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    public_key: TxOutPublicKey,
    target_key: [u8; 32],
    masked_amount: Option<MaskedAmount>,
    e_fog_hint: Vec<u8>,
    e_memo: Option<Vec<u8>>,
}

impl TxOut {
    /// Constructs a `TxOut` from its constituent parts.
    pub fn from_parts(
        public_key: TxOutPublicKey,
        target_key: [u8; 32],
        masked_amount: Option<MaskedAmount>,
        e_fog_hint: Vec<u8>,
        e_memo: Option<Vec<u8>>,
    ) -> Self {
        TxOut {
            public_key,
            target_key,
            masked_amount,
            e_fog_hint,
            e_memo,
        }
    }

    /// Returns the public key that identifies this output.
    pub fn public_key(&self) -> &TxOutPublicKey {
        &self.public_key
    }

    /// Returns the one-time target key of this output.
    pub fn target_key(&self) -> &[u8; 32] {
        &self.target_key
    }

    pub fn masked_amount(&self) -> Option<&MaskedAmount> {
        self.masked_amount.as_ref()
    }

    /// Returns the encrypted hint that lets Fog ingest route this output to its recipient.
    pub fn e_fog_hint(&self) -> &[u8] {
        &self.e_fog_hint
    }

    pub fn e_memo(&self) -> Option<&[u8]> {
        self.e_memo.as_deref()
    }
}
