//! Structs representing ledger outputs that a wallet has recognized as its own.

use fog_protocol::{KeyImage, TxOut, TxOutPublicKey};

/// Where a [`TxOut`] appears on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxOutLocation {
    block_index: u64,
    global_index: u64,
    block_timestamp: Option<u64>,
}

impl TxOutLocation {
    pub fn new(block_index: u64, global_index: u64, block_timestamp: Option<u64>) -> Self {
        TxOutLocation {
            block_index,
            global_index,
            block_timestamp,
        }
    }

    /// Returns the index of the block containing the output.
    pub fn block_index(&self) -> u64 {
        self.block_index
    }

    /// Returns the index of the output among all outputs of the ledger.
    pub fn global_index(&self) -> u64 {
        self.global_index
    }

    /// Returns the timestamp of the containing block, in seconds since the Unix epoch, if
    /// the ledger recorded one.
    pub fn block_timestamp(&self) -> Option<u64> {
        self.block_timestamp
    }
}

/// A [`TxOut`] owned by the account, together with the values recovered when the
/// account's keys decrypted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownTxOut {
    tx_out: TxOut,
    location: TxOutLocation,
    value: u64,
    subaddress_index: u64,
    key_image: KeyImage,
}

impl KnownTxOut {
    pub fn from_parts(
        tx_out: TxOut,
        location: TxOutLocation,
        value: u64,
        subaddress_index: u64,
        key_image: KeyImage,
    ) -> Self {
        KnownTxOut {
            tx_out,
            location,
            value,
            subaddress_index,
            key_image,
        }
    }

    pub fn tx_out(&self) -> &TxOut {
        &self.tx_out
    }

    pub fn public_key(&self) -> &TxOutPublicKey {
        self.tx_out.public_key()
    }

    pub fn location(&self) -> &TxOutLocation {
        &self.location
    }

    pub fn block_index(&self) -> u64 {
        self.location.block_index()
    }

    pub fn global_index(&self) -> u64 {
        self.location.global_index()
    }

    /// Returns the unmasked value of the output, in picoMOB.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Returns the index of the account subaddress the output was sent to.
    pub fn subaddress_index(&self) -> u64 {
        self.subaddress_index
    }

    /// Returns the key image that will be published when this output is spent.
    pub fn key_image(&self) -> &KeyImage {
        &self.key_image
    }
}
