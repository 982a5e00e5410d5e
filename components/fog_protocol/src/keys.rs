use std::array::TryFromSliceError;
use std::fmt;

/// The public key of a [`TxOut`], used as its identity on the ledger.
///
/// Public keys are compared byte-lexicographically; this ordering is what fixes the
/// position of every member of a ring.
///
/// [`TxOut`]: crate::tx_out::TxOut
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct TxOutPublicKey([u8; 32]);

impl fmt::Debug for TxOutPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TxOutPublicKey")
            .field(&hex::encode(self.0))
            .finish()
    }
}

impl fmt::Display for TxOutPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl AsRef<[u8; 32]> for TxOutPublicKey {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<TxOutPublicKey> for [u8; 32] {
    fn from(value: TxOutPublicKey) -> Self {
        value.0
    }
}

impl TryFrom<&[u8]> for TxOutPublicKey {
    type Error = TryFromSliceError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 32]>::try_from(bytes).map(TxOutPublicKey)
    }
}

impl TxOutPublicKey {
    /// Wraps the given compressed Ristretto point as a public key.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        TxOutPublicKey(bytes)
    }

    /// Returns the compressed point as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A key image: the one-way tag that is published on the ledger when the output it was
/// derived from is spent.
///
/// The key image of an owned output is fixed for the lifetime of that output, so it can
/// be queried repeatedly to learn whether the output has been spent.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyImage([u8; 32]);

impl fmt::Debug for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyImage").field(&hex::encode(self.0)).finish()
    }
}

impl AsRef<[u8; 32]> for KeyImage {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl TryFrom<&[u8]> for KeyImage {
    type Error = TryFromSliceError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 32]>::try_from(bytes).map(KeyImage)
    }
}

impl KeyImage {
    /// Wraps the given compressed Ristretto point as a key image.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        KeyImage(bytes)
    }

    /// Returns the compressed point as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyImage, TxOutPublicKey};

    #[test]
    fn public_keys_order_lexicographically() {
        let mut low = [0u8; 32];
        low[0] = 1;
        let mut high = [0u8; 32];
        high[0] = 1;
        high[31] = 1;

        assert!(TxOutPublicKey::from_bytes(low) < TxOutPublicKey::from_bytes(high));
        assert!(TxOutPublicKey::from_bytes([0xff; 32]) > TxOutPublicKey::from_bytes(high));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(TxOutPublicKey::try_from(&[0u8; 31][..]).is_err());
        assert!(KeyImage::try_from(&[0u8; 33][..]).is_err());
        assert_eq!(
            KeyImage::try_from(&[7u8; 32][..]).unwrap(),
            KeyImage::from_bytes([7; 32])
        );
    }
}
