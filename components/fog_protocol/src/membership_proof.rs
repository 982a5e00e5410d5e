//! Merkle membership proofs for ledger outputs.
//!
//! A [`TxOutMembershipProof`] binds a [`TxOut`] to the root of the ledger's output tree at
//! a particular ledger size. The proof is treated as opaque data here: it is fetched,
//! paired with the output it proves, and handed to transaction construction, which
//! performs the cryptographic verification.
//!
//! [`TxOut`]: crate::tx_out::TxOut

/// One node of a Merkle authentication path, covering the inclusive range of leaf
/// indices `from..=to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutMembershipElement {
    from: u64,
    to: u64,
    hash: [u8; 32],
}

impl TxOutMembershipElement {
    /// Constructs a path element, returning `None` if `from > to`.
    pub fn new(from: u64, to: u64, hash: [u8; 32]) -> Option<Self> {
        (from <= to).then_some(TxOutMembershipElement { from, to, hash })
    }

    /// Returns the first leaf index covered by this node.
    pub fn from(&self) -> u64 {
        self.from
    }

    /// Returns the last leaf index covered by this node.
    pub fn to(&self) -> u64 {
        self.to
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }
}

/// A proof that the output at global index `index` is a leaf of the output tree whose
/// last leaf is `highest_index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutMembershipProof {
    index: u64,
    highest_index: u64,
    elements: Vec<TxOutMembershipElement>,
}

impl TxOutMembershipProof {
    /// Constructs a proof from its constituent parts, returning `None` if `index` lies
    /// beyond `highest_index`.
    pub fn new(index: u64, highest_index: u64, elements: Vec<TxOutMembershipElement>) -> Option<Self> {
        (index <= highest_index).then_some(TxOutMembershipProof {
            index,
            highest_index,
            elements,
        })
    }

    /// Returns the global index of the output this proof is for.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the index of the last leaf of the tree the proof was generated against.
    pub fn highest_index(&self) -> u64 {
        self.highest_index
    }

    /// Returns the authentication path, ordered from leaf to root.
    pub fn elements(&self) -> &[TxOutMembershipElement] {
        &self.elements
    }
}
