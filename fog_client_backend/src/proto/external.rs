/// A compressed Ristretto point.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompressedRistretto {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
/// A key image, as published in a transaction input when an output is spent.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyImage {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
/// The amount of a TxOut, blinded by the shared secret of its recipient.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaskedAmount {
    /// A Pedersen commitment `v*H + b*G`
    #[prost(message, optional, tag = "1")]
    pub commitment: ::core::option::Option<CompressedRistretto>,
    /// `masked_value = value XOR_8 Blake2B("value_mask" || shared_secret)`
    #[prost(fixed64, tag = "2")]
    pub masked_value: u64,
    /// `masked_token_id = token_id XOR_8 Blake2B("token_id_mask" || shared_secret)`
    #[prost(bytes = "vec", tag = "3")]
    pub masked_token_id: ::prost::alloc::vec::Vec<u8>,
}
/// A transaction output.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxOut {
    #[prost(message, optional, tag = "1")]
    pub masked_amount: ::core::option::Option<MaskedAmount>,
    /// Public key.
    #[prost(message, optional, tag = "2")]
    pub target_key: ::core::option::Option<CompressedRistretto>,
    /// Public key.
    #[prost(message, optional, tag = "3")]
    pub public_key: ::core::option::Option<CompressedRistretto>,
    /// Encrypted fog hint payload.
    #[prost(bytes = "vec", tag = "4")]
    pub e_fog_hint: ::prost::alloc::vec::Vec<u8>,
    /// Encrypted memo, absent for outputs created before memos were introduced.
    #[prost(bytes = "vec", optional, tag = "5")]
    pub e_memo: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}
/// An inclusive range of leaf indices.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Range {
    #[prost(uint64, tag = "1")]
    pub from: u64,
    #[prost(uint64, tag = "2")]
    pub to: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxOutMembershipHash {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxOutMembershipElement {
    #[prost(message, optional, tag = "1")]
    pub range: ::core::option::Option<Range>,
    #[prost(message, optional, tag = "2")]
    pub hash: ::core::option::Option<TxOutMembershipHash>,
}
/// A Merkle proof-of-membership for the TxOut at the given index, relative to the tree
/// whose last leaf is `highest_index`.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxOutMembershipProof {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub highest_index: u64,
    #[prost(message, repeated, tag = "3")]
    pub elements: ::prost::alloc::vec::Vec<TxOutMembershipElement>,
}
