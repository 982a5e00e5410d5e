/// Requests the outputs at the given global indices, together with membership proofs
/// relative to the ledger as of `merkle_root_block`.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOutputsRequest {
    #[prost(uint64, repeated, tag = "1")]
    pub indices: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, tag = "2")]
    pub merkle_root_block: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOutputsResponse {
    /// One result per requested index.
    #[prost(message, repeated, tag = "1")]
    pub results: ::prost::alloc::vec::Vec<OutputResult>,
    /// The number of blocks in the ledger at the time the request was evaluated.
    #[prost(uint64, tag = "2")]
    pub num_blocks: u64,
    /// The number of TxOuts in the ledger at the time the request was evaluated.
    #[prost(uint64, tag = "3")]
    pub global_txo_count: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OutputResult {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(enumeration = "OutputResultCode", tag = "2")]
    pub result_code: i32,
    #[prost(message, optional, tag = "3")]
    pub output: ::core::option::Option<super::external::TxOut>,
    #[prost(message, optional, tag = "4")]
    pub proof: ::core::option::Option<super::external::TxOutMembershipProof>,
}
/// Queries whether each key image has appeared on the ledger, starting from the given
/// block.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckKeyImagesRequest {
    #[prost(message, repeated, tag = "1")]
    pub queries: ::prost::alloc::vec::Vec<KeyImageQuery>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyImageQuery {
    #[prost(message, optional, tag = "1")]
    pub key_image: ::core::option::Option<super::external::KeyImage>,
    /// Blocks before this index are known not to contain the key image.
    #[prost(fixed64, tag = "2")]
    pub start_block: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckKeyImagesResponse {
    /// The number of blocks in the ledger at the time the request was evaluated.
    #[prost(uint64, tag = "1")]
    pub num_blocks: u64,
    #[prost(uint64, tag = "2")]
    pub global_txo_count: u64,
    /// One result per query, in query order.
    #[prost(message, repeated, tag = "3")]
    pub results: ::prost::alloc::vec::Vec<KeyImageResult>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyImageResult {
    #[prost(message, optional, tag = "1")]
    pub key_image: ::core::option::Option<super::external::KeyImage>,
    /// The block index at which the key image appeared, if `Spent`.
    #[prost(fixed64, tag = "2")]
    pub spent_at: u64,
    #[prost(fixed64, tag = "3")]
    pub timestamp: u64,
    #[prost(enumeration = "KeyImageResultCode", tag = "4")]
    pub key_image_result_code: i32,
}
/// Requests the full contents of the given block ranges.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockRequest {
    #[prost(message, repeated, tag = "1")]
    pub ranges: ::prost::alloc::vec::Vec<BlockRange>,
}
/// A half-open range of block indices.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockRange {
    #[prost(uint64, tag = "1")]
    pub start_block: u64,
    #[prost(uint64, tag = "2")]
    pub end_block: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockResponse {
    #[prost(message, repeated, tag = "1")]
    pub blocks: ::prost::alloc::vec::Vec<BlockData>,
    #[prost(uint64, tag = "2")]
    pub num_blocks: u64,
    #[prost(uint64, tag = "3")]
    pub global_txo_count: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockData {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    /// The number of TxOuts in the ledger up to and including this block.
    #[prost(uint64, tag = "2")]
    pub global_txo_count: u64,
    #[prost(message, repeated, tag = "3")]
    pub outputs: ::prost::alloc::vec::Vec<super::external::TxOut>,
    #[prost(fixed64, tag = "4")]
    pub timestamp: u64,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OutputResultCode {
    IntentionallyUnused = 0,
    /// The output exists and was returned.
    Exists = 1,
    /// The index is beyond the current size of the ledger.
    DoesNotExist = 2,
    /// The server failed to read the output from its database.
    OutputDatabaseError = 3,
}
impl OutputResultCode {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::IntentionallyUnused => "IntentionallyUnused",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
            Self::OutputDatabaseError => "OutputDatabaseError",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "IntentionallyUnused" => Some(Self::IntentionallyUnused),
            "Exists" => Some(Self::Exists),
            "DoesNotExist" => Some(Self::DoesNotExist),
            "OutputDatabaseError" => Some(Self::OutputDatabaseError),
            _ => None,
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KeyImageResultCode {
    Unused = 0,
    /// The key image appears on the ledger at `spent_at`.
    Spent = 1,
    /// The key image does not appear in any block before `num_blocks`.
    NotSpent = 2,
    /// The server failed to evaluate the query.
    KeyImageError = 3,
}
impl KeyImageResultCode {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unused => "Unused",
            Self::Spent => "Spent",
            Self::NotSpent => "NotSpent",
            Self::KeyImageError => "KeyImageError",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "Unused" => Some(Self::Unused),
            "Spent" => Some(Self::Spent),
            "NotSpent" => Some(Self::NotSpent),
            "KeyImageError" => Some(Self::KeyImageError),
            _ => None,
        }
    }
}
