//! *A crate for MobileCoin Fog client value types.*
//!
//! `fog_protocol` contains the ledger-facing data types that a Fog light client passes
//! between its synchronization and transaction-preparation components: output
//! identities and key images, ledger outputs and their Merkle membership proofs, block
//! ranges, and balances.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Catch documentation errors caused by code changes.
#![deny(rustdoc::broken_intra_doc_links)]

pub mod block_range;
pub mod keys;
pub mod membership_proof;
pub mod tx_out;
pub mod value;

pub use block_range::{BlockRange, BlockRanges};
pub use keys::{KeyImage, TxOutPublicKey};
pub use membership_proof::{TxOutMembershipElement, TxOutMembershipProof};
pub use tx_out::{MaskedAmount, TxOut};
pub use value::Balance;
