//! *A crate for implementing MobileCoin Fog light clients.*
//!
//! `fog_client_backend` contains the synchronization and spend-preparation core of a
//! Fog client. It keeps an account's owned outputs and their spent status in step with
//! the Fog services, and assembles the rings needed to spend those outputs.
//!
//! - [`account::BalanceUpdater`] runs the balance synchronization pipeline against an
//!   [`account::AccountLock`].
//! - [`fog`] contains the clients for the individual Fog services, each generic over the
//!   transport that reaches it.
//! - [`input::InputPreparer`] fetches rings and builds the inputs of a transaction.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Catch documentation errors caused by code changes.
#![deny(rustdoc::broken_intra_doc_links)]

pub mod account;
pub mod config;
pub mod error;
pub mod fog;
pub mod input;
pub mod proto;
pub mod wallet;

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing;
