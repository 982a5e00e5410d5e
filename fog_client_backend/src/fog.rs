//! Clients for the Fog ledger and view services.
//!
//! Each remote service is abstracted behind an async trait so that the synchronization
//! logic is independent of the transport used to reach it. The components in this
//! module turn raw service responses into validated domain values:
//!
//! - [`MerkleProofFetcher`] resolves global output indices to outputs and membership
//!   proofs, splitting large requests into concurrent chunks.
//! - [`KeyImageChecker`] learns whether owned outputs have been spent.
//! - [`ViewKeyScanner`] downloads blocks that Fog view could not process for the account
//!   and trial-decrypts them locally.
//! - [`TxOutFetcher`] is the interface of the incremental Fog view query.
//!
//! Every remote call is a suspension point; no component holds account state while
//! awaiting one.

use async_trait::async_trait;

use crate::{
    error::ConnectionError,
    proto::ledger::{
        BlockRequest, BlockResponse, CheckKeyImagesRequest, CheckKeyImagesResponse,
        GetOutputsRequest, GetOutputsResponse,
    },
};

mod key_image;
mod merkle_proof;
mod tx_out_fetcher;
mod view_key_scan;

pub use key_image::{KeyImageChecker, KeyImageSpentStatus};
pub use merkle_proof::MerkleProofFetcher;
pub use tx_out_fetcher::{TxOutFetchBatch, TxOutFetchCursor, TxOutFetcher};
pub use view_key_scan::{ScanningKey, ViewKeyScanner};

/// The Fog ledger service's output query.
#[async_trait]
pub trait FogMerkleProofService: Send + Sync {
    /// Fetches the outputs at the requested global indices along with their membership
    /// proofs.
    async fn get_outputs(
        &self,
        request: GetOutputsRequest,
    ) -> Result<GetOutputsResponse, ConnectionError>;
}

/// The Fog ledger service's key image query.
#[async_trait]
pub trait FogKeyImageService: Send + Sync {
    /// Checks whether each queried key image appears on the ledger.
    async fn check_key_images(
        &self,
        request: CheckKeyImagesRequest,
    ) -> Result<CheckKeyImagesResponse, ConnectionError>;
}

/// The Fog ledger service's raw block query.
#[async_trait]
pub trait FogBlockService: Send + Sync {
    /// Fetches the contents of every block in the requested ranges.
    async fn get_blocks(&self, request: BlockRequest) -> Result<BlockResponse, ConnectionError>;
}

#[async_trait]
impl<S: FogMerkleProofService + ?Sized> FogMerkleProofService for std::sync::Arc<S> {
    async fn get_outputs(
        &self,
        request: GetOutputsRequest,
    ) -> Result<GetOutputsResponse, ConnectionError> {
        (**self).get_outputs(request).await
    }
}

#[async_trait]
impl<S: FogKeyImageService + ?Sized> FogKeyImageService for std::sync::Arc<S> {
    async fn check_key_images(
        &self,
        request: CheckKeyImagesRequest,
    ) -> Result<CheckKeyImagesResponse, ConnectionError> {
        (**self).check_key_images(request).await
    }
}

#[async_trait]
impl<S: FogBlockService + ?Sized> FogBlockService for std::sync::Arc<S> {
    async fn get_blocks(&self, request: BlockRequest) -> Result<BlockResponse, ConnectionError> {
        (**self).get_blocks(request).await
    }
}
