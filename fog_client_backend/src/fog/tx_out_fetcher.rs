use fog_protocol::BlockRange;
use futures_util::stream::BoxStream;

use crate::{error::ConnectionError, wallet::KnownTxOut};

/// How far the account's incremental view query has progressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxOutFetchCursor {
    next_event_id: u64,
    block_count: u64,
}

impl TxOutFetchCursor {
    pub fn from_parts(next_event_id: u64, block_count: u64) -> Self {
        TxOutFetchCursor {
            next_event_id,
            block_count,
        }
    }

    /// Returns the id of the first view-service event not yet consumed.
    pub fn next_event_id(&self) -> u64 {
        self.next_event_id
    }

    /// Returns the number of ledger blocks whose outputs have been searched for the
    /// account.
    pub fn block_count(&self) -> u64 {
        self.block_count
    }
}

/// One partial result of an incremental output fetch.
#[derive(Clone, Debug, Default)]
pub struct TxOutFetchBatch {
    /// Newly discovered outputs owned by the account.
    pub tx_outs: Vec<KnownTxOut>,
    /// Blocks the view service could not search for the account, which must be scanned
    /// with the view key instead.
    pub missed_block_ranges: Vec<BlockRange>,
    /// The cursor reached once this batch has been applied.
    pub cursor: TxOutFetchCursor,
}

/// The incremental owned-output query of the Fog view service.
///
/// Implementations resume from `cursor` and yield batches until they have caught up with
/// the view service. The stream ends after the last batch; an `Err` item ends the fetch,
/// and any batches yielded before it remain valid.
pub trait TxOutFetcher: Send + Sync {
    fn fetch_tx_outs(
        &self,
        cursor: TxOutFetchCursor,
    ) -> BoxStream<'_, Result<TxOutFetchBatch, ConnectionError>>;
}

impl<F: TxOutFetcher + ?Sized> TxOutFetcher for std::sync::Arc<F> {
    fn fetch_tx_outs(
        &self,
        cursor: TxOutFetchCursor,
    ) -> BoxStream<'_, Result<TxOutFetchBatch, ConnectionError>> {
        (**self).fetch_tx_outs(cursor)
    }
}
