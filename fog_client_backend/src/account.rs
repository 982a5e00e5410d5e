//! The account state kept by a Fog client, and the pipeline that keeps it up to date.
//!
//! An [`Account`] is only ever touched through an [`AccountLock`], which hands out
//! scoped read or write access for the duration of a closure. Remote calls are never made
//! while a lock is held: callers read what they need, release the lock, await the
//! service, and then apply the result in a single write.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use fog_protocol::{Balance, BlockRange, BlockRanges, KeyImage, TxOutPublicKey};
use tracing::debug;

use crate::{
    fog::{KeyImageSpentStatus, TxOutFetchBatch, TxOutFetchCursor},
    wallet::KnownTxOut,
};

mod balance_updater;

pub use balance_updater::BalanceUpdater;

/// The spend-tracking state of one owned output's key image.
///
/// Once spent, a tracker never becomes unspent again, and the block from which the next
/// query starts only ever moves forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyImageTracker {
    key_image: KeyImage,
    spent_block_index: Option<u64>,
    next_query_block_index: u64,
}

impl KeyImageTracker {
    /// Constructs a tracker for an output received in block `received_block_index`.
    pub fn new(key_image: KeyImage, received_block_index: u64) -> Self {
        KeyImageTracker {
            key_image,
            spent_block_index: None,
            next_query_block_index: received_block_index,
        }
    }

    pub fn key_image(&self) -> &KeyImage {
        &self.key_image
    }

    pub fn is_spent(&self) -> bool {
        self.spent_block_index.is_some()
    }

    /// Returns the index of the block in which the key image was published, if known.
    pub fn spent_block_index(&self) -> Option<u64> {
        self.spent_block_index
    }

    /// Returns the block index from which the next spent-status query should start.
    pub fn next_query_block_index(&self) -> u64 {
        self.next_query_block_index
    }

    /// Records the result of a spent-status query.
    pub fn apply(&mut self, status: KeyImageSpentStatus) {
        if self.is_spent() {
            return;
        }
        match status {
            KeyImageSpentStatus::Spent { block_index } => {
                self.spent_block_index = Some(block_index);
            }
            KeyImageSpentStatus::NotSpent {
                checked_block_count,
            } => {
                self.next_query_block_index = self.next_query_block_index.max(checked_block_count);
            }
        }
    }
}

/// An owned output together with the spend-tracking state of its key image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutTracker {
    known_tx_out: KnownTxOut,
    key_image_tracker: KeyImageTracker,
}

impl TxOutTracker {
    pub fn new(known_tx_out: KnownTxOut) -> Self {
        let key_image_tracker =
            KeyImageTracker::new(*known_tx_out.key_image(), known_tx_out.block_index());
        TxOutTracker {
            known_tx_out,
            key_image_tracker,
        }
    }

    pub fn known_tx_out(&self) -> &KnownTxOut {
        &self.known_tx_out
    }

    pub fn key_image_tracker(&self) -> &KeyImageTracker {
        &self.key_image_tracker
    }

    pub fn is_spent(&self) -> bool {
        self.key_image_tracker.is_spent()
    }
}

/// The Fog synchronization state of a single account.
#[derive(Clone, Debug, Default)]
pub struct Account {
    tx_outs: BTreeMap<TxOutPublicKey, TxOutTracker>,
    key_images: HashMap<KeyImage, TxOutPublicKey>,
    unscanned_block_ranges: BlockRanges,
    fetch_cursor: TxOutFetchCursor,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how far the incremental view query has progressed.
    pub fn fetch_cursor(&self) -> TxOutFetchCursor {
        self.fetch_cursor
    }

    /// Returns the blocks that the view service missed and that have not yet been
    /// scanned with the view key.
    pub fn unscanned_block_ranges(&self) -> &BlockRanges {
        &self.unscanned_block_ranges
    }

    /// Returns the tracker of every owned output, ordered by public key.
    pub fn tx_outs(&self) -> impl Iterator<Item = &TxOutTracker> {
        self.tx_outs.values()
    }

    pub fn tx_out(&self, public_key: &TxOutPublicKey) -> Option<&TxOutTracker> {
        self.tx_outs.get(public_key)
    }

    /// Returns the owned outputs whose key images are not known to be spent.
    pub fn unspent_tx_outs(&self) -> impl Iterator<Item = &KnownTxOut> {
        self.tx_outs
            .values()
            .filter(|tracker| !tracker.is_spent())
            .map(TxOutTracker::known_tx_out)
    }

    /// Adds owned outputs to the account, ignoring any that are already known. Returns
    /// the number of outputs that were new.
    pub fn add_tx_outs<I: IntoIterator<Item = KnownTxOut>>(&mut self, tx_outs: I) -> usize {
        let mut added = 0;
        for known_tx_out in tx_outs {
            let public_key = *known_tx_out.public_key();
            if self.tx_outs.contains_key(&public_key) {
                continue;
            }
            self.key_images
                .insert(*known_tx_out.key_image(), public_key);
            self.tx_outs
                .insert(public_key, TxOutTracker::new(known_tx_out));
            added += 1;
        }
        added
    }

    /// Applies one batch of an incremental view query.
    pub fn apply_fetch_batch(&mut self, batch: TxOutFetchBatch) {
        let added = self.add_tx_outs(batch.tx_outs);
        self.unscanned_block_ranges
            .extend(batch.missed_block_ranges);
        self.fetch_cursor = batch.cursor;
        debug!(
            "Applied view batch: {} new outputs, {} unscanned blocks, block count {}",
            added,
            self.unscanned_block_ranges.block_count(),
            self.fetch_cursor.block_count()
        );
    }

    /// Records the result of scanning `scanned` with the view key: the outputs found are
    /// added and the ranges stop being unscanned, together.
    pub fn add_view_key_scan_results(&mut self, scanned: &[BlockRange], found: Vec<KnownTxOut>) {
        self.add_tx_outs(found);
        for range in scanned {
            self.unscanned_block_ranges.remove(range);
        }
    }

    /// Returns a `(key image, start block)` query for every output not known to be spent.
    pub fn unspent_key_image_queries(&self) -> Vec<(KeyImage, u64)> {
        self.tx_outs
            .values()
            .filter(|tracker| !tracker.is_spent())
            .map(|tracker| {
                let key_image_tracker = tracker.key_image_tracker();
                (
                    *key_image_tracker.key_image(),
                    key_image_tracker.next_query_block_index(),
                )
            })
            .collect()
    }

    /// Records spent-status query results. Key images the account does not own are
    /// ignored.
    pub fn apply_key_image_statuses<I>(&mut self, statuses: I)
    where
        I: IntoIterator<Item = (KeyImage, KeyImageSpentStatus)>,
    {
        for (key_image, status) in statuses {
            if let Some(tracker) = self
                .key_images
                .get(&key_image)
                .and_then(|public_key| self.tx_outs.get_mut(public_key))
            {
                tracker.key_image_tracker.apply(status);
            }
        }
    }

    /// Returns the total value of the unspent outputs, as of the block count reached by
    /// the view query.
    pub fn balance(&self) -> Balance {
        Balance::from_values(
            self.unspent_tx_outs().map(KnownTxOut::value),
            self.fetch_cursor.block_count(),
        )
    }
}

/// An [`Account`] shared between tasks.
///
/// Readers run concurrently; a writer has exclusive access. Closures passed to
/// [`AccountLock::read`] and [`AccountLock::write`] must not block.
#[derive(Debug, Default)]
pub struct AccountLock {
    account: RwLock<Account>,
}

impl AccountLock {
    pub fn new(account: Account) -> Self {
        AccountLock {
            account: RwLock::new(account),
        }
    }

    /// Runs `f` with shared access to the account.
    pub fn read<T>(&self, f: impl FnOnce(&Account) -> T) -> T {
        let account = self.account.read().unwrap_or_else(PoisonError::into_inner);
        f(&account)
    }

    /// Runs `f` with exclusive access to the account.
    pub fn write<T>(&self, f: impl FnOnce(&mut Account) -> T) -> T {
        let mut account = self.account.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut account)
    }

    pub fn into_inner(self) -> Account {
        self.account
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
