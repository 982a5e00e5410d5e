use std::sync::{Arc, Mutex, PoisonError};

use fog_protocol::Balance;
use futures_util::{
    future::{AbortHandle, Abortable, Aborted},
    TryStreamExt,
};
use tracing::{debug, info};

use crate::{
    error::ConnectionError,
    fog::{
        FogBlockService, FogKeyImageService, KeyImageChecker, ScanningKey, TxOutFetcher,
        ViewKeyScanner,
    },
};

use super::{Account, AccountLock};

/// Brings an account's balance up to date.
///
/// An update runs three stages in order, stopping at the first failure:
///
/// 1. Fetch newly received outputs from the view service, applying each batch as it
///    arrives. Batches may also report blocks the view service missed.
/// 2. Scan those missed blocks with the view key.
/// 3. Check the key images of all outputs not yet known to be spent.
///
/// Key images are checked last so that outputs discovered by either of the first two
/// stages are included. Progress applied by a stage is kept even if a later stage fails,
/// and the next update resumes from it.
///
/// Updates never overlap. Starting an update cancels the one in progress, if any, which
/// then fails with [`ConnectionError::Cancelled`].
pub struct BalanceUpdater<F, B, K, I> {
    account: Arc<AccountLock>,
    fetcher: F,
    scanner: ViewKeyScanner<B, K>,
    checker: KeyImageChecker<I>,
    in_flight: Mutex<Option<AbortHandle>>,
    sequencer: tokio::sync::Mutex<()>,
}

impl<F, B, K, I> BalanceUpdater<F, B, K, I>
where
    F: TxOutFetcher,
    B: FogBlockService,
    K: ScanningKey,
    I: FogKeyImageService,
{
    pub fn new(
        account: Arc<AccountLock>,
        fetcher: F,
        scanner: ViewKeyScanner<B, K>,
        checker: KeyImageChecker<I>,
    ) -> Self {
        BalanceUpdater {
            account,
            fetcher,
            scanner,
            checker,
            in_flight: Mutex::new(None),
            sequencer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn account(&self) -> &Arc<AccountLock> {
        &self.account
    }

    /// Synchronizes the account and returns its balance.
    pub async fn update_balance(&self) -> Result<Balance, ConnectionError> {
        let (handle, registration) = AbortHandle::new_pair();
        let superseded = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(superseded) = superseded {
            superseded.abort();
        }

        let update = async {
            let _turn = self.sequencer.lock().await;
            self.run_stages().await
        };
        match Abortable::new(update, registration).await {
            Ok(result) => result,
            Err(Aborted) => {
                info!("Balance update superseded by a newer one");
                Err(ConnectionError::Cancelled)
            }
        }
    }

    async fn run_stages(&self) -> Result<Balance, ConnectionError> {
        self.fetch_tx_outs().await?;
        self.view_key_scan_missed_blocks().await?;
        self.check_key_images().await?;

        let balance = self.account.read(Account::balance);
        info!("Balance updated as of block {}", balance.block_count());
        Ok(balance)
    }

    async fn fetch_tx_outs(&self) -> Result<(), ConnectionError> {
        let cursor = self.account.read(Account::fetch_cursor);
        debug!("Fetching outputs from block count {}", cursor.block_count());

        let mut batches = self.fetcher.fetch_tx_outs(cursor);
        while let Some(batch) = batches.try_next().await? {
            self.account.write(|account| account.apply_fetch_batch(batch));
        }
        Ok(())
    }

    async fn view_key_scan_missed_blocks(&self) -> Result<(), ConnectionError> {
        let ranges = self
            .account
            .read(|account| account.unscanned_block_ranges().ranges().to_vec());
        if ranges.is_empty() {
            debug!("No missed blocks to scan");
            return Ok(());
        }

        let found = self.scanner.view_key_scan_blocks(&ranges).await?;
        self.account
            .write(|account| account.add_view_key_scan_results(&ranges, found));
        Ok(())
    }

    async fn check_key_images(&self) -> Result<(), ConnectionError> {
        let queries = self.account.read(Account::unspent_key_image_queries);
        let statuses = self.checker.check_key_images(&queries).await?;

        let spent = statuses.iter().filter(|status| status.is_spent()).count();
        debug!("{} of {} key images newly spent", spent, queries.len());
        self.account.write(|account| {
            account.apply_key_image_statuses(
                queries
                    .into_iter()
                    .map(|(key_image, _)| key_image)
                    .zip(statuses),
            )
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use fog_protocol::BlockRange;

    use super::BalanceUpdater;
    use crate::{
        account::AccountLock,
        error::ConnectionError,
        fog::{KeyImageChecker, TxOutFetchBatch, TxOutFetchCursor, ViewKeyScanner},
        testing::{
            fake_key_image, fake_known_tx_out, fake_value, MockBlockService, MockKeyImageService,
            MockScanningKey, MockTxOutFetcher,
        },
    };

    type MockUpdater = BalanceUpdater<
        Arc<MockTxOutFetcher>,
        Arc<MockBlockService>,
        MockScanningKey,
        Arc<MockKeyImageService>,
    >;

    struct Harness {
        fetcher: Arc<MockTxOutFetcher>,
        blocks: Arc<MockBlockService>,
        key_images: Arc<MockKeyImageService>,
        updater: Arc<MockUpdater>,
    }

    // The block service holds 20 blocks of 3 outputs; the key owns global indices 16
    // (block 5) and 25 (block 8).
    fn harness() -> Harness {
        let fetcher = Arc::new(MockTxOutFetcher::new());
        let blocks = Arc::new(MockBlockService::new(20, 3));
        let key_images = Arc::new(MockKeyImageService::new(20));
        let updater = Arc::new(BalanceUpdater::new(
            Arc::new(AccountLock::default()),
            fetcher.clone(),
            ViewKeyScanner::new(blocks.clone(), MockScanningKey::owning([16, 25])),
            KeyImageChecker::new(key_images.clone()),
        ));
        Harness {
            fetcher,
            blocks,
            key_images,
            updater,
        }
    }

    fn batch(tx_outs: &[(u64, u64)], missed: &[(u64, u64)], block_count: u64) -> TxOutFetchBatch {
        TxOutFetchBatch {
            tx_outs: tx_outs
                .iter()
                .map(|&(global_index, block_index)| fake_known_tx_out(global_index, block_index))
                .collect(),
            missed_block_ranges: missed
                .iter()
                .map(|&(start, end)| BlockRange::from_parts(start..end))
                .collect(),
            cursor: TxOutFetchCursor::from_parts(block_count, block_count),
        }
    }

    #[tokio::test]
    async fn no_missed_blocks_skips_the_scan() {
        let h = harness();
        h.fetcher.push_batch(batch(&[(2, 0), (10, 3)], &[], 20));

        let balance = h.updater.update_balance().await.unwrap();

        assert_eq!(balance.value(), u128::from(fake_value(2) + fake_value(10)));
        assert_eq!(balance.block_count(), 20);
        assert_eq!(h.blocks.call_count(), 0);
        assert_eq!(h.key_images.call_count(), 1);
    }

    #[tokio::test]
    async fn outputs_found_by_scanning_are_checked_for_spends() {
        let h = harness();
        h.fetcher.push_batch(batch(&[(2, 0)], &[(4, 6)], 10));
        h.fetcher.push_batch(batch(&[], &[(8, 9)], 20));
        h.key_images.mark_spent(fake_key_image(25), 12);

        let balance = h.updater.update_balance().await.unwrap();

        // Both missed ranges are scanned in one request.
        assert_eq!(h.blocks.requests()[0].ranges.len(), 2);
        let queried: Vec<_> = h.key_images.requests()[0]
            .queries
            .iter()
            .map(|query| query.start_block)
            .collect();
        assert_eq!(queried.len(), 3);
        assert!(queried.contains(&5));
        assert!(queried.contains(&8));

        assert_eq!(balance.value(), u128::from(fake_value(2) + fake_value(16)));
        h.updater.account().read(|account| {
            assert!(account.unscanned_block_ranges().is_empty());
        });
    }

    #[tokio::test]
    async fn fetch_failure_stops_the_pipeline() {
        let h = harness();
        h.fetcher.push_batch(batch(&[(2, 0)], &[(4, 6)], 10));
        h.fetcher
            .fail_with(ConnectionError::ConnectionFailure("reset".to_owned()));

        assert_matches!(
            h.updater.update_balance().await,
            Err(ConnectionError::ConnectionFailure(_))
        );
        assert_eq!(h.blocks.call_count(), 0);
        assert_eq!(h.key_images.call_count(), 0);

        // The batch that arrived before the failure is kept.
        h.updater.account().read(|account| {
            assert_eq!(account.tx_outs().count(), 1);
            assert_eq!(account.fetch_cursor().block_count(), 10);
        });
    }

    #[tokio::test]
    async fn scan_failure_keeps_ranges_unscanned() {
        let h = harness();
        h.fetcher.push_batch(batch(&[(2, 0)], &[(4, 6)], 10));
        h.blocks
            .fail_with(ConnectionError::ServerRateLimited("busy".to_owned()));

        assert_matches!(
            h.updater.update_balance().await,
            Err(ConnectionError::ServerRateLimited(_))
        );
        assert_eq!(h.key_images.call_count(), 0);
        h.updater.account().read(|account| {
            assert_eq!(account.unscanned_block_ranges().block_count(), 2);
            assert_eq!(account.tx_outs().count(), 1);
        });

        // The next update resumes from the same cursor and scans the same blocks.
        h.blocks.clear_failure();
        let balance = h.updater.update_balance().await.unwrap();
        assert_eq!(balance.value(), u128::from(fake_value(2) + fake_value(16)));
        assert_eq!(h.fetcher.cursors()[1].block_count(), 10);
    }

    #[tokio::test]
    async fn key_image_cursors_advance_between_updates() {
        let h = harness();
        h.fetcher.push_batch(batch(&[(2, 0)], &[], 10));

        h.updater.update_balance().await.unwrap();
        h.key_images.set_num_blocks(30);
        h.updater.update_balance().await.unwrap();
        h.key_images.mark_spent(fake_key_image(2), 31);
        let balance = h.updater.update_balance().await.unwrap();

        let starts: Vec<u64> = h
            .key_images
            .requests()
            .iter()
            .map(|request| request.queries[0].start_block)
            .collect();
        assert_eq!(starts, vec![0, 20, 30]);
        assert_eq!(balance.value(), 0);

        // Spent outputs are no longer queried.
        h.updater.update_balance().await.unwrap();
        assert_eq!(h.key_images.call_count(), 3);
    }

    #[tokio::test]
    async fn newer_update_cancels_the_one_in_flight() {
        let h = harness();
        h.fetcher.push_batch(batch(&[(2, 0)], &[], 10));
        h.fetcher.stall_next();

        let first = tokio::spawn({
            let updater = h.updater.clone();
            async move { updater.update_balance().await }
        });
        while h.fetcher.call_count() == 0 {
            tokio::task::yield_now().await;
        }

        let balance = h.updater.update_balance().await.unwrap();

        assert_matches!(first.await.unwrap(), Err(ConnectionError::Cancelled));
        assert_eq!(balance.value(), u128::from(fake_value(2)));
        assert_eq!(h.fetcher.cursors()[1].block_count(), 10);
    }
}
