use std::collections::HashSet;

use fog_protocol::{BlockRange, BlockRanges, TxOut};
use tracing::{debug, info, warn};

use crate::{
    error::ConnectionError,
    proto::ledger::{self, BlockData, BlockRequest},
    wallet::{KnownTxOut, TxOutLocation},
};

use super::FogBlockService;

/// Block timestamp reported for blocks that predate timestamps.
const TIMESTAMP_UNAVAILABLE: u64 = u64::MAX;

/// The account's view key, as used for trial decryption.
///
/// Implementations wrap the cryptographic engine: `try_match` recovers the amount,
/// subaddress and key image of an output if, and only if, it belongs to the account.
pub trait ScanningKey: Send + Sync {
    fn try_match(&self, tx_out: &TxOut, location: TxOutLocation) -> Option<KnownTxOut>;
}

impl<K: ScanningKey + ?Sized> ScanningKey for std::sync::Arc<K> {
    fn try_match(&self, tx_out: &TxOut, location: TxOutLocation) -> Option<KnownTxOut> {
        (**self).try_match(tx_out, location)
    }
}

/// Downloads blocks and trial-decrypts their outputs with the account's view key.
///
/// This is the fallback for blocks that Fog view could not search on the account's
/// behalf. The scanner only reports what it finds; recording that the ranges have been
/// scanned is up to the caller.
pub struct ViewKeyScanner<S, K> {
    service: S,
    key: K,
}

impl<S: FogBlockService, K: ScanningKey> ViewKeyScanner<S, K> {
    pub fn new(service: S, key: K) -> Self {
        ViewKeyScanner { service, key }
    }

    /// Scans every block in `block_ranges` and returns the outputs owned by the account.
    ///
    /// The response must contain each requested block exactly once and nothing else;
    /// otherwise the call fails with [`ConnectionError::ProtocolViolation`] and nothing
    /// is returned.
    pub async fn view_key_scan_blocks(
        &self,
        block_ranges: &[BlockRange],
    ) -> Result<Vec<KnownTxOut>, ConnectionError> {
        let requested: BlockRanges = block_ranges.iter().cloned().collect();
        if requested.is_empty() {
            debug!("0 blocks to scan, skipping.");
            return Ok(vec![]);
        }

        info!(
            "Scanning {} blocks in {} ranges with the view key",
            requested.block_count(),
            requested.ranges().len()
        );
        let request = BlockRequest {
            ranges: requested
                .ranges()
                .iter()
                .map(ledger::BlockRange::from)
                .collect(),
        };
        let response = self.service.get_blocks(request).await?;
        check_block_set(&requested, &response.blocks)?;

        let mut found = vec![];
        for block in response.blocks {
            self.scan_block(block, &mut found)?;
        }
        info!("View key scan found {} outputs", found.len());
        Ok(found)
    }

    fn scan_block(
        &self,
        block: BlockData,
        found: &mut Vec<KnownTxOut>,
    ) -> Result<(), ConnectionError> {
        let output_count = block.outputs.len() as u64;
        let first_global_index = block
            .global_txo_count
            .checked_sub(output_count)
            .ok_or_else(|| {
                ConnectionError::InvalidServerResponse(format!(
                    "Block {} has {} outputs but a global output count of {}",
                    block.index, output_count, block.global_txo_count
                ))
            })?;
        let timestamp = (block.timestamp != TIMESTAMP_UNAVAILABLE).then_some(block.timestamp);

        for (position, output) in (0u64..).zip(block.outputs) {
            let tx_out = TxOut::try_from(output)?;
            let location =
                TxOutLocation::new(block.index, first_global_index + position, timestamp);
            if let Some(known) = self.key.try_match(&tx_out, location) {
                found.push(known);
            }
        }
        Ok(())
    }
}

fn check_block_set(requested: &BlockRanges, blocks: &[BlockData]) -> Result<(), ConnectionError> {
    let mut seen = HashSet::with_capacity(blocks.len());
    for block in blocks {
        if !requested.contains(block.index) {
            warn!("GetBlocks returned unrequested block {}", block.index);
            return Err(ConnectionError::ProtocolViolation(format!(
                "GetBlocks returned block {}, which was not requested",
                block.index
            )));
        }
        if !seen.insert(block.index) {
            warn!("GetBlocks returned block {} more than once", block.index);
            return Err(ConnectionError::ProtocolViolation(format!(
                "GetBlocks returned block {} more than once",
                block.index
            )));
        }
    }

    if seen.len() as u64 != requested.block_count() {
        warn!(
            "GetBlocks returned {} of {} requested blocks",
            seen.len(),
            requested.block_count()
        );
        return Err(ConnectionError::ProtocolViolation(format!(
            "GetBlocks returned {} blocks, expected {}",
            seen.len(),
            requested.block_count()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use fog_protocol::BlockRange;

    use super::ViewKeyScanner;
    use crate::{
        error::ConnectionError,
        testing::{fake_tx_out, MockBlockService, MockScanningKey},
    };

    type MockScanner = ViewKeyScanner<Arc<MockBlockService>, MockScanningKey>;

    // Every block holds 3 outputs, so block `b` holds global indices `3b..3b + 3`.
    fn scanner(owned: &[u64]) -> (Arc<MockBlockService>, MockScanner) {
        let service = Arc::new(MockBlockService::new(20, 3));
        let key = MockScanningKey::owning(owned.iter().copied());
        (service.clone(), ViewKeyScanner::new(service, key))
    }

    fn range(start: u64, end: u64) -> BlockRange {
        BlockRange::from_parts(start..end)
    }

    #[tokio::test]
    async fn finds_owned_outputs_with_their_locations() {
        let (service, scanner) = scanner(&[4, 16, 40]);

        let found = scanner
            .view_key_scan_blocks(&[range(1, 2), range(5, 7)])
            .await
            .unwrap();

        let mut located: Vec<(u64, u64)> = found
            .iter()
            .map(|known| (known.block_index(), known.global_index()))
            .collect();
        located.sort_unstable();
        assert_eq!(located, vec![(1, 4), (5, 16)]);
        assert_eq!(found[0].tx_out(), &fake_tx_out(found[0].global_index()));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_ranges_make_no_remote_call() {
        let (service, scanner) = scanner(&[4]);

        assert!(scanner.view_key_scan_blocks(&[]).await.unwrap().is_empty());
        assert!(scanner
            .view_key_scan_blocks(&[range(3, 3)])
            .await
            .unwrap()
            .is_empty());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_block_is_a_protocol_violation() {
        let (service, scanner) = scanner(&[4]);
        service.omit_block(1);

        assert_matches!(
            scanner.view_key_scan_blocks(&[range(0, 3)]).await,
            Err(ConnectionError::ProtocolViolation(_))
        );
    }

    #[tokio::test]
    async fn duplicated_block_is_a_protocol_violation() {
        let (service, scanner) = scanner(&[4]);
        service.duplicate_block(2);

        assert_matches!(
            scanner.view_key_scan_blocks(&[range(0, 3)]).await,
            Err(ConnectionError::ProtocolViolation(_))
        );
    }

    #[tokio::test]
    async fn extra_block_is_a_protocol_violation() {
        let (service, scanner) = scanner(&[4]);
        service.add_unrequested_block(9);

        assert_matches!(
            scanner.view_key_scan_blocks(&[range(0, 3)]).await,
            Err(ConnectionError::ProtocolViolation(_))
        );
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let (service, scanner) = scanner(&[4]);
        service.fail_with(ConnectionError::AuthorizationFailure("expired".to_owned()));

        assert_matches!(
            scanner.view_key_scan_blocks(&[range(0, 3)]).await,
            Err(ConnectionError::AuthorizationFailure(_))
        );
    }
}
