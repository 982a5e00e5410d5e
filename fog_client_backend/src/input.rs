//! Preparation of the inputs of a transaction.
//!
//! Each input spends one owned output, hidden among decoys in a ring. Rings are always
//! ordered by output public key, so the position of the real output within its ring
//! reveals nothing about the order in which outputs were requested or fetched.

use fog_protocol::{TxOut, TxOutMembershipProof};
use tracing::{debug, info};

use crate::{
    config::FogSyncConfig,
    error::{InvalidInputError, PrepareInputsError},
    fog::{FogMerkleProofService, MerkleProofFetcher},
    wallet::KnownTxOut,
};

/// An owned output to be spent, with the ring it is hidden in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedTxInput {
    known_tx_out: KnownTxOut,
    ring: Vec<(TxOut, TxOutMembershipProof)>,
    real_input_index: usize,
}

impl PreparedTxInput {
    /// Sorts `ring` by public key and locates `known_tx_out` within it.
    ///
    /// Returns an error if no ring member has the public key of `known_tx_out`. The ring
    /// does not match what was requested, and must be fetched again.
    pub fn make(
        known_tx_out: KnownTxOut,
        mut ring: Vec<(TxOut, TxOutMembershipProof)>,
    ) -> Result<Self, InvalidInputError> {
        ring.sort_by(|(a, _), (b, _)| a.public_key().cmp(b.public_key()));

        let real_input_index = ring
            .iter()
            .position(|(tx_out, _)| tx_out.public_key() == known_tx_out.public_key())
            .ok_or_else(|| {
                InvalidInputError::new(format!(
                    "ring of {} outputs does not contain the output at global index {}",
                    ring.len(),
                    known_tx_out.global_index()
                ))
            })?;

        Ok(PreparedTxInput {
            known_tx_out,
            ring,
            real_input_index,
        })
    }

    pub fn known_tx_out(&self) -> &KnownTxOut {
        &self.known_tx_out
    }

    /// Returns the ring, sorted by public key.
    pub fn ring(&self) -> &[(TxOut, TxOutMembershipProof)] {
        &self.ring
    }

    /// Returns the position of the output being spent within [`Self::ring`].
    pub fn real_input_index(&self) -> usize {
        self.real_input_index
    }
}

/// Fetches rings and turns them into [`PreparedTxInput`]s.
pub struct InputPreparer<S> {
    fetcher: MerkleProofFetcher<S>,
    config: FogSyncConfig,
}

impl<S: FogMerkleProofService> InputPreparer<S> {
    pub fn new(service: S, config: FogSyncConfig) -> Self {
        InputPreparer {
            fetcher: MerkleProofFetcher::new(service),
            config,
        }
    }

    /// Prepares one input for each `(output, ring indices)` pair, in order.
    ///
    /// All rings are fetched in a single batched operation with membership proofs as of
    /// `merkle_root_block`. Each list of ring indices must include the global index of
    /// the output it belongs to.
    pub async fn prepare_inputs(
        &self,
        inputs: Vec<(KnownTxOut, Vec<u64>)>,
        merkle_root_block: u64,
    ) -> Result<Vec<PreparedTxInput>, PrepareInputsError> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }

        info!("Preparing {} transaction inputs", inputs.len());
        let (known_tx_outs, ring_indices): (Vec<KnownTxOut>, Vec<Vec<u64>>) =
            inputs.into_iter().unzip();
        let rings = self
            .fetcher
            .get_output_groups(
                &ring_indices,
                merkle_root_block,
                self.config.max_indices_per_query(),
            )
            .await?;

        let prepared = known_tx_outs
            .into_iter()
            .zip(rings)
            .map(|(known_tx_out, ring)| PreparedTxInput::make(known_tx_out, ring))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Prepared {} rings", prepared.len());
        Ok(prepared)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use fog_protocol::{TxOut, TxOutMembershipProof, TxOutPublicKey};
    use proptest::prelude::*;

    use super::{InputPreparer, PreparedTxInput};
    use crate::{
        config::FogSyncConfig,
        error::{ConnectionError, MerkleProofFetcherError, PrepareInputsError},
        testing::{fake_known_tx_out, fake_proof, fake_tx_out, MockMerkleProofService},
        wallet::{KnownTxOut, TxOutLocation},
    };

    fn named_tx_out(name: &[u8; 3]) -> TxOut {
        let mut key = [0u8; 32];
        key[..3].copy_from_slice(name);
        TxOut::from_parts(
            TxOutPublicKey::from_bytes(key),
            [7; 32],
            None,
            vec![],
            None,
        )
    }

    fn ring_member(name: &[u8; 3], index: u64) -> (TxOut, TxOutMembershipProof) {
        (named_tx_out(name), fake_proof(index, 10))
    }

    fn known(tx_out: TxOut) -> KnownTxOut {
        KnownTxOut::from_parts(
            tx_out,
            TxOutLocation::new(1, 2, None),
            5,
            0,
            crate::testing::fake_key_image(2),
        )
    }

    #[test]
    fn ring_is_sorted_and_real_input_located() {
        let ring = vec![
            ring_member(b"DDD", 0),
            ring_member(b"AAA", 1),
            ring_member(b"BBB", 2),
            ring_member(b"CCC", 3),
        ];

        let input = PreparedTxInput::make(known(named_tx_out(b"BBB")), ring).unwrap();

        let order: Vec<&[u8]> = input
            .ring()
            .iter()
            .map(|(tx_out, _)| &tx_out.public_key().as_bytes()[..3])
            .collect();
        assert_eq!(order, vec![&b"AAA"[..], &b"BBB"[..], &b"CCC"[..], &b"DDD"[..]]);
        assert_eq!(input.real_input_index(), 1);
        // Proofs travel with their outputs.
        assert_eq!(input.ring()[1].1, fake_proof(2, 10));
    }

    #[test]
    fn ring_without_the_real_input_is_rejected() {
        let ring = vec![ring_member(b"AAA", 0), ring_member(b"CCC", 1)];

        assert!(PreparedTxInput::make(known(named_tx_out(b"BBB")), ring).is_err());
    }

    proptest! {
        #[test]
        fn real_input_is_found_in_any_ring_order(
            ring_indices in prop::collection::btree_set(0u64..1000, 1..12)
                .prop_map(|s| s.into_iter().collect::<Vec<_>>())
                .prop_shuffle(),
            real_position in any::<prop::sample::Index>(),
        ) {
            let real_index = ring_indices[real_position.index(ring_indices.len())];
            let ring = ring_indices
                .iter()
                .map(|&i| (fake_tx_out(i), fake_proof(i, 1000)))
                .collect();

            let input = PreparedTxInput::make(fake_known_tx_out(real_index, 0), ring).unwrap();

            prop_assert_eq!(input.ring().len(), ring_indices.len());
            prop_assert!(input
                .ring()
                .windows(2)
                .all(|w| w[0].0.public_key() < w[1].0.public_key()));
            let expected = fake_tx_out(real_index);
            prop_assert_eq!(
                input.ring()[input.real_input_index()].0.public_key(),
                expected.public_key()
            );
        }
    }

    #[tokio::test]
    async fn prepares_each_input_from_its_own_ring() {
        let service = Arc::new(MockMerkleProofService::new(100));
        let preparer = InputPreparer::new(service.clone(), FogSyncConfig::new(4));

        let inputs = preparer
            .prepare_inputs(
                vec![
                    (fake_known_tx_out(42, 14), vec![71, 42, 3, 17, 90]),
                    (fake_known_tx_out(8, 2), vec![8, 55, 21]),
                ],
                99,
            )
            .await
            .unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].known_tx_out().global_index(), 42);
        assert_eq!(inputs[0].real_input_index(), 2);
        assert_eq!(inputs[1].real_input_index(), 0);
        assert_eq!(inputs[1].ring()[2].1, fake_proof(55, 99));
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_input_list_makes_no_remote_call() {
        let service = Arc::new(MockMerkleProofService::new(100));
        let preparer = InputPreparer::new(service.clone(), FogSyncConfig::default());

        assert!(preparer.prepare_inputs(vec![], 99).await.unwrap().is_empty());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn substituted_ring_member_is_an_invalid_input() {
        let service = Arc::new(MockMerkleProofService::new(100));
        service.replace_output(42, fake_tx_out(43));
        let preparer = InputPreparer::new(service, FogSyncConfig::default());

        assert_matches!(
            preparer
                .prepare_inputs(vec![(fake_known_tx_out(42, 14), vec![3, 42, 71])], 99)
                .await,
            Err(PrepareInputsError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn fetch_failures_are_surfaced() {
        let service = Arc::new(MockMerkleProofService::new(50));
        let preparer = InputPreparer::new(service.clone(), FogSyncConfig::default());

        assert_matches!(
            preparer
                .prepare_inputs(vec![(fake_known_tx_out(42, 14), vec![3, 42, 71])], 49)
                .await,
            Err(PrepareInputsError::Fetch(MerkleProofFetcherError::OutOfBounds {
                ledger_tx_out_count: 50,
                ..
            }))
        );

        service.fail_with(ConnectionError::ServerRateLimited("slow down".to_owned()));
        assert_matches!(
            preparer
                .prepare_inputs(vec![(fake_known_tx_out(42, 14), vec![3, 42])], 49)
                .await,
            Err(PrepareInputsError::Fetch(MerkleProofFetcherError::Connection(
                ConnectionError::ServerRateLimited(_)
            )))
        );
    }
}
