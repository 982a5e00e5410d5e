use std::collections::{HashMap, HashSet};

use fog_protocol::{TxOut, TxOutMembershipProof};
use futures_util::future::try_join_all;
use tracing::{debug, info, warn};

use crate::{
    error::{ConnectionError, MerkleProofFetcherError},
    proto::ledger::{GetOutputsRequest, GetOutputsResponse, OutputResult, OutputResultCode},
};

use super::FogMerkleProofService;

/// Fetches ledger outputs and their Merkle membership proofs by global index.
pub struct MerkleProofFetcher<S> {
    service: S,
}

impl<S: FogMerkleProofService> MerkleProofFetcher<S> {
    pub fn new(service: S) -> Self {
        MerkleProofFetcher { service }
    }

    /// Fetches the outputs for several groups of indices (typically one group per ring)
    /// in a single batched operation.
    ///
    /// The returned groups have the same lengths and ordering as `global_indices`. If the
    /// service reports success but omits any requested index, the whole call fails with
    /// [`ConnectionError::ProtocolViolation`].
    pub async fn get_output_groups(
        &self,
        global_indices: &[Vec<u64>],
        merkle_root_block: u64,
        max_indices_per_query: usize,
    ) -> Result<Vec<Vec<(TxOut, TxOutMembershipProof)>>, MerkleProofFetcherError> {
        let all_indices: Vec<u64> = global_indices.iter().flatten().copied().collect();
        let all_results = self
            .get_outputs(&all_indices, merkle_root_block, max_indices_per_query)
            .await?;

        global_indices
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|index| {
                        all_results.get(index).cloned().ok_or_else(|| {
                            ConnectionError::ProtocolViolation(format!(
                                "global txout index {} not found in GetOutputs response \
                                 (requested group: {:?}, {} outputs returned)",
                                index,
                                group,
                                all_results.len(),
                            ))
                            .into()
                        })
                    })
                    .collect::<Result<Vec<_>, MerkleProofFetcherError>>()
            })
            .collect()
    }

    /// Fetches the outputs at `global_indices`.
    ///
    /// The indices are split into consecutive chunks of at most `max_indices_per_query`
    /// (a limit of zero is treated as one), which are queried concurrently and merged.
    /// Duplicate indices are passed through to the service unchanged; if an index is
    /// answered more than once, the first answer is kept. A chunk whose results omit a
    /// requested index, or include one it did not request, fails the whole call with
    /// [`ConnectionError::ProtocolViolation`].
    pub async fn get_outputs(
        &self,
        global_indices: &[u64],
        merkle_root_block: u64,
        max_indices_per_query: usize,
    ) -> Result<HashMap<u64, (TxOut, TxOutMembershipProof)>, MerkleProofFetcherError> {
        let chunks: Vec<&[u64]> = global_indices.chunks(max_indices_per_query.max(1)).collect();
        info!(
            "Fetching {} outputs in {} queries as of block {}",
            global_indices.len(),
            chunks.len(),
            merkle_root_block,
        );

        let chunk_results = try_join_all(
            chunks
                .into_iter()
                .map(|chunk| self.get_outputs_chunk(chunk, merkle_root_block)),
        )
        .await?;

        let mut merged = HashMap::with_capacity(global_indices.len());
        for outputs in chunk_results {
            for (index, output) in outputs {
                merged.entry(index).or_insert(output);
            }
        }
        Ok(merged)
    }

    async fn get_outputs_chunk(
        &self,
        global_indices: &[u64],
        merkle_root_block: u64,
    ) -> Result<Vec<(u64, (TxOut, TxOutMembershipProof))>, MerkleProofFetcherError> {
        let request = GetOutputsRequest {
            indices: global_indices.to_vec(),
            merkle_root_block,
        };
        let response = self.service.get_outputs(request).await?;
        let outputs = parse_response(response)?;
        check_index_set(global_indices, &outputs)?;
        Ok(outputs)
    }
}

/// Checks that a chunk's results answer exactly the indices the chunk requested.
fn check_index_set(
    requested: &[u64],
    outputs: &[(u64, (TxOut, TxOutMembershipProof))],
) -> Result<(), ConnectionError> {
    let requested: HashSet<u64> = requested.iter().copied().collect();
    if let Some((index, _)) = outputs.iter().find(|(index, _)| !requested.contains(index)) {
        warn!("GetOutputs answered unrequested index {}", index);
        return Err(ConnectionError::ProtocolViolation(format!(
            "GetOutputs returned global txout index {}, which was not requested",
            index
        )));
    }

    let answered: HashSet<u64> = outputs.iter().map(|(index, _)| *index).collect();
    if let Some(index) = requested.iter().find(|&index| !answered.contains(index)) {
        warn!("GetOutputs omitted requested index {}", index);
        return Err(ConnectionError::ProtocolViolation(format!(
            "global txout index {} not found in GetOutputs response ({} of {} indices answered)",
            index,
            answered.len(),
            requested.len()
        )));
    }
    Ok(())
}

/// Converts a `GetOutputs` response into `(index, (output, proof))` pairs, in response
/// order.
///
/// A single `DoesNotExist` result turns the whole response into
/// [`MerkleProofFetcherError::OutOfBounds`], taking precedence over any other failure in
/// the same response.
fn parse_response(
    response: GetOutputsResponse,
) -> Result<Vec<(u64, (TxOut, TxOutMembershipProof))>, MerkleProofFetcherError> {
    let does_not_exist = OutputResultCode::DoesNotExist as i32;
    if response
        .results
        .iter()
        .any(|result| result.result_code == does_not_exist)
    {
        debug!(
            "GetOutputs out of bounds: blockCount: {}, ledgerTxOutCount: {}",
            response.num_blocks, response.global_txo_count,
        );
        return Err(MerkleProofFetcherError::OutOfBounds {
            block_count: response.num_blocks,
            ledger_tx_out_count: response.global_txo_count,
        });
    }

    response.results.into_iter().map(parse_result).collect()
}

fn parse_result(
    result: OutputResult,
) -> Result<(u64, (TxOut, TxOutMembershipProof)), MerkleProofFetcherError> {
    match OutputResultCode::try_from(result.result_code) {
        Ok(OutputResultCode::Exists) => {
            let output = result.output.ok_or_else(|| {
                ConnectionError::InvalidServerResponse(format!(
                    "GetOutputs result for index {} is missing its output",
                    result.index
                ))
            })?;
            let proof = result.proof.ok_or_else(|| {
                ConnectionError::InvalidServerResponse(format!(
                    "GetOutputs result for index {} is missing its membership proof",
                    result.index
                ))
            })?;
            Ok((
                result.index,
                (TxOut::try_from(output)?, TxOutMembershipProof::try_from(proof)?),
            ))
        }
        Ok(code) => {
            debug!("GetOutputs result error: {}", code.as_str_name());
            Err(ConnectionError::InvalidServerResponse(format!(
                "Fog MerkleProof result error: {} for index {}",
                code.as_str_name(),
                result.index
            ))
            .into())
        }
        Err(_) => {
            debug!("GetOutputs result code unrecognized: {}", result.result_code);
            Err(ConnectionError::InvalidServerResponse(format!(
                "Fog MerkleProof result error: unrecognized code {} for index {}",
                result.result_code, result.index
            ))
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::MerkleProofFetcher;
    use crate::{
        error::{ConnectionError, MerkleProofFetcherError},
        proto::ledger::OutputResultCode,
        testing::{fake_proof, fake_tx_out, MockMerkleProofService},
    };

    type MockFetcher = MerkleProofFetcher<Arc<MockMerkleProofService>>;

    fn fetcher(ledger_size: u64) -> (Arc<MockMerkleProofService>, MockFetcher) {
        let service = Arc::new(MockMerkleProofService::new(ledger_size));
        (service.clone(), MerkleProofFetcher::new(service))
    }

    #[tokio::test]
    async fn chunks_requests_and_merges_results() {
        let (service, fetcher) = fetcher(10);

        let outputs = fetcher.get_outputs(&[5, 2, 8, 1], 9, 2).await.unwrap();

        let requested: Vec<Vec<u64>> = service.requests().into_iter().map(|r| r.indices).collect();
        assert_eq!(requested.len(), 2);
        assert!(requested.contains(&vec![5, 2]));
        assert!(requested.contains(&vec![8, 1]));

        let mut keys: Vec<u64> = outputs.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 5, 8]);
        assert_eq!(outputs[&5], (fake_tx_out(5), fake_proof(5, 9)));
    }

    #[tokio::test]
    async fn duplicate_indices_are_not_deduplicated_before_chunking() {
        let (service, fetcher) = fetcher(10);

        let outputs = fetcher.get_outputs(&[3, 3, 4], 9, 2).await.unwrap();

        let mut requested: Vec<Vec<u64>> =
            service.requests().into_iter().map(|r| r.indices).collect();
        requested.sort();
        assert_eq!(requested, vec![vec![3, 3], vec![4]]);
        assert_eq!(outputs.len(), 2);
    }

    #[tokio::test]
    async fn empty_request_makes_no_remote_calls() {
        let (service, fetcher) = fetcher(10);

        assert!(fetcher.get_outputs(&[], 9, 4).await.unwrap().is_empty());
        assert!(fetcher.get_output_groups(&[], 9, 4).await.unwrap().is_empty());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_clamped() {
        let (service, fetcher) = fetcher(10);

        let outputs = fetcher.get_outputs(&[1, 2, 3], 9, 0).await.unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(service.call_count(), 3);
    }

    #[tokio::test]
    async fn index_beyond_ledger_is_out_of_bounds() {
        let (_, fetcher) = fetcher(10);

        assert_matches!(
            fetcher.get_outputs(&[1, 2, 10, 3], 9, 8).await,
            Err(MerkleProofFetcherError::OutOfBounds {
                block_count,
                ledger_tx_out_count: 10,
            }) if block_count == MockMerkleProofService::block_count_for(10)
        );

        // The out-of-bounds chunk fails the whole call even when other chunks succeed.
        assert_matches!(
            fetcher.get_outputs(&[1, 2, 10, 3], 9, 1).await,
            Err(MerkleProofFetcherError::OutOfBounds { .. })
        );
    }

    #[tokio::test]
    async fn out_of_bounds_takes_precedence_over_other_errors() {
        let (service, fetcher) = fetcher(10);
        service.set_result_code(1, OutputResultCode::OutputDatabaseError);

        assert_matches!(
            fetcher.get_outputs(&[1, 12], 9, 8).await,
            Err(MerkleProofFetcherError::OutOfBounds { .. })
        );
    }

    #[tokio::test]
    async fn error_codes_are_invalid_server_responses() {
        let (service, fetcher) = fetcher(10);
        service.set_result_code(4, OutputResultCode::OutputDatabaseError);
        service.set_raw_result_code(6, 42);

        assert_matches!(
            fetcher.get_outputs(&[3, 4], 9, 8).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::InvalidServerResponse(_)))
        );
        assert_matches!(
            fetcher.get_outputs(&[6], 9, 8).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::InvalidServerResponse(_)))
        );
    }

    #[tokio::test]
    async fn malformed_payload_is_an_invalid_server_response() {
        let (service, fetcher) = fetcher(10);
        service.corrupt_output(7);

        assert_matches!(
            fetcher.get_outputs(&[7], 9, 8).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::InvalidServerResponse(_)))
        );
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let (service, fetcher) = fetcher(10);
        service.fail_with(ConnectionError::ConnectionFailure("unreachable".to_owned()));

        assert_matches!(
            fetcher.get_outputs(&[1, 2, 3], 9, 2).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::ConnectionFailure(_)))
        );
    }

    #[tokio::test]
    async fn omitted_index_fails_the_single_list_form() {
        let (service, fetcher) = fetcher(10);
        service.omit(2);

        assert_matches!(
            fetcher.get_outputs(&[1, 2, 3], 9, 8).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::ProtocolViolation(_)))
        );
    }

    #[tokio::test]
    async fn unrequested_index_is_a_protocol_violation() {
        let (service, fetcher) = fetcher(10);
        // The chunk asking for 1 also answers 2 with a different output, ahead of the
        // chunk that did request 2.
        service.add_unrequested_result(2, fake_tx_out(7));

        assert_matches!(
            fetcher.get_outputs(&[1, 2], 9, 1).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::ProtocolViolation(_)))
        );
        assert_matches!(
            fetcher.get_output_groups(&[vec![1, 3]], 9, 8).await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::ProtocolViolation(_)))
        );
    }

    #[tokio::test]
    async fn groups_are_rebuilt_in_request_order() {
        let (_, fetcher) = fetcher(20);

        let groups = fetcher
            .get_output_groups(&[vec![9, 3, 7], vec![], vec![3, 12]], 19, 2)
            .await
            .unwrap();

        let indices: Vec<Vec<u64>> = groups
            .iter()
            .map(|group| group.iter().map(|(_, proof)| proof.index()).collect())
            .collect();
        assert_eq!(indices, vec![vec![9, 3, 7], vec![], vec![3, 12]]);
    }

    #[tokio::test]
    async fn omitted_index_is_a_protocol_violation() {
        let (service, fetcher) = fetcher(20);
        service.omit(12);

        assert_matches!(
            fetcher
                .get_output_groups(&[vec![1, 2], vec![3, 12]], 19, 8)
                .await,
            Err(MerkleProofFetcherError::Connection(ConnectionError::ProtocolViolation(_)))
        );
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_the_merged_result(
            indices in prop::collection::vec(0u64..64, 0..40),
            max_chunk in 1usize..12,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (_, fetcher) = fetcher(64);

            let chunked = runtime.block_on(fetcher.get_outputs(&indices, 63, max_chunk)).unwrap();
            let unchunked = runtime
                .block_on(fetcher.get_outputs(&indices, 63, indices.len().max(1)))
                .unwrap();

            prop_assert_eq!(&chunked, &unchunked);
            let expected: HashMap<u64, _> = indices
                .iter()
                .map(|&i| (i, (fake_tx_out(i), fake_proof(i, 63))))
                .collect();
            prop_assert_eq!(chunked, expected);
        }
    }
}
