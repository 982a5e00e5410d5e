//! Utilities for testing Fog clients without a network.
//!
//! The mocks in this module answer from a deterministic fake ledger in which the output
//! at global index `i` is always [`fake_tx_out`]`(i)`. Every mock records the requests it
//! receives and can be told to misbehave.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use fog_protocol::{
    KeyImage, MaskedAmount, TxOut, TxOutMembershipElement, TxOutMembershipProof, TxOutPublicKey,
};
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::{
    error::ConnectionError,
    fog::{
        FogBlockService, FogKeyImageService, FogMerkleProofService, ScanningKey, TxOutFetchBatch,
        TxOutFetchCursor, TxOutFetcher,
    },
    proto::{
        external,
        ledger::{
            BlockData, BlockRequest, BlockResponse, CheckKeyImagesRequest,
            CheckKeyImagesResponse, GetOutputsRequest, GetOutputsResponse, KeyImageResult,
            KeyImageResultCode, OutputResult, OutputResultCode,
        },
    },
    wallet::{KnownTxOut, TxOutLocation},
};

/// The number of outputs per block assumed by [`MockMerkleProofService`].
pub const OUTPUTS_PER_BLOCK: u64 = 3;

fn tagged(seed: u64, tag: u8) -> [u8; 32] {
    let mut bytes = [tag; 32];
    bytes[..8].copy_from_slice(&seed.to_be_bytes());
    bytes
}

/// Returns the output at global index `global_index` of the fake ledger.
///
/// Public keys sort in the same order as the indices they were generated from.
pub fn fake_tx_out(global_index: u64) -> TxOut {
    TxOut::from_parts(
        TxOutPublicKey::from_bytes(tagged(global_index, 0x01)),
        tagged(global_index, 0x02),
        Some(MaskedAmount::from_parts(
            tagged(global_index, 0x03),
            global_index ^ 0x5a5a,
            vec![0; 8],
        )),
        vec![0xfe; 4],
        Some(vec![0; 66]),
    )
}

/// Returns a membership proof for `index` in a ledger whose last output is
/// `highest_index` (or `index`, if that is larger).
pub fn fake_proof(index: u64, highest_index: u64) -> TxOutMembershipProof {
    let highest_index = highest_index.max(index);
    let elements = vec![
        TxOutMembershipElement::new(index, index, tagged(index, 0x10)).expect("valid range"),
        TxOutMembershipElement::new(0, highest_index, tagged(highest_index, 0x11))
            .expect("valid range"),
    ];
    TxOutMembershipProof::new(index, highest_index, elements).expect("valid index")
}

pub fn fake_key_image(seed: u64) -> KeyImage {
    KeyImage::from_bytes(tagged(seed, 0x4b))
}

/// Returns the value, in picoMOB, of the output at `global_index` once decrypted.
pub fn fake_value(global_index: u64) -> u64 {
    (global_index + 1) * 1_000_000
}

/// Returns the fake ledger's output at `global_index` as received by the account in
/// block `block_index`.
pub fn fake_known_tx_out(global_index: u64, block_index: u64) -> KnownTxOut {
    KnownTxOut::from_parts(
        fake_tx_out(global_index),
        TxOutLocation::new(block_index, global_index, None),
        fake_value(global_index),
        0,
        fake_key_image(global_index),
    )
}

#[derive(Default)]
struct MerkleProofState {
    requests: Vec<GetOutputsRequest>,
    result_codes: HashMap<u64, i32>,
    corrupted: HashSet<u64>,
    omitted: HashSet<u64>,
    replaced: HashMap<u64, TxOut>,
    unrequested: Vec<(u64, TxOut)>,
    failure: Option<ConnectionError>,
}

/// A ledger service holding `ledger_size` outputs.
pub struct MockMerkleProofService {
    ledger_size: u64,
    state: Mutex<MerkleProofState>,
}

impl MockMerkleProofService {
    pub fn new(ledger_size: u64) -> Self {
        MockMerkleProofService {
            ledger_size,
            state: Mutex::new(MerkleProofState::default()),
        }
    }

    /// The block count reported by a ledger of `ledger_size` outputs.
    pub fn block_count_for(ledger_size: u64) -> u64 {
        ledger_size.div_ceil(OUTPUTS_PER_BLOCK)
    }

    pub fn requests(&self) -> Vec<GetOutputsRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn set_result_code(&self, index: u64, code: OutputResultCode) {
        self.set_raw_result_code(index, code as i32);
    }

    pub fn set_raw_result_code(&self, index: u64, code: i32) {
        self.state.lock().unwrap().result_codes.insert(index, code);
    }

    /// Answers `index` with an output whose public key has the wrong length.
    pub fn corrupt_output(&self, index: u64) {
        self.state.lock().unwrap().corrupted.insert(index);
    }

    /// Leaves `index` out of every response.
    pub fn omit(&self, index: u64) {
        self.state.lock().unwrap().omitted.insert(index);
    }

    /// Answers `index` with `tx_out` instead of the fake ledger's output.
    pub fn replace_output(&self, index: u64, tx_out: TxOut) {
        self.state.lock().unwrap().replaced.insert(index, tx_out);
    }

    /// Appends a result for `index`, answered with `tx_out`, to every response that did
    /// not request it.
    pub fn add_unrequested_result(&self, index: u64, tx_out: TxOut) {
        self.state.lock().unwrap().unrequested.push((index, tx_out));
    }

    pub fn fail_with(&self, error: ConnectionError) {
        self.state.lock().unwrap().failure = Some(error);
    }
}

#[async_trait]
impl FogMerkleProofService for MockMerkleProofService {
    async fn get_outputs(
        &self,
        request: GetOutputsRequest,
    ) -> Result<GetOutputsResponse, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }

        let mut results: Vec<OutputResult> = request
            .indices
            .iter()
            .filter(|&index| !state.omitted.contains(index))
            .map(|&index| {
                let default_code = if index < self.ledger_size {
                    OutputResultCode::Exists
                } else {
                    OutputResultCode::DoesNotExist
                };
                let result_code = state
                    .result_codes
                    .get(&index)
                    .copied()
                    .unwrap_or(default_code as i32);
                if result_code != OutputResultCode::Exists as i32 {
                    return OutputResult {
                        index,
                        result_code,
                        output: None,
                        proof: None,
                    };
                }

                let tx_out = state
                    .replaced
                    .get(&index)
                    .cloned()
                    .unwrap_or_else(|| fake_tx_out(index));
                let mut output = external::TxOut::from(&tx_out);
                if state.corrupted.contains(&index) {
                    output.public_key = Some(external::CompressedRistretto { data: vec![0; 31] });
                }
                OutputResult {
                    index,
                    result_code,
                    output: Some(output),
                    proof: Some(external::TxOutMembershipProof::from(&fake_proof(
                        index,
                        request.merkle_root_block,
                    ))),
                }
            })
            .collect();
        results.extend(
            state
                .unrequested
                .iter()
                .filter(|(index, _)| !request.indices.contains(index))
                .map(|(index, tx_out)| OutputResult {
                    index: *index,
                    result_code: OutputResultCode::Exists as i32,
                    output: Some(external::TxOut::from(tx_out)),
                    proof: Some(external::TxOutMembershipProof::from(&fake_proof(
                        *index,
                        request.merkle_root_block,
                    ))),
                }),
        );

        Ok(GetOutputsResponse {
            results,
            num_blocks: Self::block_count_for(self.ledger_size),
            global_txo_count: self.ledger_size,
        })
    }
}

struct KeyImageState {
    num_blocks: u64,
    spent: HashMap<KeyImage, u64>,
    result_codes: HashMap<KeyImage, KeyImageResultCode>,
    drop_last_result: bool,
    reverse_results: bool,
    failure: Option<ConnectionError>,
    requests: Vec<CheckKeyImagesRequest>,
}

/// A key image service whose ledger has `num_blocks` blocks.
pub struct MockKeyImageService {
    state: Mutex<KeyImageState>,
}

impl MockKeyImageService {
    pub fn new(num_blocks: u64) -> Self {
        MockKeyImageService {
            state: Mutex::new(KeyImageState {
                num_blocks,
                spent: HashMap::new(),
                result_codes: HashMap::new(),
                drop_last_result: false,
                reverse_results: false,
                failure: None,
                requests: vec![],
            }),
        }
    }

    pub fn set_num_blocks(&self, num_blocks: u64) {
        self.state.lock().unwrap().num_blocks = num_blocks;
    }

    pub fn mark_spent(&self, key_image: KeyImage, block_index: u64) {
        self.state.lock().unwrap().spent.insert(key_image, block_index);
    }

    pub fn set_result_code(&self, key_image: KeyImage, code: KeyImageResultCode) {
        self.state
            .lock()
            .unwrap()
            .result_codes
            .insert(key_image, code);
    }

    /// Answers every request with one result too few.
    pub fn drop_last_result(&self) {
        self.state.lock().unwrap().drop_last_result = true;
    }

    /// Answers every request with its results in reverse order.
    pub fn reverse_results(&self) {
        self.state.lock().unwrap().reverse_results = true;
    }

    pub fn fail_with(&self, error: ConnectionError) {
        self.state.lock().unwrap().failure = Some(error);
    }

    pub fn clear_failure(&self) {
        self.state.lock().unwrap().failure = None;
    }

    pub fn requests(&self) -> Vec<CheckKeyImagesRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl FogKeyImageService for MockKeyImageService {
    async fn check_key_images(
        &self,
        request: CheckKeyImagesRequest,
    ) -> Result<CheckKeyImagesResponse, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }

        let mut results: Vec<KeyImageResult> = request
            .queries
            .into_iter()
            .map(|query| {
                let wire = query.key_image.expect("queries carry key images");
                let key_image = KeyImage::try_from(&wire).expect("well-formed key image");
                let spent_at = state.spent.get(&key_image).copied();
                let code = state.result_codes.get(&key_image).copied().unwrap_or(
                    if spent_at.is_some() {
                        KeyImageResultCode::Spent
                    } else {
                        KeyImageResultCode::NotSpent
                    },
                );
                KeyImageResult {
                    key_image: Some(wire),
                    spent_at: spent_at.unwrap_or(0),
                    timestamp: 0,
                    key_image_result_code: code as i32,
                }
            })
            .collect();
        if state.drop_last_result {
            results.pop();
        }
        if state.reverse_results {
            results.reverse();
        }

        Ok(CheckKeyImagesResponse {
            num_blocks: state.num_blocks,
            global_txo_count: state.num_blocks * OUTPUTS_PER_BLOCK,
            results,
        })
    }
}

#[derive(Default)]
struct BlockState {
    requests: Vec<BlockRequest>,
    omitted: HashSet<u64>,
    duplicated: HashSet<u64>,
    unrequested: Vec<u64>,
    failure: Option<ConnectionError>,
}

/// A block service for a ledger of `num_blocks` blocks of `outputs_per_block` outputs
/// each, so that block `b` holds the global indices `b * outputs_per_block` up to
/// `(b + 1) * outputs_per_block`.
pub struct MockBlockService {
    num_blocks: u64,
    outputs_per_block: u64,
    state: Mutex<BlockState>,
}

impl MockBlockService {
    pub fn new(num_blocks: u64, outputs_per_block: u64) -> Self {
        MockBlockService {
            num_blocks,
            outputs_per_block,
            state: Mutex::new(BlockState::default()),
        }
    }

    fn block(&self, index: u64) -> BlockData {
        let first = index * self.outputs_per_block;
        let end = first + self.outputs_per_block;
        BlockData {
            index,
            global_txo_count: end,
            outputs: (first..end)
                .map(|global_index| external::TxOut::from(&fake_tx_out(global_index)))
                .collect(),
            timestamp: 1_700_000_000 + index,
        }
    }

    pub fn omit_block(&self, index: u64) {
        self.state.lock().unwrap().omitted.insert(index);
    }

    pub fn duplicate_block(&self, index: u64) {
        self.state.lock().unwrap().duplicated.insert(index);
    }

    /// Appends block `index` to every response, whether or not it was requested.
    pub fn add_unrequested_block(&self, index: u64) {
        self.state.lock().unwrap().unrequested.push(index);
    }

    pub fn fail_with(&self, error: ConnectionError) {
        self.state.lock().unwrap().failure = Some(error);
    }

    pub fn clear_failure(&self) {
        self.state.lock().unwrap().failure = None;
    }

    pub fn requests(&self) -> Vec<BlockRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl FogBlockService for MockBlockService {
    async fn get_blocks(&self, request: BlockRequest) -> Result<BlockResponse, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }

        let mut blocks = vec![];
        for range in &request.ranges {
            for index in range.start_block..range.end_block.min(self.num_blocks) {
                if state.omitted.contains(&index) {
                    continue;
                }
                blocks.push(self.block(index));
                if state.duplicated.contains(&index) {
                    blocks.push(self.block(index));
                }
            }
        }
        blocks.extend(state.unrequested.iter().map(|&index| self.block(index)));

        Ok(BlockResponse {
            blocks,
            num_blocks: self.num_blocks,
            global_txo_count: self.num_blocks * self.outputs_per_block,
        })
    }
}

/// A view key that owns a fixed set of the fake ledger's outputs.
pub struct MockScanningKey {
    owned: HashSet<TxOutPublicKey>,
}

impl MockScanningKey {
    /// Constructs a key owning the outputs at the given global indices.
    pub fn owning<I: IntoIterator<Item = u64>>(global_indices: I) -> Self {
        MockScanningKey {
            owned: global_indices
                .into_iter()
                .map(|i| *fake_tx_out(i).public_key())
                .collect(),
        }
    }
}

impl ScanningKey for MockScanningKey {
    fn try_match(&self, tx_out: &TxOut, location: TxOutLocation) -> Option<KnownTxOut> {
        self.owned.contains(tx_out.public_key()).then(|| {
            KnownTxOut::from_parts(
                tx_out.clone(),
                location,
                fake_value(location.global_index()),
                0,
                fake_key_image(location.global_index()),
            )
        })
    }
}

#[derive(Default)]
struct FetcherState {
    queued: VecDeque<TxOutFetchBatch>,
    failure: Option<ConnectionError>,
    stall_next: bool,
    cursors: Vec<TxOutFetchCursor>,
}

/// A Fog view client that replays queued batches.
///
/// Each fetch yields every batch queued so far and then, if a failure has been set, that
/// failure.
#[derive(Default)]
pub struct MockTxOutFetcher {
    state: Mutex<FetcherState>,
}

impl MockTxOutFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, batch: TxOutFetchBatch) {
        self.state.lock().unwrap().queued.push_back(batch);
    }

    pub fn fail_with(&self, error: ConnectionError) {
        self.state.lock().unwrap().failure = Some(error);
    }

    pub fn clear_failure(&self) {
        self.state.lock().unwrap().failure = None;
    }

    /// Makes the next fetch never complete after yielding its batches.
    pub fn stall_next(&self) {
        self.state.lock().unwrap().stall_next = true;
    }

    /// Returns the cursor each fetch started from.
    pub fn cursors(&self) -> Vec<TxOutFetchCursor> {
        self.state.lock().unwrap().cursors.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().cursors.len()
    }
}

impl TxOutFetcher for MockTxOutFetcher {
    fn fetch_tx_outs(
        &self,
        cursor: TxOutFetchCursor,
    ) -> BoxStream<'_, Result<TxOutFetchBatch, ConnectionError>> {
        let mut state = self.state.lock().unwrap();
        state.cursors.push(cursor);

        let mut items: Vec<Result<TxOutFetchBatch, ConnectionError>> =
            state.queued.drain(..).map(Ok).collect();
        if let Some(e) = &state.failure {
            items.push(Err(e.clone()));
        }

        if std::mem::take(&mut state.stall_next) {
            stream::iter(items).chain(stream::pending()).boxed()
        } else {
            stream::iter(items).boxed()
        }
    }
}
