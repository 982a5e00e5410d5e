use fog_protocol::KeyImage;
use tracing::{debug, info, warn};

use crate::{
    error::ConnectionError,
    proto::{
        external,
        ledger::{CheckKeyImagesRequest, CheckKeyImagesResponse, KeyImageQuery, KeyImageResultCode},
        ProtoError,
    },
};

use super::FogKeyImageService;

/// What the ledger reports about a key image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyImageSpentStatus {
    /// The key image appears in the block at `block_index`.
    Spent { block_index: u64 },
    /// The key image does not appear in any of the first `checked_block_count` blocks.
    NotSpent { checked_block_count: u64 },
}

impl KeyImageSpentStatus {
    pub fn is_spent(&self) -> bool {
        matches!(self, KeyImageSpentStatus::Spent { .. })
    }

    /// Returns the block index from which a later query for the same key image should
    /// start, or `None` once the key image is known to be spent.
    pub fn next_query_block_index(&self) -> Option<u64> {
        match self {
            KeyImageSpentStatus::Spent { .. } => None,
            KeyImageSpentStatus::NotSpent {
                checked_block_count,
            } => Some(*checked_block_count),
        }
    }
}

/// Queries the spent status of key images.
pub struct KeyImageChecker<S> {
    service: S,
}

impl<S: FogKeyImageService> KeyImageChecker<S> {
    pub fn new(service: S) -> Self {
        KeyImageChecker { service }
    }

    /// Checks each `(key image, start block)` query and returns one status per query, in
    /// query order.
    ///
    /// The service must answer every query, in order. A response of the wrong length, or
    /// one whose key images do not line up with the queries, fails with
    /// [`ConnectionError::ProtocolViolation`]; results are never paired up by truncating
    /// to the shorter list. An empty query list succeeds without contacting the service.
    pub async fn check_key_images(
        &self,
        queries: &[(KeyImage, u64)],
    ) -> Result<Vec<KeyImageSpentStatus>, ConnectionError> {
        if queries.is_empty() {
            debug!("0 key images to check, skipping.");
            return Ok(vec![]);
        }

        info!("Checking {} key images", queries.len());
        let request = CheckKeyImagesRequest {
            queries: queries
                .iter()
                .map(|(key_image, start_block)| KeyImageQuery {
                    key_image: Some(external::KeyImage::from(key_image)),
                    start_block: *start_block,
                })
                .collect(),
        };
        let response = self.service.check_key_images(request).await?;
        parse_response(queries, response)
    }
}

fn parse_response(
    queries: &[(KeyImage, u64)],
    response: CheckKeyImagesResponse,
) -> Result<Vec<KeyImageSpentStatus>, ConnectionError> {
    if response.results.len() != queries.len() {
        warn!(
            "Key image check returned {} results for {} queries",
            response.results.len(),
            queries.len()
        );
        return Err(ConnectionError::ProtocolViolation(format!(
            "CheckKeyImages returned {} results for {} queries",
            response.results.len(),
            queries.len()
        )));
    }

    let num_blocks = response.num_blocks;
    queries
        .iter()
        .zip(response.results)
        .enumerate()
        .map(|(position, ((queried, _), result))| {
            let returned = result
                .key_image
                .as_ref()
                .ok_or(ProtoError::MissingField("key_image"))
                .and_then(KeyImage::try_from)?;
            if &returned != queried {
                return Err(ConnectionError::ProtocolViolation(format!(
                    "CheckKeyImages result {} does not answer the query at that position",
                    position
                )));
            }

            match KeyImageResultCode::try_from(result.key_image_result_code) {
                Ok(KeyImageResultCode::Spent) => Ok(KeyImageSpentStatus::Spent {
                    block_index: result.spent_at,
                }),
                Ok(KeyImageResultCode::NotSpent) => Ok(KeyImageSpentStatus::NotSpent {
                    checked_block_count: num_blocks,
                }),
                Ok(code) => Err(ConnectionError::InvalidServerResponse(format!(
                    "Fog KeyImage result error: {}",
                    code.as_str_name()
                ))),
                Err(_) => Err(ConnectionError::InvalidServerResponse(format!(
                    "Fog KeyImage result error: unrecognized code {}",
                    result.key_image_result_code
                ))),
            }
        })
        .collect()
}
