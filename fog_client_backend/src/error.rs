//! Types for Fog client error handling.

use std::error;
use std::fmt;

use crate::proto::ProtoError;

/// Errors that can occur while talking to a Fog service.
///
/// This includes responses that arrived intact but cannot be trusted: payloads that fail
/// to parse, and responses whose shape does not match the request they answer. None of
/// these are retried here; the caller owns the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The transport failed before a response was received.
    ConnectionFailure(String),

    /// The service rejected the client's credentials.
    AuthorizationFailure(String),

    /// The service returned a payload that could not be parsed, or an error result code.
    InvalidServerResponse(String),

    /// The shape of the response does not match the shape of the request, such as a
    /// result list of the wrong length or a requested index missing from the results.
    ProtocolViolation(String),

    /// The service requires a newer client.
    OutdatedClient(String),

    /// The service is throttling this client.
    ServerRateLimited(String),

    /// The operation was superseded by a newer one before it completed.
    Cancelled,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailure(e) => write!(f, "Connection failure: {}", e),
            ConnectionError::AuthorizationFailure(e) => write!(f, "Authorization failure: {}", e),
            ConnectionError::InvalidServerResponse(e) => {
                write!(f, "Invalid server response: {}", e)
            }
            ConnectionError::ProtocolViolation(e) => {
                write!(f, "Server response violates the protocol: {}", e)
            }
            ConnectionError::OutdatedClient(e) => write!(f, "Outdated client: {}", e),
            ConnectionError::ServerRateLimited(e) => write!(f, "Server rate limited: {}", e),
            ConnectionError::Cancelled => {
                write!(f, "The operation was cancelled by a newer request")
            }
        }
    }
}

impl error::Error for ConnectionError {}

impl From<ProtoError> for ConnectionError {
    fn from(e: ProtoError) -> Self {
        ConnectionError::InvalidServerResponse(e.to_string())
    }
}

/// Errors that can occur when fetching outputs and their membership proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerkleProofFetcherError {
    /// The request failed, or the response could not be trusted.
    Connection(ConnectionError),

    /// A requested index is beyond the current size of the ledger.
    ///
    /// This is not a failure of the service: the ledger has not grown far enough yet, and
    /// the same request may succeed once it has. The ledger's reported size is included
    /// so that the caller can decide how long to wait.
    OutOfBounds {
        block_count: u64,
        ledger_tx_out_count: u64,
    },
}

impl fmt::Display for MerkleProofFetcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleProofFetcherError::Connection(e) => {
                write!(f, "Fog Merkle proof fetcher error: {}", e)
            }
            MerkleProofFetcherError::OutOfBounds {
                block_count,
                ledger_tx_out_count,
            } => write!(
                f,
                "Fog Merkle proof fetcher error: Out of bounds: blockCount: {}, globalTxOutCount: {}",
                block_count, ledger_tx_out_count
            ),
        }
    }
}

impl error::Error for MerkleProofFetcherError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MerkleProofFetcherError::Connection(e) => Some(e),
            MerkleProofFetcherError::OutOfBounds { .. } => None,
        }
    }
}

impl From<ConnectionError> for MerkleProofFetcherError {
    fn from(e: ConnectionError) -> Self {
        MerkleProofFetcherError::Connection(e)
    }
}

impl From<ProtoError> for MerkleProofFetcherError {
    fn from(e: ProtoError) -> Self {
        MerkleProofFetcherError::Connection(e.into())
    }
}

/// The inputs to an operation are inconsistent with one another.
///
/// When building a ring, this means the fetched ring does not contain the output being
/// spent. Retrying with the same ring cannot succeed; the ring must be fetched again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidInputError(String);

impl InvalidInputError {
    pub fn new(reason: impl Into<String>) -> Self {
        InvalidInputError(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid input: {}", self.0)
    }
}

impl error::Error for InvalidInputError {}

/// Errors that can occur when preparing the inputs of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareInputsError {
    /// Fetching the rings failed.
    Fetch(MerkleProofFetcherError),

    /// A fetched ring is inconsistent with the output it was fetched for.
    InvalidInput(InvalidInputError),
}

impl fmt::Display for PrepareInputsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrepareInputsError::Fetch(e) => write!(f, "Failed to fetch rings: {}", e),
            PrepareInputsError::InvalidInput(e) => write!(f, "Failed to prepare input: {}", e),
        }
    }
}

impl error::Error for PrepareInputsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PrepareInputsError::Fetch(e) => Some(e),
            PrepareInputsError::InvalidInput(e) => Some(e),
        }
    }
}

impl From<MerkleProofFetcherError> for PrepareInputsError {
    fn from(e: MerkleProofFetcherError) -> Self {
        PrepareInputsError::Fetch(e)
    }
}

impl From<InvalidInputError> for PrepareInputsError {
    fn from(e: InvalidInputError) -> Self {
        PrepareInputsError::InvalidInput(e)
    }
}
