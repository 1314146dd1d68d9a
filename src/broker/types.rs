use super::BrokerError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const MSG_NEW_QUERY: &str = "newQuery";
pub const FUNC_CONC_EXAMPLE: &str = "concExample";

pub const DEFAULT_QUEUE_KEY: &str = "mqueryQueue";
pub const DEFAULT_RESULT_CHANNEL_PREFIX: &str = "mqueryResults";
pub const DEFAULT_QUERY_CHANNEL: &str = "mqueryQueries";
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_QUERY_ANSWER_TIMEOUT: Duration = Duration::from_secs(60);

/// Message a worker publishes when a concordance request exceeds the
/// available rows. Matched by string equality on the receiving side to
/// reclassify the failure (see `TransmittedError`).
pub const ERR_ROWS_RANGE_OUT_OF_CONC: &str = "rowsRangeOutOfConc";

/// A single unit of work published to the corpus workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Reply channel, `<prefix>:<uuid>`. Filled in by the adapter on publish.
    pub channel: String,
    /// Function tag dispatched by the worker, e.g. `concExample`.
    pub func: String,
    pub args: ConcArgs,
}

/// Arguments of a concordance job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcArgs {
    pub corpus_path: String,
    pub query: String,
    pub attrs: Vec<String>,
    pub max_items: usize,
    pub start_line: usize,
    pub max_context: usize,
    pub view_context_struct: String,
}

/// A worker error flattened for the wire.
///
/// Workers cannot serialize arbitrary native error values, so they transmit
/// `{message, type_name}` and the receiving side reclassifies by comparing
/// `message` against published sentinels such as
/// [`ERR_ROWS_RANGE_OUT_OF_CONC`]. Unknown messages stay generic failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmittedError {
    pub message: String,
    pub type_name: String,
}

impl TransmittedError {
    pub fn new(message: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            type_name: type_name.into(),
        }
    }

    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        Self {
            message: err.to_string(),
            type_name: std::any::type_name::<E>().to_string(),
        }
    }

    /// Flatten an `anyhow` chain, keeping an already-transmitted error as is.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(transmitted) = err.downcast_ref::<TransmittedError>() {
            return transmitted.clone();
        }
        Self {
            message: err.to_string(),
            type_name: "anyhow::Error".to_string(),
        }
    }

    pub fn is_rows_range_out_of_conc(&self) -> bool {
        self.message == ERR_ROWS_RANGE_OUT_OF_CONC
    }
}

impl fmt::Display for TransmittedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransmittedError({}: {})", self.type_name, self.message)
    }
}

impl std::error::Error for TransmittedError {}

/// One token of a concordance line; `strong` marks in-hit tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineToken {
    pub word: String,
    pub strong: bool,
}

/// One concordance line, ordered as the worker produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: Vec<LineToken>,
}

/// Result of one concordance job, as stored under the reply key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcResult {
    pub conc_size: usize,
    pub query: String,
    pub lines: Vec<Line>,
    pub error: Option<TransmittedError>,
}

impl ConcResult {
    pub fn from_error(error: TransmittedError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn err(&self) -> Option<&TransmittedError> {
        self.error.as_ref()
    }

    pub fn encode(&self) -> Result<Vec<u8>, BrokerError> {
        rmp_serde::to_vec_named(self).map_err(|e| BrokerError::Encode(e.to_string()))
    }

    pub fn decode(payload: &[u8]) -> Result<Self, BrokerError> {
        rmp_serde::from_slice(payload).map_err(|e| BrokerError::Decode(e.to_string()))
    }
}

impl Job {
    pub fn encode(&self) -> Result<Vec<u8>, BrokerError> {
        rmp_serde::to_vec_named(self).map_err(|e| BrokerError::Encode(e.to_string()))
    }

    pub fn decode(payload: &[u8]) -> Result<Self, BrokerError> {
        rmp_serde::from_slice(payload).map_err(|e| BrokerError::Decode(e.to_string()))
    }
}
