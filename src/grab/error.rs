use thiserror::Error;

use crate::remote::{ResultCode, TransportError};

/// Why a grab loop run ended.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("grab returned {code}")]
    Status { code: ResultCode },

    #[error("grab transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("item processing failed: {0:#}")]
    Processor(anyhow::Error),
}

impl GrabError {
    /// The operation the failure happened in.
    pub fn context(&self) -> &'static str {
        "grab"
    }

    /// HTTP-like code for the failure: the status code for non-Ok results,
    /// 500 for local faults.
    pub fn http_code(&self) -> u16 {
        match self {
            Self::Status { code } => code.http_status(),
            Self::Transport(_) | Self::Processor(_) => 500,
        }
    }
}
