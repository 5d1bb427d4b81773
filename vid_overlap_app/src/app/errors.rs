use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read {}", .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fingerprints in {}", .path.display())]
    ParseInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write output")]
    WriteOutput(#[from] std::io::Error),

    #[error("Failed to serialize output")]
    SerializeOutput(#[from] serde_json::Error),
}
