use std::path::PathBuf;

/// Errors raised while reading or writing toolpath files.
#[derive(Debug, thiserror::Error)]
pub enum ToolpathError {
    #[error("failed to access toolpath file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed toolpath data: {0}")]
    Parse(#[from] serde_json::Error),
}
