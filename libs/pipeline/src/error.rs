use flow_codec::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("stream corrupt after {errors} consecutive decode errors, last: {last}")]
    StreamCorrupt { errors: u32, last: DecodeError },

    #[error("output write: {0}")]
    Output(#[from] std::io::Error),

    #[error("output encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("pump task: {0}")]
    Pump(#[from] tokio::task::JoinError),
}
