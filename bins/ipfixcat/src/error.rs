#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error("config: {0}")]
    Config(String),

    #[error("dictionary: {0}")]
    Dictionary(#[from] flow_codec::DictionaryError),

    #[error("{0}")]
    Pipeline(#[from] pipeline::PipelineError),

    #[error("input '{path}': {source}")]
    Input { path: String, source: std::io::Error },
}
