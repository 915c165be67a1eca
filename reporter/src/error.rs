#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not write report file `{path}`: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("could not read report file `{path}`: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("could not encode rejection report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("request to rejected-tx endpoint failed: {0}")]
    Request(#[from] reqwest::Error),
}
