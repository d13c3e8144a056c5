#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to {endpoint} failed [{status}]: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
}
