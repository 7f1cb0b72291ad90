use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },
}
