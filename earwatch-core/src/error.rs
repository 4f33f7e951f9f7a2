use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown verdict token: {0:?}")]
    UnknownVerdict(String),
}

pub type Result<T> = std::result::Result<T, Error>;
