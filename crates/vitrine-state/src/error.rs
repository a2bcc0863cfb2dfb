use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("model catalog is empty")]
    EmptyCatalog,

    #[error("invalid view settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
