use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read device file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed device file: {0}")]
    Parse(#[source] csv::Error),

    #[error("Device file has no header row")]
    MissingHeader,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<csv::Error> for Error {
    /// I/O failures surfaced by the CSV reader keep their I/O classification.
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Error::Parse(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Error::Io(e),
            kind => Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{kind:?}"),
            )),
        }
    }
}
