use crate::core_driver::DriverError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Failure to establish the data channel. Always answered with `425`, never
/// confused with a storage error.
#[derive(Debug, Error)]
pub enum DataConnError {
    #[error("no data connection was negotiated")]
    NotNegotiated,

    #[error("failed to open passive listener: {0}")]
    Bind(#[source] io::Error),

    #[error("client did not connect to the passive port in time")]
    AcceptTimeout,

    #[error("failed to accept data connection: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Dial {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("timed out connecting to {0}")]
    DialTimeout(SocketAddr),

    #[error("data connection setup was cancelled")]
    Cancelled,
}

impl DataConnError {
    pub fn to_ftp_response(&self) -> &'static str {
        match self {
            DataConnError::NotNegotiated => "425 Use PORT or PASV first.",
            _ => "425 Can't open data connection.",
        }
    }
}

/// Malformed `PORT`/`EPRT` argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("malformed address argument: {0}")]
    Syntax(String),

    #[error("unsupported network protocol {0}")]
    UnsupportedFamily(String),
}

impl AddressError {
    pub fn to_ftp_response(&self) -> &'static str {
        match self {
            AddressError::Syntax(_) => "501 Syntax error in parameters or arguments.",
            AddressError::UnsupportedFamily(_) => "522 Network protocol not supported, use (1,2).",
        }
    }
}

/// Outcome of a failed `RETR`, `STOR`, `APPE`, `LIST` or `NLST`.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    DataConnection(#[from] DataConnError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("transfer aborted")]
    Aborted,

    #[error("data connection failed mid-transfer: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            TransferError::DataConnection(e) => e.to_ftp_response().to_string(),
            TransferError::Driver(e) => e.to_ftp_response(),
            TransferError::Aborted | TransferError::Io(_) => {
                "426 Connection closed; transfer aborted.".to_string()
            }
        }
    }
}
