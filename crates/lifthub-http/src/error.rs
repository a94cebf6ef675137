//! HTTP server errors.

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("invalid listen address {0}")]
    InvalidAddr(String),
}

pub type HttpResult<T> = Result<T, HttpError>;
