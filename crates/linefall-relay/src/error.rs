use std::{io, net::SocketAddr};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}
