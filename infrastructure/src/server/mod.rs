//! TCP listener for kernel console connections.

mod acceptor;

pub use acceptor::{AcceptorSettings, ConnectionAcceptor, ServerError};
