//! Connection acceptor
//!
//! Binds the listening socket (with address reuse, so a restart does not
//! wait out TIME_WAIT) and hands each accepted connection to the
//! [`ServeSessionUseCase`]. By default connections are served one at a
//! time; later clients wait in the listen backlog.

use bridge_application::{ServeSessionUseCase, SessionError, SessionSummary};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const LISTEN_BACKLOG: u32 = 128;

/// Pause after a failed accept before the next attempt.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Errors that stop the acceptor.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Could not resolve listen address {0}")]
    Resolve(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Session fault: {0}")]
    Fatal(#[source] SessionError),
}

/// Listener settings.
#[derive(Debug, Clone)]
pub struct AcceptorSettings {
    pub host: String,
    pub port: u16,
    /// Serve each connection on its own task
    pub concurrent: bool,
}

impl AcceptorSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            concurrent: false,
        }
    }

    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts kernel connections and serves them.
pub struct ConnectionAcceptor {
    listener: TcpListener,
    use_case: ServeSessionUseCase,
    concurrent: bool,
}

impl ConnectionAcceptor {
    /// Bind the listening socket.
    pub async fn bind(
        settings: &AcceptorSettings,
        use_case: ServeSessionUseCase,
    ) -> Result<Self, ServerError> {
        let address = settings.address();
        let addr = tokio::net::lookup_host(&address)
            .await
            .map_err(|_| ServerError::Resolve(address.clone()))?
            .next()
            .ok_or_else(|| ServerError::Resolve(address.clone()))?;

        let listener = bind_reusable(addr).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;

        Ok(Self {
            listener,
            use_case,
            concurrent: settings.concurrent,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve connections until `shutdown` fires or a session reports a fatal
    /// backend fault.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        match self.local_addr() {
            Ok(addr) => info!(%addr, concurrent = self.concurrent, "Listening for kernel connections"),
            Err(e) => warn!("Listening (address unavailable: {})", e),
        }

        if self.concurrent {
            self.run_concurrent(shutdown).await
        } else {
            self.run_sequential(shutdown).await
        }
    }

    async fn run_sequential(&self, shutdown: CancellationToken) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Acceptor shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        accept_backoff(e, &shutdown).await;
                        continue;
                    }
                },
            };

            let peer = peer.to_string();
            info!(%peer, "Kernel connected");

            let outcome = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(%peer, "Acceptor shutting down, dropping active session");
                    return Ok(());
                }
                outcome = self.use_case.execute(stream, &peer) => outcome,
            };

            finish_session(&peer, outcome)?;
        }
    }

    async fn run_concurrent(&self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let (fault_tx, mut fault_rx) = mpsc::channel::<SessionError>(1);
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(active = sessions.len(), "Acceptor shutting down");
                    sessions.abort_all();
                    return Ok(());
                }
                Some(fault) = fault_rx.recv() => {
                    sessions.abort_all();
                    return Err(ServerError::Fatal(fault));
                }
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            accept_backoff(e, &shutdown).await;
                            continue;
                        }
                    };

                    let peer = peer.to_string();
                    info!(%peer, "Kernel connected");

                    let use_case = self.use_case.clone();
                    let fault_tx = fault_tx.clone();
                    sessions.spawn(async move {
                        let outcome = use_case.execute(stream, &peer).await;
                        if let Err(ServerError::Fatal(fault)) = finish_session(&peer, outcome) {
                            let _ = fault_tx.send(fault).await;
                        }
                    });
                }
            }
        }
    }
}

/// Log how a session ended; only fatal faults are passed up.
fn finish_session(
    peer: &str,
    outcome: Result<SessionSummary, SessionError>,
) -> Result<(), ServerError> {
    match outcome {
        Ok(summary) => {
            info!(
                peer,
                answered = summary.answered,
                failures = summary.failures,
                "Kernel disconnected"
            );
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!(peer, "Fatal backend fault: {}", e);
            Err(ServerError::Fatal(e))
        }
        Err(e) => {
            warn!(peer, "Session ended with error: {}", e);
            Ok(())
        }
    }
}

/// Log a failed accept and wait before retrying. Errors such as running out
/// of file descriptors repeat immediately, so the loop must not retry hot.
async fn accept_backoff(error: io::Error, shutdown: &CancellationToken) {
    warn!(retry_ms = ACCEPT_RETRY_DELAY.as_millis() as u64, "Accept failed: {}", error);
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(ACCEPT_RETRY_DELAY) => {}
    }
}

fn bind_reusable(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    debug!(%addr, "Socket bound");
    socket.listen(LISTEN_BACKLOG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_application::{BackendFault, DispatchParams, InferenceBackend};
    use bridge_domain::{BackendKind, BackendReply, BackendRequest};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    /// Echoes queries; `crash` faults when the backend is local.
    struct EchoBackend {
        kind: BackendKind,
    }

    #[async_trait]
    impl InferenceBackend for EchoBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn describe(&self) -> String {
            "echo".to_string()
        }

        async fn complete(&self, request: &BackendRequest) -> Result<BackendReply, BackendFault> {
            if request.query == "crash" {
                return Err(BackendFault::Model("model exploded".to_string()));
            }
            Ok(BackendReply::Text(format!("echo {}", request.query)))
        }
    }

    struct Running {
        addr: SocketAddr,
        shutdown: CancellationToken,
        handle: JoinHandle<Result<(), ServerError>>,
    }

    async fn start(kind: BackendKind, concurrent: bool) -> Running {
        let use_case =
            ServeSessionUseCase::new(Arc::new(EchoBackend { kind }), DispatchParams::default());
        let settings = AcceptorSettings::new("127.0.0.1", 0).with_concurrent(concurrent);
        let acceptor = ConnectionAcceptor::bind(&settings, use_case).await.unwrap();
        let addr = acceptor.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(acceptor.run(shutdown.clone()));
        Running {
            addr,
            shutdown,
            handle,
        }
    }

    async fn ask(stream: &mut BufReader<TcpStream>, request: &str) -> String {
        stream.get_mut().write_all(request.as_bytes()).await.unwrap();
        let mut line = String::new();
        stream.read_line(&mut line).await.unwrap();
        line
    }

    async fn connect(addr: SocketAddr) -> BufReader<TcpStream> {
        BufReader::new(TcpStream::connect(addr).await.unwrap())
    }

    #[tokio::test]
    async fn test_serves_request_over_tcp() {
        let server = start(BackendKind::Remote, false).await;
        let mut client = connect(server.addr).await;

        assert_eq!(ask(&mut client, "boot log\nAI_REQ: hi\n").await, "echo hi\n");
        assert_eq!(ask(&mut client, "AI_REQ: again\n").await, "echo again\n");

        server.shutdown.cancel();
        assert!(server.handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_sequential_mode_queues_second_client() {
        let server = start(BackendKind::Remote, false).await;

        let first = connect(server.addr).await;
        let mut second = connect(server.addr).await;
        second
            .get_mut()
            .write_all(b"AI_REQ: waiting\n")
            .await
            .unwrap();

        let mut line = String::new();
        let early = tokio::time::timeout(
            Duration::from_millis(200),
            second.read_line(&mut line),
        )
        .await;
        assert!(early.is_err(), "second client answered while first was open");

        drop(first);
        second.read_line(&mut line).await.unwrap();
        assert_eq!(line, "echo waiting\n");

        server.shutdown.cancel();
        assert!(server.handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_mode_serves_clients_in_parallel() {
        let server = start(BackendKind::Remote, true).await;

        let mut first = connect(server.addr).await;
        let mut second = connect(server.addr).await;

        assert_eq!(ask(&mut second, "AI_REQ: two\n").await, "echo two\n");
        assert_eq!(ask(&mut first, "AI_REQ: one\n").await, "echo one\n");

        server.shutdown.cancel();
        assert!(server.handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_remote_fault_keeps_serving() {
        let server = start(BackendKind::Remote, false).await;
        let mut client = connect(server.addr).await;

        assert_eq!(
            ask(&mut client, "AI_REQ: crash\n").await,
            "ERROR: Model failure: model exploded\n"
        );
        assert_eq!(ask(&mut client, "AI_REQ: ok\n").await, "echo ok\n");

        server.shutdown.cancel();
        assert!(server.handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_local_fault_stops_acceptor() {
        for concurrent in [false, true] {
            let server = start(BackendKind::Local, concurrent).await;
            let mut client = connect(server.addr).await;

            client
                .get_mut()
                .write_all(b"AI_REQ: crash\n")
                .await
                .unwrap();

            let result = server.handle.await.unwrap();
            assert!(matches!(
                result,
                Err(ServerError::Fatal(SessionError::Backend(_)))
            ));

            let mut line = String::new();
            let n = client.read_line(&mut line).await.unwrap_or(0);
            assert_eq!(n, 0, "no reply line may be written for a faulted request");
        }
    }

    #[tokio::test]
    async fn test_client_disconnect_does_not_stop_acceptor() {
        let server = start(BackendKind::Remote, false).await;

        {
            let mut client = connect(server.addr).await;
            client
                .get_mut()
                .write_all(b"AI_REQ: half a reque")
                .await
                .unwrap();
        }

        let mut client = connect(server.addr).await;
        assert_eq!(ask(&mut client, "AI_REQ: next\n").await, "echo next\n");

        server.shutdown.cancel();
        assert!(server.handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_while_session_active() {
        let server = start(BackendKind::Remote, false).await;
        let _client = connect(server.addr).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        server.shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(2), server.handle)
            .await
            .expect("acceptor did not stop");
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_port_is_rebindable_after_close() {
        let use_case = ServeSessionUseCase::new(
            Arc::new(EchoBackend {
                kind: BackendKind::Remote,
            }),
            DispatchParams::default(),
        );
        let first = ConnectionAcceptor::bind(&AcceptorSettings::new("127.0.0.1", 0), use_case.clone())
            .await
            .unwrap();
        let port = first.local_addr().unwrap().port();

        // Leave a connection in TIME_WAIT on the server side.
        let client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let (accepted, _) = first.listener.accept().await.unwrap();
        drop(accepted);
        drop(client);
        drop(first);

        let second = ConnectionAcceptor::bind(&AcceptorSettings::new("127.0.0.1", port), use_case)
            .await
            .unwrap();
        assert_eq!(second.local_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let use_case = ServeSessionUseCase::new(
            Arc::new(EchoBackend {
                kind: BackendKind::Remote,
            }),
            DispatchParams::default(),
        );

        let result = ConnectionAcceptor::bind(&AcceptorSettings::new("127.0.0.1", port), use_case).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_accept_error_waits_before_retry() {
        let shutdown = CancellationToken::new();
        let started = Instant::now();
        accept_backoff(io::Error::other("too many open files"), &shutdown).await;
        assert!(started.elapsed() >= ACCEPT_RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_accept_backoff_ends_on_shutdown() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let started = Instant::now();
        accept_backoff(io::Error::other("too many open files"), &shutdown).await;
        assert!(started.elapsed() < ACCEPT_RETRY_DELAY);
    }
}
