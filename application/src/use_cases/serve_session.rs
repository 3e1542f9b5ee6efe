//! Serve Session use case.
//!
//! Drives one client connection from accept to close:
//!
//! 1. Read up to `read_buffer_size` bytes (blocking until data or EOF)
//! 2. Decode leniently and feed the [`RequestFramer`]
//! 3. For each framed request, call the backend, normalize the reply and
//!    write exactly one line back
//! 4. Stop when the peer closes the connection
//!
//! Nothing is read while a backend call is outstanding: the client has to
//! wait for its reply line before the next request is looked at.

use crate::config::DispatchParams;
use crate::ports::inference_backend::{BackendFault, InferenceBackend};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use bridge_domain::{
    BackendReply, BackendRequest, FailurePolicy, Frame, Request, RequestFramer, SessionState,
    Utf8Decoder, WireLine, truncate,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, trace, warn};

/// Errors that end a session early.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend fault: {0}")]
    Backend(#[from] BackendFault),
}

impl SessionError {
    /// Whether the error must stop the whole process, not just this session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Backend(_))
    }
}

/// Counters reported when a session ends normally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Reply lines written (including failure lines).
    pub answered: usize,
    /// Requests whose query was empty.
    pub discarded: usize,
    /// Reply lines that reported a backend failure.
    pub failures: usize,
    /// Raw bytes received from the client.
    pub bytes_read: usize,
    /// Query bytes of a request still awaiting its terminator at close.
    pub unterminated_bytes: usize,
}

/// Use case for serving one connection.
///
/// Cheap to clone; the backend and transcript logger are shared.
#[derive(Clone)]
pub struct ServeSessionUseCase {
    backend: Arc<dyn InferenceBackend>,
    params: DispatchParams,
    transcript: Arc<dyn TranscriptLogger>,
}

impl ServeSessionUseCase {
    pub fn new(backend: Arc<dyn InferenceBackend>, params: DispatchParams) -> Self {
        Self {
            backend,
            params,
            transcript: Arc::new(NoTranscriptLogger),
        }
    }

    /// Create with a transcript logger.
    pub fn with_transcript_logger(mut self, logger: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = logger;
        self
    }

    /// Serve `stream` until the peer closes it.
    ///
    /// Returns the session counters on a clean close. I/O errors end only
    /// this session; a [`SessionError::Backend`] fault is fatal and no reply
    /// is written for the request that caused it.
    pub async fn execute<S>(&self, mut stream: S, peer: &str) -> Result<SessionSummary, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut decoder = Utf8Decoder::new();
        let mut framer = RequestFramer::new();
        let mut summary = SessionSummary::default();
        let mut state = SessionState::Accumulating;
        let mut read_buf = vec![0u8; self.params.read_buffer_size];

        self.transcript.log(TranscriptEvent::SessionOpened {
            peer: peer.to_string(),
        });

        loop {
            let n = stream.read(&mut read_buf).await?;
            if n == 0 {
                transition(&mut state, SessionState::Closed, peer);
                break;
            }
            summary.bytes_read += n;

            let fragment = decoder.decode(&read_buf[..n]);
            if fragment.is_empty() {
                continue;
            }
            trace!(target: "kernel", "{}", fragment);

            for frame in framer.push(&fragment) {
                match frame {
                    Frame::Discarded => {
                        debug!(peer, "Discarding request with empty query");
                        summary.discarded += 1;
                        self.transcript.log(TranscriptEvent::Discarded {
                            peer: peer.to_string(),
                        });
                    }
                    Frame::Request(request) => {
                        transition(&mut state, SessionState::Dispatching, peer);
                        let line = self.dispatch(&request, peer).await?;

                        stream.write_all(&line.to_bytes()).await?;
                        stream.flush().await?;

                        summary.answered += 1;
                        if line.is_failure() {
                            summary.failures += 1;
                        }
                        transition(&mut state, SessionState::Accumulating, peer);
                    }
                }
            }
        }

        if framer.is_request_pending() {
            summary.unterminated_bytes = framer.buffered().len();
            debug!(
                peer,
                bytes = summary.unterminated_bytes,
                "Dropping request without terminator"
            );
        }
        if decoder.has_pending() {
            debug!(peer, "Dropping incomplete UTF-8 sequence");
        }

        info!(
            peer,
            answered = summary.answered,
            discarded = summary.discarded,
            failures = summary.failures,
            "Session closed"
        );
        self.transcript.log(TranscriptEvent::SessionClosed {
            peer: peer.to_string(),
            answered: summary.answered,
            discarded: summary.discarded,
            failures: summary.failures,
            bytes_read: summary.bytes_read,
            unterminated_bytes: summary.unterminated_bytes,
        });

        Ok(summary)
    }

    /// Call the backend for one request and turn the outcome into a reply line.
    async fn dispatch(&self, request: &Request, peer: &str) -> Result<WireLine, BackendFault> {
        info!(peer, query = %truncate(request.query(), 100), "Dispatching request");
        self.transcript.log(TranscriptEvent::Request {
            peer: peer.to_string(),
            query: request.query().to_string(),
        });

        let backend_request = BackendRequest::new(
            self.params.system_prompt.as_str(),
            request,
            self.params.sampling.clone(),
        );
        let start = Instant::now();

        let outcome = match self.params.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.backend.complete(&backend_request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Ok(BackendReply::failure(format!(
                        "backend timed out after {}s",
                        limit.as_secs_f64()
                    ))),
                }
            }
            None => self.backend.complete(&backend_request).await,
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(fault) => match self.backend.kind().failure_policy() {
                FailurePolicy::FailFast => {
                    error!(peer, backend = %self.backend.kind(), "Backend fault: {}", fault);
                    self.transcript.log(TranscriptEvent::Fault {
                        peer: peer.to_string(),
                        cause: fault.to_string(),
                    });
                    return Err(fault);
                }
                FailurePolicy::ReplyAndContinue => BackendReply::failure(fault.to_string()),
            },
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let line = reply.to_wire_line();

        match &reply {
            BackendReply::Text(raw) => {
                debug!(peer, elapsed_ms, raw_len = raw.len(), "Backend replied");
                self.transcript.log(TranscriptEvent::Reply {
                    peer: peer.to_string(),
                    line: line.as_str().to_string(),
                    elapsed_ms,
                });
            }
            BackendReply::Failure(cause) => {
                warn!(peer, elapsed_ms, "Backend failure: {}", cause);
                self.transcript.log(TranscriptEvent::Failure {
                    peer: peer.to_string(),
                    cause: cause.clone(),
                    elapsed_ms,
                });
            }
        }

        Ok(line)
    }
}

fn transition(state: &mut SessionState, next: SessionState, peer: &str) {
    trace!(peer, from = %state, to = %next, "Session state");
    *state = next;
}
