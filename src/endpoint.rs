//! Connection endpoint driving one [`ConfigHandler`].
//!
//! [`ConfigEndpoint::spawn`] takes an established connection and spawns a
//! task that exclusively owns the handler. Callers talk to the task through a
//! command channel:
//!
//! ```text
//! send() ─► mpsc::Sender<Command> ─► connection task ─► encode ─► writer task ─► socket
//!   ▲                                     │
//!   └──── oneshot responder ◄── decode ◄──┘ read
//! ```
//!
//! Writes run on their own task so a peer that is slow to read never stops
//! the connection task from reading.
//!
//! Responders complete in the order requests were sent, so pipelined callers
//! each get their own reply. A bucket streaming request completes as soon as
//! its header arrives, with the live [`ConfigStream`](crate::handler::ConfigStream).
//!
//! # Example
//!
//! ```ignore
//! use configwire_client::{ConfigEndpoint, ConfigRequest, ConfigResponse, HandlerConfig};
//!
//! let socket = tokio::net::TcpStream::connect("10.0.0.1:8091").await?;
//! let endpoint = ConfigEndpoint::spawn(socket, "10.0.0.1:8091", HandlerConfig::default());
//!
//! if let ConfigResponse::BucketStreaming(response) =
//!     endpoint.send(ConfigRequest::bucket_streaming("default", "")).await?
//! {
//!     let mut configs = response.stream.subscribe();
//!     while let Some(config) = configs.next().await {
//!         println!("{}", config);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::HandlerConfig;
use crate::error::{ConfigError, Result};
use crate::handler::ConfigHandler;
use crate::message::{ConfigRequest, ConfigResponse};
use crate::protocol::ResponseFrameBuffer;

type Responder = oneshot::Sender<Result<ConfigResponse>>;

/// Maximum queued requests coalesced into a single write.
const MAX_BATCH_SIZE: usize = 64;

enum Command {
    Send {
        request: ConfigRequest,
        responder: Responder,
    },
    Shutdown,
}

/// Handle to a running connection task.
pub struct ConfigEndpoint {
    commands: mpsc::Sender<Command>,
    remote_host: String,
    task: JoinHandle<()>,
}

impl ConfigEndpoint {
    /// Spawn the connection task for `io`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(io: S, remote_host: impl Into<String>, config: HandlerConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let remote_host = remote_host.into();
        let (commands, rx) = mpsc::channel(config.command_capacity.max(1));

        let connection = Connection {
            frames: ResponseFrameBuffer::with_max_header_size(config.max_header_size),
            read_buffer_size: config.read_buffer_size.max(1),
            write_capacity: config.command_capacity.max(1),
            handler: ConfigHandler::with_config(remote_host.clone(), config),
            responders: VecDeque::new(),
        };

        let host = remote_host.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = connection.run(io, rx).await {
                tracing::error!("Config connection to {} failed: {}", host, e);
            }
        });

        Self {
            commands,
            remote_host,
            task,
        }
    }

    /// Send a request and wait for its typed response.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConnectionClosed`] if the connection ends before
    /// the response is produced.
    pub async fn send(&self, request: ConfigRequest) -> Result<ConfigResponse> {
        let (responder, response) = oneshot::channel();
        self.commands
            .send(Command::Send { request, responder })
            .await
            .map_err(|_| ConfigError::ConnectionClosed)?;

        response.await.map_err(|_| ConfigError::ConnectionClosed)?
    }

    /// Close the connection and wait for the task to finish.
    ///
    /// Any open config stream is completed and requests still waiting fail
    /// with [`ConfigError::ConnectionClosed`].
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::error!("Config connection task for {} panicked: {}", self.remote_host, e);
        }
    }

    /// Check if the connection task has ended.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Remote host the connection serves.
    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }
}

/// State owned by the connection task.
struct Connection {
    handler: ConfigHandler,
    frames: ResponseFrameBuffer,
    responders: VecDeque<Responder>,
    read_buffer_size: usize,
    write_capacity: usize,
}

impl Connection {
    async fn run<S>(mut self, io: S, mut commands: mpsc::Receiver<Command>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (mut reader, writer) = tokio::io::split(io);
        let writes = spawn_writer_task(writer, self.write_capacity);
        let mut buf = vec![0u8; self.read_buffer_size];

        let result = loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send { request, responder }) => {
                        let wire = self.handler.encode(request).encode();
                        self.responders.push_back(responder);

                        if writes.send(wire).await.is_err() {
                            break Err(ConfigError::ConnectionClosed);
                        }
                    }
                    Some(Command::Shutdown) | None => break Ok(()),
                },
                read = reader.read(&mut buf) => {
                    let n = match read {
                        Ok(0) => break Ok(()), // Connection closed
                        Ok(n) => n,
                        Err(e) => break Err(ConfigError::Io(e)),
                    };

                    if let Err(e) = self.dispatch(&buf[..n]) {
                        break Err(e);
                    }
                }
                _ = writes.closed() => break Err(ConfigError::ConnectionClosed),
            }
        };

        self.close();
        result
    }

    /// Decode received bytes and complete responders with any responses.
    fn dispatch(&mut self, data: &[u8]) -> Result<()> {
        for frame in self.frames.push(data)? {
            let Some(response) = self.handler.decode(frame)? else {
                continue;
            };

            let responder = self.responders.pop_front().ok_or_else(|| {
                ConfigError::Protocol("Response produced with no waiting caller".to_string())
            })?;
            if responder.send(Ok(response)).is_err() {
                tracing::debug!("Caller stopped waiting for config response");
            }
        }
        Ok(())
    }

    fn close(self) {
        let Connection {
            handler,
            responders,
            ..
        } = self;

        // Completes any open stream before waiting callers are released.
        drop(handler);

        for responder in responders {
            let _ = responder.send(Err(ConfigError::ConnectionClosed));
        }
    }
}

/// Spawn the task that owns the write half and drains queued requests.
///
/// Requests already queued are coalesced into one write. The task ends when
/// the sender is dropped or a write fails; a failure closes the channel.
fn spawn_writer_task<W>(mut writer: W, capacity: usize) -> mpsc::Sender<Bytes>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Bytes>(capacity);

    tokio::spawn(async move {
        let mut batch = BytesMut::with_capacity(4096);
        while let Some(wire) = rx.recv().await {
            batch.clear();
            batch.extend_from_slice(&wire);
            for _ in 1..MAX_BATCH_SIZE {
                match rx.try_recv() {
                    Ok(more) => batch.extend_from_slice(&more),
                    Err(_) => break,
                }
            }

            if let Err(e) = writer.write_all(&batch).await {
                tracing::error!("Config request write failed: {}", e);
                return;
            }
        }
    });

    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RequestKind;
    use crate::protocol::ResponseStatus;
    use tokio::io::DuplexStream;

    async fn read_request(server: &mut DuplexStream) -> String {
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        while !received.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = server.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending a full request");
            received.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(received).unwrap()
    }

    #[tokio::test]
    async fn test_send_bucket_config() {
        let (client, mut server) = tokio::io::duplex(4096);
        let endpoint = ConfigEndpoint::spawn(client, "node1:8091", HandlerConfig::default());

        let server_task = tokio::spawn(async move {
            let request = read_request(&mut server).await;
            server
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\n{\"rev\":1}")
                .await
                .unwrap();
            (request, server)
        });

        let response = endpoint
            .send(ConfigRequest::bucket_config("default", ""))
            .await
            .unwrap();
        assert_eq!(response.kind(), RequestKind::BucketConfig);
        assert_eq!(response.status(), ResponseStatus::Success);
        assert_eq!(response.body(), Some("{\"rev\":1}"));

        let (request, _server) = server_task.await.unwrap();
        assert!(request.starts_with("GET /pools/default/buckets/default HTTP/1.1\r\n"));
        assert!(request.contains("Host: node1:8091\r\n"));
    }

    #[tokio::test]
    async fn test_connection_closed_fails_pending() {
        let (client, mut server) = tokio::io::duplex(4096);
        let endpoint = ConfigEndpoint::spawn(client, "node1", HandlerConfig::default());

        tokio::spawn(async move {
            read_request(&mut server).await;
            drop(server);
        });

        let result = endpoint.send(ConfigRequest::flush("default", "")).await;
        assert!(matches!(result, Err(ConfigError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_streaming_over_connection() {
        let (client, mut server) = tokio::io::duplex(4096);
        let endpoint = ConfigEndpoint::spawn(client, "node1", HandlerConfig::default());
        let (go_tx, go_rx) = oneshot::channel::<()>();

        let server_task = tokio::spawn(async move {
            read_request(&mut server).await;
            server
                .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await
                .unwrap();
            go_rx.await.unwrap();
            server
                .write_all(b"8\r\ndoc1\n\n\n\n\r\n8\r\ndoc2\n\n\n\n\r\n0\r\n\r\n")
                .await
                .unwrap();
            server
        });

        let response = endpoint
            .send(ConfigRequest::bucket_streaming("default", ""))
            .await
            .unwrap();
        let ConfigResponse::BucketStreaming(response) = response else {
            panic!("expected streaming response");
        };
        assert_eq!(response.host, "node1");

        let mut sub = response.stream.subscribe();
        go_tx.send(()).unwrap();

        assert_eq!(sub.next().await.as_deref(), Some("doc1"));
        assert_eq!(sub.next().await.as_deref(), Some("doc2"));
        assert_eq!(sub.next().await, None);

        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_completes_stream() {
        let (client, mut server) = tokio::io::duplex(4096);
        let endpoint = ConfigEndpoint::spawn(client, "node1", HandlerConfig::default());

        let server_task = tokio::spawn(async move {
            read_request(&mut server).await;
            server
                .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await
                .unwrap();
            server
        });

        let Ok(ConfigResponse::BucketStreaming(response)) = endpoint
            .send(ConfigRequest::bucket_streaming("default", ""))
            .await
        else {
            panic!("expected streaming response");
        };
        let mut sub = response.stream.subscribe();

        endpoint.shutdown().await;

        assert!(!response.stream.is_active());
        assert_eq!(sub.next().await, None);
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_document_in_same_write_as_header() {
        let (client, mut server) = tokio::io::duplex(4096);
        let endpoint = ConfigEndpoint::spawn(client, "node1", HandlerConfig::default());

        let server_task = tokio::spawn(async move {
            read_request(&mut server).await;
            server
                .write_all(
                    b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                      8\r\ndoc1\n\n\n\n\r\n",
                )
                .await
                .unwrap();
            server
        });

        let Ok(ConfigResponse::BucketStreaming(response)) = endpoint
            .send(ConfigRequest::bucket_streaming("default", ""))
            .await
        else {
            panic!("expected streaming response");
        };
        let _server = server_task.await.unwrap();

        let mut sub = response.stream.subscribe();
        endpoint.shutdown().await;

        assert_eq!(sub.next().await.as_deref(), Some("doc1"));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_reads_continue_while_peer_not_reading() {
        // A tiny pipe the peer never drains, so the request write cannot finish.
        let (client, mut server) = tokio::io::duplex(16);
        let endpoint = ConfigEndpoint::spawn(client, "node1", HandlerConfig::default());

        let pending = tokio::spawn(async move {
            endpoint
                .send(ConfigRequest::bucket_config("default", ""))
                .await
        });

        // Once the request has started arriving, stop reading it.
        let mut start = [0u8; 4];
        server.read_exact(&mut start).await.unwrap();
        assert_eq!(&start, b"GET ");

        // The reply is read even though the request is still being written.
        server
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}")
            .await
            .unwrap();

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.body(), Some("{}"));
    }
}
