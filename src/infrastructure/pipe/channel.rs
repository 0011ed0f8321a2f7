//! Orchestrator side of a worker's control pipe.
//!
//! A reader task decodes frames from the worker's stdout into a bounded
//! `mpsc` queue, and a writer task owns the worker's stdin. Queuing a frame
//! is synchronous, so a cancelled exchange never leaves part of a frame on
//! the pipe. Exchanges are serialized by a per-channel lock: at most one
//! request is in flight at a time.
//!
//! Replies are matched to requests by count. When a caller gives up on an
//! exchange (relay timeout), the reply still arrives later in FIFO order and
//! is dropped by the next exchange instead of being read as its answer.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::frame;
use crate::error::ChannelError;

/// Replies buffered before the reader task waits for the orchestrator.
const INBOUND_CAPACITY: usize = 64;

struct Exchange {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::Receiver<String>,
    /// Requests queued so far.
    sent: u64,
    /// Replies consumed so far, stale ones included.
    answered: u64,
}

impl Exchange {
    fn queue_frame(&mut self, payload: &str) -> Result<(), ChannelError> {
        self.outbound
            .send(frame::encode(payload))
            .map_err(|_| ChannelError::Closed)?;
        self.sent += 1;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<String, ChannelError> {
        self.inbound.recv().await.ok_or(ChannelError::Closed)
    }
}

/// Duplex control channel to one worker process.
pub struct ControlChannel {
    cluster: String,
    exchange: Mutex<Exchange>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ControlChannel {
    /// Wrap the worker's pipe ends. Spawns the frame reader and writer tasks.
    pub fn from_io<R, W>(cluster: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let cluster = cluster.into();
        let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_frames(cluster.clone(), reader, in_tx));
        let writer = tokio::spawn(write_frames(cluster.clone(), writer, out_rx));

        Self {
            cluster,
            exchange: Mutex::new(Exchange {
                outbound: out_tx,
                inbound: in_rx,
                sent: 0,
                answered: 0,
            }),
            reader,
            writer,
        }
    }

    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Wait for the worker's first, unsolicited message.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the worker closes its pipe first.
    pub async fn recv_ready(&self) -> Result<String, ChannelError> {
        let mut exchange = self.exchange.lock().await;
        exchange.next_frame().await
    }

    /// Send `payload` and wait for its reply.
    ///
    /// Cancel-safe: dropping the future after the request is queued leaves
    /// the reply owed, and the next call discards it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the pipe breaks in either direction.
    pub async fn request(&self, payload: &str) -> Result<String, ChannelError> {
        let mut exchange = self.exchange.lock().await;
        exchange.queue_frame(payload)?;

        loop {
            let reply = exchange.next_frame().await?;
            exchange.answered += 1;
            if exchange.answered == exchange.sent {
                return Ok(reply);
            }
            debug!(cluster = %self.cluster, reply = %reply, "Discarding stale reply");
        }
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

async fn read_frames<R>(cluster: String, reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Send + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(frame::decode(&line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!(cluster = %cluster, "Worker closed its pipe");
                break;
            }
            Err(e) => {
                warn!(cluster = %cluster, error = %e, "Pipe read failed");
                break;
            }
        }
    }
}

async fn write_frames<W>(cluster: String, mut writer: W, mut rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Send + Unpin,
{
    while let Some(frame) = rx.recv().await {
        let written = async {
            writer.write_all(frame.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            warn!(cluster = %cluster, error = %e, "Pipe write failed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;

    type WorkerLines = tokio::io::Lines<BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>>;

    /// Channel plus the raw worker-side halves.
    fn channel_pair() -> (
        ControlChannel,
        WorkerLines,
        tokio::io::WriteHalf<tokio::io::DuplexStream>,
    ) {
        channel_pair_with_capacity(4096)
    }

    fn channel_pair_with_capacity(
        capacity: usize,
    ) -> (
        ControlChannel,
        WorkerLines,
        tokio::io::WriteHalf<tokio::io::DuplexStream>,
    ) {
        let (ours, theirs) = duplex(capacity);
        let (our_read, our_write) = split(ours);
        let (their_read, their_write) = split(theirs);
        let channel = ControlChannel::from_io("Arbok", our_read, our_write);
        (channel, BufReader::new(their_read).lines(), their_write)
    }

    #[tokio::test]
    async fn receives_readiness_frame() {
        let (channel, _lines, mut worker) = channel_pair();
        worker.write_all(frame::encode("ready").as_bytes()).await.unwrap();
        assert_eq!(channel.recv_ready().await.unwrap(), "ready");
    }

    #[tokio::test]
    async fn request_round_trips_through_frames() {
        let (channel, mut lines, mut worker) = channel_pair();
        let echo = tokio::spawn(async move {
            let line = lines.next_line().await.unwrap().unwrap();
            assert_eq!(frame::decode(&line), "ping");
            worker.write_all(frame::encode("pong").as_bytes()).await.unwrap();
        });

        assert_eq!(channel.request("ping").await.unwrap(), "pong");
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn closed_pipe_reports_closed() {
        let (channel, lines, worker) = channel_pair();
        drop(lines);
        drop(worker);
        assert_eq!(channel.recv_ready().await, Err(ChannelError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_is_not_taken_for_next_answer() {
        let (channel, mut lines, mut worker) = channel_pair();

        let first = tokio::time::timeout(Duration::from_secs(5), channel.request("first")).await;
        assert!(first.is_err(), "worker has not answered yet");

        // The worker answers both requests in order, the first one late.
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(frame::decode(&line), "first");
        worker
            .write_all(frame::encode("reply to first").as_bytes())
            .await
            .unwrap();

        let responder = tokio::spawn(async move {
            let line = lines.next_line().await.unwrap().unwrap();
            assert_eq!(frame::decode(&line), "second");
            worker
                .write_all(frame::encode("reply to second").as_bytes())
                .await
                .unwrap();
        });

        assert_eq!(channel.request("second").await.unwrap(), "reply to second");
        responder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_never_splits_a_frame() {
        // The pipe holds less than one frame until the worker reads.
        let (channel, mut lines, mut worker) = channel_pair_with_capacity(16);
        let big = "x".repeat(200);

        let first = tokio::time::timeout(Duration::from_secs(5), channel.request(&big)).await;
        assert!(first.is_err(), "the worker is not draining its stdin");

        let second = tokio::spawn(async move {
            let reply = channel.request("second").await;
            (channel, reply)
        });

        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(frame::decode(&line), big);
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(frame::decode(&line), "second");

        worker.write_all(frame::encode("stale").as_bytes()).await.unwrap();
        worker.write_all(frame::encode("fresh").as_bytes()).await.unwrap();
        let (_channel, reply) = second.await.unwrap();
        assert_eq!(reply.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn request_on_dead_worker_is_closed() {
        let (channel, lines, worker) = channel_pair();
        drop(lines);
        drop(worker);
        assert_eq!(channel.request("ping").await, Err(ChannelError::Closed));
    }
}
