//! Worker side of the control pipe.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use super::frame;
use crate::error::Result;

/// The worker's endpoint: frames in on stdin, frames out on stdout.
pub struct WorkerEndpoint {
    lines: Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl WorkerEndpoint {
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: BufReader::new(reader).lines(),
            writer: Box::new(writer),
        }
    }

    /// Endpoint over this process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::from_io(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Next inbound payload, or `None` once the orchestrator closes the pipe.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the pipe fails.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|line| frame::decode(&line)))
    }

    /// Send one payload.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the pipe fails.
    pub async fn send(&mut self, payload: &str) -> Result<()> {
        self.writer.write_all(frame::encode(payload).as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{duplex, split};

    use super::*;
    use crate::infrastructure::pipe::ControlChannel;

    #[tokio::test]
    async fn endpoint_talks_to_control_channel() {
        let (ours, theirs) = duplex(1024);
        let (read, write) = split(ours);
        let channel = ControlChannel::from_io("Bulbasaur", read, write);
        let (read, write) = split(theirs);
        let mut endpoint = WorkerEndpoint::from_io(read, write);

        endpoint.send("ready").await.unwrap();
        assert_eq!(channel.recv_ready().await.unwrap(), "ready");

        let worker = tokio::spawn(async move {
            let request = endpoint.recv().await.unwrap();
            assert_eq!(request.as_deref(), Some("ping"));
            endpoint.send("multi\nline").await.unwrap();
            endpoint
        });
        assert_eq!(channel.request("ping").await.unwrap(), "multi\nline");

        let mut endpoint = worker.await.unwrap();
        drop(channel);
        assert_eq!(endpoint.recv().await.unwrap(), None);
    }
}
