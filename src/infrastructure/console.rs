//! Interactive operator input on stdin.
//!
//! Reads happen on a dedicated thread, one line per request, so a pending
//! read never holds up the runtime or its shutdown. The prompt is printed
//! right before each read.

use std::io::{self, BufRead, Write};
use std::sync::mpsc as std_mpsc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::port::LineSource;

pub struct StdinLines {
    requests: std_mpsc::Sender<()>,
    lines: mpsc::UnboundedReceiver<io::Result<Option<String>>>,
}

impl StdinLines {
    /// Start the reader thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        let (requests, pending) = std_mpsc::channel::<()>();
        let (tx, lines) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name("operator-stdin".into())
            .spawn(move || {
                let stdin = io::stdin();
                while pending.recv().is_ok() {
                    let line = read_one(&stdin, &prompt);
                    let done = !matches!(line, Ok(Some(_)));
                    if tx.send(line).is_err() || done {
                        break;
                    }
                }
            })?;

        Ok(Self { requests, lines })
    }
}

fn read_one(stdin: &io::Stdin, prompt: &str) -> io::Result<Option<String>> {
    let mut out = io::stdout().lock();
    out.write_all(prompt.as_bytes())?;
    out.flush()?;
    drop(out);

    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> Result<Option<String>> {
        if self.requests.send(()).is_err() {
            return Ok(None);
        }
        match self.lines.recv().await {
            Some(line) => line.map_err(Error::from),
            None => Ok(None),
        }
    }
}
