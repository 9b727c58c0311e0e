use crate::error::{Result, WalletError};
use crate::interfaces::webhook::IncomingWebhook;
use std::io::{BufRead, BufReader, Read};

/// Reads provider webhook events from a JSON-lines source.
///
/// Wraps any `Read` source and yields one `IncomingWebhook` per non-empty
/// line, lazily, so large replay files never sit in memory whole.
pub struct EventReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<IncomingWebhook>> {
        self.reader
            .lines()
            .map(|line| line.map_err(WalletError::from))
            .filter(|line| match line {
                Ok(line) => !line.trim().is_empty(),
                Err(_) => true,
            })
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(WalletError::from)
            })
    }
}
