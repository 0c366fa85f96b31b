//! Line driver for the terminal client.
//!
//! Implements the [`Driver`] trait over any line source and writer: stdin and
//! stdout in the binary, in-memory buffers in tests.

use std::{collections::VecDeque, io};

use parley_app::{ConversationView, Driver, UserInput};
use parley_client::ConnectionStatus;
use thiserror::Error;
use tokio::io::{AsyncBufRead, Lines};

use crate::{Frame, Screen, parse_line};

/// Line driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Driver reading one command or message per line.
pub struct LineDriver<R, W> {
    lines: Lines<R>,
    out: W,
    pending: VecDeque<UserInput>,
    screen: Screen,
}

impl<R, W> LineDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: io::Write + Send,
{
    /// Create a driver over `lines`, printing to `out`.
    pub fn new(lines: Lines<R>, out: W) -> Self {
        Self { lines, out, pending: VecDeque::new(), screen: Screen::new() }
    }

    /// Queue an intent ahead of anything read from the input.
    pub fn queue(&mut self, input: UserInput) {
        self.pending.push_back(input);
    }

    /// Writer the driver prints to.
    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<R, W> Driver for LineDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: io::Write + Send,
{
    type Error = DriverError;

    async fn next_input(&mut self) -> Result<Option<UserInput>, Self::Error> {
        loop {
            if let Some(input) = self.pending.pop_front() {
                return Ok(Some(input));
            }
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            match parse_line(&line) {
                Ok(inputs) => self.pending.extend(inputs),
                Err(e) => {
                    writeln!(self.out, "{e}")?;
                    self.out.flush()?;
                },
            }
        }
    }

    fn render(
        &mut self,
        view: Option<&ConversationView>,
        status: Option<ConnectionStatus>,
    ) -> Result<(), Self::Error> {
        for line in self.screen.update(Frame::of(view, status)) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "failed to flush output");
        }
    }
}
