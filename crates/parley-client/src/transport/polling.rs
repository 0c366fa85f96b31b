//! HTTP long-polling transport.
//!
//! Outbound envelopes are posted to `{base}/chat/emit`. Inbound envelopes are
//! fetched from `{base}/chat/poll?cursor=N`; the server holds the request
//! until events are available or its timeout passes, and answers with the
//! cursor to use next.

use parley_proto::{Envelope, PollBatch};

use super::{Backoff, TransportError};
use crate::{ClientConfig, Connection, ConnectionStatus, OutboundQueue, TransportKind};

pub(super) async fn serve(
    http: &reqwest::Client,
    config: &ClientConfig,
    connection: &Connection,
    outbound: &mut OutboundQueue,
    cursor: &mut u64,
    backoff: &mut Backoff,
) -> Result<(), TransportError> {
    let emit_url = config.url_for(&["chat", "emit"])?;
    let poll_url = config.url_for(&["chat", "poll"])?;
    let hold = config.poll_timeout.as_secs().to_string();

    loop {
        let poll = http
            .get(poll_url.clone())
            .query(&[("cursor", cursor.to_string()), ("timeout", hold.clone())])
            .timeout(config.poll_timeout * 2)
            .send();

        tokio::select! {
            envelope = outbound.recv() => {
                let Some(envelope) = envelope else { return Ok(()) };
                http.post(emit_url.clone())
                    .json(&envelope.to_raw()?)
                    .send()
                    .await?
                    .error_for_status()?;
            },
            // Dropping an in-flight poll is safe: the cursor only advances
            // after a batch has been read.
            response = poll => {
                let batch: PollBatch = response?.error_for_status()?.json().await?;
                backoff.reset();
                connection.set_status(ConnectionStatus::Connected(TransportKind::Polling));
                *cursor = batch.cursor;
                for raw in batch.events {
                    match Envelope::from_raw(raw) {
                        Ok(envelope) => connection.dispatch(envelope),
                        Err(e) => tracing::warn!(error = %e, "dropping undecodable event"),
                    }
                }
            },
        }
    }
}
