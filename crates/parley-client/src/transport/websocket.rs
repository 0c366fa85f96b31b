//! WebSocket transport.
//!
//! One text frame per envelope, in both directions.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message as WsMessage};
use url::Url;

use super::{TransportError, deliver};
use crate::{ClientConfig, ConfigError, Connection, OutboundQueue};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live-channel URL: `{base}/chat/ws` with the scheme switched to ws/wss.
pub(super) fn socket_url(config: &ClientConfig) -> Result<Url, ConfigError> {
    let mut url = config.url_for(&["chat", "ws"])?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme).map_err(|()| ConfigError::UnsupportedScheme(scheme.to_string()))?;
    Ok(url)
}

pub(super) async fn connect(config: &ClientConfig) -> Result<WsStream, TransportError> {
    let url = socket_url(config)?;
    tracing::debug!(%url, "opening websocket");
    let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::Handshake(e.to_string()))?;
    Ok(stream)
}

/// Pump envelopes until the socket fails or the outbound queue closes.
///
/// An envelope taken from the queue when the write fails is lost; delivery
/// tracking in the view layer detects that.
pub(super) async fn serve(
    stream: WsStream,
    connection: &Connection,
    outbound: &mut OutboundQueue,
) -> Result<(), TransportError> {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            envelope = outbound.recv() => {
                let Some(envelope) = envelope else {
                    let _ = sink.close().await;
                    return Ok(());
                };
                let text = envelope.encode()?;
                sink.send(WsMessage::Text(text.into()))
                    .await
                    .map_err(|e| TransportError::Stream(e.to_string()))?;
            },
            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => deliver(connection, text.as_str()),
                Some(Ok(WsMessage::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => {},
                Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_switches_scheme() {
        let origin = ClientConfig::parse_url("http://localhost:3000").unwrap();
        let config = ClientConfig::new(origin);
        assert_eq!(socket_url(&config).unwrap().as_str(), "ws://localhost:3000/chat/ws");

        let endpoint = ClientConfig::parse_url("https://api.example.com/v1/").unwrap();
        let config = config.with_endpoint(Some(endpoint));
        assert_eq!(socket_url(&config).unwrap().as_str(), "wss://api.example.com/v1/chat/ws");
    }
}
