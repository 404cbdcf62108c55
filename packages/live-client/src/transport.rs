//! Socket transport seam
//!
//! The connection manager only needs "open a URL, get a text sink and a text
//! stream back". [`WsTransport`] provides that over `tokio-tungstenite`;
//! tests plug in in-memory transports.

use std::pin::Pin;

use futures_util::future::{self, BoxFuture};
use futures_util::{FutureExt, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::debug;
use url::Url;

use crate::error::{LiveError, LiveResult};

/// Outgoing half of an open socket, accepting JSON text frames
pub type FrameSink = Pin<Box<dyn Sink<String, Error = LiveError> + Send>>;

/// Incoming half of an open socket
///
/// Yields text frames in delivery order. An `Err` item is the socket's error
/// event; the stream ending is its close event.
pub type FrameStream = Pin<Box<dyn Stream<Item = LiveResult<String>> + Send>>;

/// Opens sockets for the connection manager
pub trait Transport: Send + Sync + 'static {
    /// Open a socket to `url`; resolves once the socket is open
    fn connect(&self, url: Url) -> BoxFuture<'static, LiveResult<(FrameSink, FrameStream)>>;
}

/// Production transport over `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn connect(&self, url: Url) -> BoxFuture<'static, LiveResult<(FrameSink, FrameStream)>> {
        async move {
            let (ws_stream, response) = connect_async(url.as_str()).await?;
            debug!(status = %response.status(), "WebSocket handshake complete");

            let (ws_sink, ws_source) = ws_stream.split();

            let sink: FrameSink = Box::pin(
                ws_sink
                    .sink_map_err(LiveError::from)
                    .with(|text: String| future::ready(Ok::<_, LiveError>(Message::Text(text.into())))),
            );

            let stream: FrameStream = Box::pin(
                ws_source
                    .scan(false, |failed, item| {
                        // The first error ends the stream: error event, then close event.
                        if *failed {
                            return future::ready(None);
                        }
                        if item.is_err() {
                            *failed = true;
                        }
                        future::ready(Some(item))
                    })
                    .filter_map(|item| future::ready(text_frame(item))),
            );

            Ok((sink, stream))
        }
        .boxed()
    }
}

/// Keep text frames and errors; control and binary frames are not part of the protocol
fn text_frame(
    item: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<LiveResult<String>> {
    match item {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Binary(data)) => {
            debug!(bytes = data.len(), "Ignoring binary frame");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(LiveError::from(e))),
    }
}
