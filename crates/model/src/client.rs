//! The model-facing duplex stream client consumed by the Model Stream
//! Worker (C5). Grounded on the teacher's `llm::backend::LlmBackend` trait
//! shape (a config struct plus a `connect` constructor), genericized away
//! from any vendor-specific backend: this client only knows about a plain
//! websocket endpoint.

use crate::codec::{InboundEvent, OutboundEvent, decode_inbound};
use crate::error::ModelError;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

#[derive(Debug, Clone)]
pub struct ModelStreamConfig {
    pub endpoint: String,
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// One bidirectional connection to the model, for the lifetime of a
/// session. Connecting is the only fallible operation; once connected, the
/// halves never individually fail to construct.
pub struct ModelStreamClient {
    inner: WsStream,
}

impl ModelStreamClient {
    pub async fn connect(config: &ModelStreamConfig) -> Result<Self, ModelError> {
        let (inner, _response) = connect_async(&config.endpoint)
            .await
            .map_err(|e| ModelError::ConnectFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn split(self) -> (ModelStreamSender, ModelStreamReceiver) {
        let (sink, stream) = self.inner.split();
        (ModelStreamSender { sink }, ModelStreamReceiver { stream })
    }
}

/// The outbound half — owned by the worker's drain task.
pub struct ModelStreamSender {
    sink: futures::stream::SplitSink<WsStream, Message>,
}

impl ModelStreamSender {
    pub async fn send(&mut self, event: &OutboundEvent) -> Result<(), ModelError> {
        self.sink
            .send(Message::Binary(event.encode()))
            .await
            .map_err(ModelError::from_ws_error)
    }

    pub async fn close(&mut self) -> Result<(), ModelError> {
        self.sink.close().await.map_err(ModelError::from_ws_error)
    }
}

/// The inbound half — owned by the worker's pump task.
pub struct ModelStreamReceiver {
    stream: futures::stream::SplitStream<WsStream>,
}

impl ModelStreamReceiver {
    /// Returns `None` when the stream has ended cleanly. A read failure is
    /// classified into `ModelError::Reset` vs `ModelError::Other` by the
    /// caller via `ModelError::from_ws_error`.
    pub async fn recv(&mut self) -> Option<Result<InboundEvent, ModelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Binary(bytes)) => return Some(Ok(decode_inbound(&bytes))),
                Ok(Message::Text(text)) => return Some(Ok(decode_inbound(text.as_bytes()))),
                Ok(Message::Close(_)) => return None,
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Err(e) => return Some(Err(ModelError::from_ws_error(e))),
            }
        }
    }
}
