use std::collections::HashSet;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::{
    error::FeedError,
    filter::SessionFilter,
    message::{ClientMessage, ServerMessage},
    record::AttendanceRecord,
};

/// Takes one rendered line per accepted record.
pub trait RenderSink {
    fn append(&mut self, line: String);
}

impl RenderSink for Vec<String> {
    fn append(&mut self, line: String) {
        self.push(line);
    }
}

/// One method per transport event, invoked serially from the single dispatch
/// task. Handlers must not block.
pub trait FeedHandler {
    fn on_connect(&mut self) {}
    fn on_disconnect(&mut self) {}
    fn on_connect_error(&mut self, _err: &FeedError) {}
    fn on_attendance(&mut self, record: &AttendanceRecord);
}

/// Renders accepted records onto an optional sink. Records are dropped
/// without error when no sink is attached.
///
/// Each record is rendered at most once, keyed by its content id: a record
/// can reach the handler twice when the relay backfills it after a
/// re-subscribe, or when a live broadcast overlaps a backfill.
pub struct BoardHandler {
    filter: SessionFilter,
    sink: Option<Box<dyn RenderSink + Send>>,
    seen: HashSet<String>,
}

impl BoardHandler {
    pub fn new(filter: SessionFilter, sink: Option<Box<dyn RenderSink + Send>>) -> Self {
        Self {
            filter,
            sink,
            seen: HashSet::new(),
        }
    }
}

impl FeedHandler for BoardHandler {
    fn on_connect(&mut self) {
        tracing::info!("attendance feed connected");
    }

    fn on_disconnect(&mut self) {
        tracing::info!("attendance feed disconnected");
    }

    fn on_connect_error(&mut self, err: &FeedError) {
        tracing::error!("attendance feed connection error: {err}");
    }

    fn on_attendance(&mut self, record: &AttendanceRecord) {
        if !self.filter.accepts(record) {
            return;
        }
        if !self.seen.insert(record.id()) {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        sink.append(record.board_line());
    }
}

/// Retry schedule for the transport. The defaults match the stock browser
/// client: five attempts, a second apart.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1000),
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct FeedClient {
    url: Url,
    filter: SessionFilter,
    reconnect: ReconnectPolicy,
}

impl FeedClient {
    pub fn new(url: Url, filter: SessionFilter) -> Self {
        Self {
            url,
            filter,
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Connect, subscribe and dispatch until the server closes the
    /// connection or the retry budget runs out. The attempt counter resets
    /// once a connection is established; when the budget runs out the last
    /// transport error is returned.
    pub async fn run(&self, handler: &mut dyn FeedHandler) -> Result<(), FeedError> {
        let mut attempts = 0u32;
        loop {
            let stream = match connect_async(self.url.clone()).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    let err = FeedError::from(e);
                    handler.on_connect_error(&err);
                    attempts += 1;
                    if attempts > self.reconnect.max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(self.reconnect.delay).await;
                    continue;
                }
            };

            attempts = 0;
            handler.on_connect();

            match self.dispatch(stream, handler).await {
                Ok(()) => {
                    handler.on_disconnect();
                    return Ok(());
                }
                Err(err) => {
                    handler.on_disconnect();
                    attempts += 1;
                    if attempts > self.reconnect.max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(self.reconnect.delay).await;
                }
            }
        }
    }

    async fn dispatch(
        &self,
        stream: WsStream,
        handler: &mut dyn FeedHandler,
    ) -> Result<(), FeedError> {
        let (mut write, mut read) = stream.split();

        let sub = serde_json::to_string(&ClientMessage::Sub(self.filter.clone()))
            .map_err(|e| FeedError::InvalidMessage(e.to_string()))?;
        write.send(Message::Text(sub)).await?;

        while let Some(frame) = read.next().await {
            match frame? {
                Message::Text(text) => dispatch_frame(&text, handler),
                Message::Close(_) => return Ok(()),
                _ => {}
            }
        }
        Ok(())
    }
}

fn dispatch_frame(text: &str, handler: &mut dyn FeedHandler) {
    let message: ServerMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("ignoring malformed frame from relay: {e}");
            return;
        }
    };
    match message {
        ServerMessage::Attendance(record) => handler.on_attendance(&record),
        ServerMessage::Ok(ack) => {
            tracing::debug!("record {} acked: {}", ack.record_id, ack.accepted);
        }
        ServerMessage::Notice(notice) => tracing::warn!("relay notice: {notice}"),
    }
}
