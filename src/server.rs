use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use axum_extra::TypedHeader;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::{ops::ControlFlow, sync::Arc};
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use axum::extract::connect_info::ConnectInfo;

use futures::{stream::StreamExt, SinkExt};

use crate::{
    error::FeedError,
    filter::SessionFilter,
    message::{Ack, ClientMessage, ServerMessage},
    record::AttendanceRecord,
    store::RecordStore,
    subscriber::Subscriber,
};

#[derive(Clone)]
struct RelayState {
    // one subscriber per connection, keyed by the client's address
    subscribers: Arc<RwLock<HashMap<String, Subscriber>>>,
    store: Arc<RecordStore>,
}

pub async fn serve(listener: tokio::net::TcpListener, store: RecordStore) -> Result<(), FeedError> {
    let state = RelayState {
        subscribers: Arc::new(RwLock::new(HashMap::new())),
        store: Arc::new(store),
    };

    let app = Router::new()
        .route("/", get(ws_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state);

    tracing::info!("attendance relay listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    let user_agent = if let Some(TypedHeader(user_agent)) = user_agent {
        user_agent.to_string()
    } else {
        String::from("Unknown browser")
    };
    tracing::debug!("`{user_agent}` at {addr} connected");

    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

async fn handle_socket(socket: WebSocket, state: RelayState, who: SocketAddr) {
    let (mut sock_tx, mut sock_rx) = socket.split();
    // the writer half has a single owner, so every outbound frame goes
    // through this channel
    let (message_tx, mut message_rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    // every connection receives broadcasts from the handshake on, scoped by
    // the inactive default filter until a SUB narrows it
    state.subscribers.write().await.insert(
        who.to_string(),
        Subscriber {
            sender: message_tx.clone(),
            filter: SessionFilter::new(),
        },
    );

    let writer = tokio::spawn(async move {
        while let Some(msg) = message_rx.recv().await {
            if sock_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = sock_rx.next().await {
        let Ok(msg) = frame else {
            tracing::debug!("client {who} abruptly disconnected");
            break;
        };
        if process_message(msg, &state, who, &message_tx).await.is_break() {
            break;
        }
    }

    state.subscribers.write().await.remove(&who.to_string());
    drop(message_tx);
    let _ = writer.await;
}

async fn process_message(
    msg: Message,
    state: &RelayState,
    who: SocketAddr,
    message_sender: &UnboundedSender<Message>,
) -> ControlFlow<(), ()> {
    match msg {
        Message::Text(text) => {
            if let Err(e) = process_feed_message(&text, state, who, message_sender).await {
                tracing::warn!("{who} sent a message we could not handle: {e}");
                if let Ok(frame) = encode(&ServerMessage::Notice(e.to_string())) {
                    let _ = message_sender.send(frame);
                }
            }
            ControlFlow::Continue(())
        }
        Message::Close(_) => ControlFlow::Break(()),
        _ => ControlFlow::Continue(()),
    }
}

async fn process_feed_message(
    message: &str,
    state: &RelayState,
    who: SocketAddr,
    message_sender: &UnboundedSender<Message>,
) -> Result<(), FeedError> {
    let message: ClientMessage =
        serde_json::from_str(message).map_err(|e| FeedError::InvalidMessage(e.to_string()))?;

    match message {
        ClientMessage::Sub(filter) => process_sub(filter, state, who, message_sender).await,
        ClientMessage::Submit(record) => process_submit(record, state, message_sender).await,
    }
}

async fn process_sub(
    filter: SessionFilter,
    state: &RelayState,
    who: SocketAddr,
    message_sender: &UnboundedSender<Message>,
) -> Result<(), FeedError> {
    // the write lock spans the backfill query and the filter swap; submits
    // hold the read lock across persist + broadcast, so a live record is
    // either on file before the query or broadcast through the new filter,
    // never caught half-way between the two
    let mut subscribers = state.subscribers.write().await;

    // backfill: records already on file that the new filter accepts are
    // delivered before any live ones
    for record in state.store.query(&filter)? {
        let _ = message_sender.send(encode(&ServerMessage::Attendance(record))?);
    }

    subscribers.insert(
        who.to_string(),
        Subscriber {
            sender: message_sender.clone(),
            filter,
        },
    );
    Ok(())
}

async fn process_submit(
    record: AttendanceRecord,
    state: &RelayState,
    message_sender: &UnboundedSender<Message>,
) -> Result<(), FeedError> {
    let record_id = record.id();

    // held across persist + broadcast; see process_sub
    let subscribers = state.subscribers.read().await;

    if let Err(e) = state.store.append(&record) {
        tracing::error!("failed to store record {record_id}: {e}");
        let _ = message_sender.send(encode(&ServerMessage::Ok(Ack {
            record_id,
            accepted: false,
            message: e.to_string(),
        }))?);
        return Ok(());
    }

    let _ = message_sender.send(encode(&ServerMessage::Ok(Ack {
        record_id,
        accepted: true,
        message: String::new(),
    }))?);

    for subscriber in subscribers.values() {
        if subscriber.filter.accepts(&record) {
            let _ = subscriber
                .sender
                .send(encode(&ServerMessage::Attendance(record.clone()))?);
        }
    }
    Ok(())
}

fn encode(message: &ServerMessage) -> Result<Message, FeedError> {
    let raw =
        serde_json::to_string(message).map_err(|e| FeedError::InvalidMessage(e.to_string()))?;
    Ok(Message::Text(raw))
}
