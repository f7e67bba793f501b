use axum::extract::ws::Message;
use tokio::sync::mpsc::UnboundedSender;

use crate::filter::SessionFilter;

/// One connected client: its outbound channel plus the session filter it is
/// currently scoped to. Every connection starts with the inactive default
/// filter and may replace it with a SUB message.
pub struct Subscriber {
    pub sender: UnboundedSender<Message>,
    pub filter: SessionFilter,
}
