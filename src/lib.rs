pub mod client;
pub mod error;
pub mod filter;
pub mod message;
pub mod record;
pub mod server;
pub mod store;
pub mod subscriber;

pub use client::{BoardHandler, FeedClient, FeedHandler, ReconnectPolicy, RenderSink};
pub use error::FeedError;
pub use filter::SessionFilter;
pub use message::{Ack, ClientMessage, ServerMessage};
pub use record::AttendanceRecord;
pub use store::RecordStore;
