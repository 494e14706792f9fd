//! Real-time event stream: outgoing subscription commands, incoming events
//! and the connection that carries both.

pub mod command;
pub mod event;
pub mod session;

pub use command::{
    CommandKind, SubscribeFeed, SubscribeWallet, UnsubscribeFeed, UnsubscribeWallet, WsCommand,
};
pub use event::{WsEvent, WsEventError};
pub use session::{
    ClosePolicy, FrameSink, FrameStream, SessionHooks, SessionState, WsConfig, WsError, WsSession,
};
