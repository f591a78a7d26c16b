pub mod client;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod protocol;
pub mod router;
pub mod session;
pub mod transport;
