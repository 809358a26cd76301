//! WebSocket stream of pipeline change notifications.

mod handler;

pub use handler::ws_handler;
