//! HTTP Handlers

mod cache;
mod cost;
mod generate;
mod ping;
mod playback;
mod session;
mod websocket;

pub use cache::*;
pub use cost::*;
pub use generate::*;
pub use ping::*;
pub use playback::*;
pub use session::*;
pub use websocket::*;
