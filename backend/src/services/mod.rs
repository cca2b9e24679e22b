pub mod gateway;
pub mod live_stream;
pub mod mux;
pub mod webhook;

pub use gateway::{GatewayError, LiveStreamGateway, PlaybackPolicy, RemoteLiveStream};
pub use live_stream::{authorize_owner, LiveStreamError, LiveStreamService, StreamUrls};
pub use mux::MuxClient;
