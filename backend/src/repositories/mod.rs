pub mod live_stream;
pub mod memory;
pub mod user;

pub use live_stream::{LiveStreamRepository, PgLiveStreamRepository};
pub use memory::{InMemoryLiveStreamRepository, InMemoryUserRepository};
pub use user::{PgUserRepository, UserRepository};
