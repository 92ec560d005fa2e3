//! Database repository implementations

pub mod channel_repository;
pub mod user_repository;

pub use channel_repository::ChannelRepository;
pub use user_repository::UserRepository;
