//! Database entities

pub mod channel;
pub mod user;

pub use channel::{ChannelProfile, WatchedVideo};
pub use user::{AccountUpdate, NewUser, User};
