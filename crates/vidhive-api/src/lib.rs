pub mod account;
pub mod channel;
pub mod comments;
pub mod error;
pub mod middleware;
pub mod shape;
pub mod state;
pub mod tags;
pub mod upload;
pub mod videos;
