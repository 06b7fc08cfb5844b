//! Utilities shared by the Agora server and client.

pub mod logger;
pub mod time;
