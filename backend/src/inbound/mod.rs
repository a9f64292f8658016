//! Inbound adapters exposing the domain over HTTP and WebSocket.

pub mod http;
pub mod ws;
