//! Wire formats spoken by upstream backends

pub mod chat;
