//! `shopd-server` — the TCP daemon tying the shop together.
//!
//! Clients speak a line protocol: one request line in, one framed reply
//! out (`OK <n>` plus n payload lines, or a single `ERR <CODE> <message>`
//! line). Each connection runs as its own task over one shared [`Shop`].

pub mod proto;
pub mod session;
pub mod shop;

pub use shop::Shop;
