//! Synchronous request/response binding for a [`Store`](crate::Store).
//!
//! A [`Server`] publishes the store under a logical name in a [`Registry`];
//! a [`Client`] resolves that name and forwards calls over one TCP
//! connection. Delivery is at most once per call with no retries.

pub mod wire;

mod registry;
pub use registry::Registry;

mod server;
pub use server::{Server, ServerHandle};

mod client;
pub use client::{Client, ClientConfig};
