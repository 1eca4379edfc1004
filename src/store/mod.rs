//! Client for the remote record store (an opaque script endpoint).

mod client;

pub use client::{StoreClient, StoreError};
