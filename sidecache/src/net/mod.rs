//! Network access layer.

mod client;
mod request;

pub use client::{NetworkClient, NetworkError, ReqwestClient};
pub use request::InterceptedRequest;

#[cfg(test)]
pub use client::tests::MockNetworkClient;
