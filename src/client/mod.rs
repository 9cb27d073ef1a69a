//! The authenticated client and its configuration.

mod config;
mod http;

pub use config::{ClientConfig, CLOUD_BASE_URL, GATEWAY_BASE_URL};
pub use http::IbkrClient;

pub(crate) use http::ClientInner;
