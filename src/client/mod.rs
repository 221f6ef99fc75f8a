//! HTTP client for the activation service.

pub mod http;

#[cfg(test)]
pub(crate) mod test_server;
