//! Request extractors.

use std::{
  convert::Infallible,
  net::{IpAddr, Ipv4Addr, SocketAddr},
};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::request::Parts,
};

/// The peer address of the TCP connection, rendered as an IP string.
///
/// Goes through axum's own `ConnectInfo` extractor, so a `MockConnectInfo`
/// layer is honoured too. Falls back to the loopback address when the router
/// is served without connect info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientAddress {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let ip = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
      .await
      .map(|ConnectInfo(addr)| addr.ip())
      .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    Ok(ClientAddress(ip.to_string()))
  }
}
