// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Live DNS queries for the health monitor.

use async_trait::async_trait;
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::{DNSClass, Name, RData, RecordType};
use hickory_client::udp::UdpClientConnection;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::constants::IN_ADDR_ARPA;
use crate::errors::ResolveError;

/// Issues forward and reverse lookups against one resolver.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Addresses returned for an A query on `fqdn`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on timeout, transport failure or an error rcode.
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, ResolveError>;

    /// Names (trailing-dot qualified) returned for a PTR query on `ip`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on timeout, transport failure or an error rcode.
    async fn lookup_ptr(&self, ip: Ipv4Addr) -> Result<Vec<String>, ResolveError>;

    /// Address of the resolver, for reports.
    fn server(&self) -> String;
}

/// `in-addr.arpa` query name for `ip` (e.g. `10.1.168.192.in-addr.arpa.`).
#[must_use]
pub fn reverse_name(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{d}.{c}.{b}.{a}.{IN_ADDR_ARPA}.")
}

/// [`Resolver`] that queries a specific server over UDP with hickory-client.
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl HickoryResolver {
    #[must_use]
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    /// Run one query, returning the answer data of the requested type.
    async fn query(&self, name: String, record_type: RecordType) -> Result<Vec<RData>, ResolveError> {
        let server = self.server;
        let timeout = self.timeout;

        // hickory-client's SyncClient blocks, keep it off the async executor
        tokio::task::spawn_blocking(move || {
            let query_failed = |reason: String| ResolveError::QueryFailed {
                name: name.clone(),
                server: server.to_string(),
                reason,
            };

            let fqdn = Name::from_str(&name).map_err(|e| ResolveError::InvalidName {
                name: name.clone(),
                reason: e.to_string(),
            })?;

            let conn = UdpClientConnection::with_timeout(server, timeout)
                .map_err(|e| query_failed(format!("failed to create UDP connection: {e}")))?;
            let client = SyncClient::new(conn);

            let response = client
                .query(&fqdn, DNSClass::IN, record_type)
                .map_err(|e| query_failed(e.to_string()))?;

            if response.response_code() != ResponseCode::NoError {
                return Err(ResolveError::ErrorResponse {
                    name: name.clone(),
                    server: server.to_string(),
                    rcode: format!("{:?}", response.response_code()),
                });
            }

            let answers: Vec<RData> = response
                .answers()
                .iter()
                .filter(|r| r.record_type() == record_type)
                .filter_map(|r| r.data().cloned())
                .collect();

            debug!(
                name = %name,
                record_type = ?record_type,
                server = %server,
                answers = answers.len(),
                "DNS query answered"
            );

            Ok(answers)
        })
        .await
        .map_err(|e| ResolveError::QueryFailed {
            name: String::new(),
            server: server.to_string(),
            reason: format!("query task failed: {e}"),
        })?
    }
}

#[async_trait]
impl Resolver for HickoryResolver {
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let answers = self.query(fqdn.to_string(), RecordType::A).await?;
        Ok(answers
            .into_iter()
            .filter_map(|data| match data {
                RData::A(a) => Some(a.0),
                _ => None,
            })
            .collect())
    }

    async fn lookup_ptr(&self, ip: Ipv4Addr) -> Result<Vec<String>, ResolveError> {
        let answers = self.query(reverse_name(ip), RecordType::PTR).await?;
        Ok(answers
            .into_iter()
            .filter_map(|data| match data {
                RData::PTR(ptr) => {
                    let name = ptr.0.to_string();
                    Some(if name.ends_with('.') {
                        name
                    } else {
                        format!("{name}.")
                    })
                }
                _ => None,
            })
            .collect())
    }

    fn server(&self) -> String {
        self.server.to_string()
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
