// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tool reservation broker.
//!
//! Shared lab tools (protocol stacks, relays, traffic generators) are
//! reserved for a test node before use, and looked up by the protocols they
//! serve. The broker speaks JSON over HTTP, answering every request with an
//! [`Envelope`].

use std::time::Duration;

use derive_more::with_trait::{Display, Error};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::Envelope;

/// Tool serving a looked up protocol.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Lookup {
    /// Port of the tool, either a number or a string.
    pub port: Value,

    /// Name of the tool to reserve.
    pub toolname: String,
}

impl Lookup {
    /// Returns the port as it appears in configuration file names.
    #[must_use]
    pub fn port(&self) -> String {
        match &self.port {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// CRC of a configuration file known to the broker.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ConfigCrc {
    pub crc: String,
}

/// Web relays wired to a rig: relay `indices[i]` of the board at
/// `addresses[i]`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RelayInfo {
    pub addresses: Vec<String>,
    pub indices: Vec<u8>,
}

/// Error of talking to a [`Broker`].
#[derive(Debug, Display, Error)]
pub enum BrokerError {
    /// Request didn't reach the broker, or its response was cut.
    #[display("request to `{endpoint}` failed: {reason}")]
    Transport {
        #[error(not(source))]
        endpoint: String,
        reason: String,
    },

    /// Broker answered with a non-success HTTP status.
    #[display("`{endpoint}` answered HTTP {code}: {body}")]
    Status {
        #[error(not(source))]
        endpoint: String,
        code: u16,
        body: String,
    },

    /// Broker answered with something not being an [`Envelope`].
    #[display("cannot decode response of `{endpoint}`: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// Tool reservation broker.
pub trait Broker {
    /// Reserves the `tool` for the `node`. Status `1` means the tool is busy
    /// and the request may be repeated later.
    ///
    /// # Errors
    ///
    /// If the broker can't be reached.
    fn reserve(
        &self,
        node: &str,
        tool: &str,
        vlan_id: u32,
    ) -> Result<Envelope<Value>, BrokerError>;

    /// Releases the `tool` reserved by the `node`.
    ///
    /// # Errors
    ///
    /// If the broker can't be reached.
    fn unreserve(&self, node: &str, tool: &str)
        -> Result<Envelope<Value>, BrokerError>;

    /// Looks up the tool serving a `standard` protocol, optionally combined
    /// with a `safe` one.
    ///
    /// # Errors
    ///
    /// If the broker can't be reached.
    fn lookup(
        &self,
        standard: &str,
        safe: Option<&str>,
    ) -> Result<Envelope<Option<Lookup>>, BrokerError>;

    /// Looks up the CRC of a configuration file.
    ///
    /// # Errors
    ///
    /// If the broker can't be reached.
    fn config_crc(
        &self,
        filename: &str,
    ) -> Result<Envelope<Option<ConfigCrc>>, BrokerError>;

    /// Looks up the web relays wired to the rig with the given
    /// `automation_index`.
    ///
    /// # Errors
    ///
    /// If the broker can't be reached.
    fn relay_info(
        &self,
        automation_index: &str,
    ) -> Result<Envelope<Option<RelayInfo>>, BrokerError>;
}

/// [`Broker`] reached over HTTP.
#[derive(Debug)]
pub struct HttpBroker {
    base: String,
    agent: ureq::Agent,
}

impl HttpBroker {
    /// Creates a client of the broker serving at `base_url`, like
    /// `http://10.10.1.100:5000/api/v2`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build();
        Self { base: base_url.trim_end_matches('/').to_owned(), agent }
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
        body: &Value,
    ) -> Result<T, BrokerError> {
        let endpoint = format!("{}{path}", self.base);
        tracing::debug!("POST {endpoint} {body}");

        let mut req = self
            .agent
            .post(&endpoint)
            .set("Content-Type", "application/json");
        if let Some((param, value)) = query {
            req = req.query(param, value);
        }
        let resp = req.send_string(&body.to_string()).map_err(|e| match e {
            ureq::Error::Status(code, resp) => BrokerError::Status {
                endpoint: endpoint.clone(),
                code,
                body: resp.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => BrokerError::Transport {
                endpoint: endpoint.clone(),
                reason: t.to_string(),
            },
        })?;
        let text = resp.into_string().map_err(|e| BrokerError::Transport {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!("{endpoint} answered {text}");

        serde_json::from_str(&text)
            .map_err(|source| BrokerError::Decode { endpoint, source })
    }
}

impl Broker for HttpBroker {
    fn reserve(
        &self,
        node: &str,
        tool: &str,
        vlan_id: u32,
    ) -> Result<Envelope<Value>, BrokerError> {
        self.post(
            "/reserve",
            Some(("vlan_id", &vlan_id.to_string())),
            &json!({ "node": node, "toolname": tool }),
        )
    }

    fn unreserve(
        &self,
        node: &str,
        tool: &str,
    ) -> Result<Envelope<Value>, BrokerError> {
        self.post(
            "/unreserve",
            None,
            &json!({ "node": node, "toolname": tool }),
        )
    }

    fn lookup(
        &self,
        standard: &str,
        safe: Option<&str>,
    ) -> Result<Envelope<Option<Lookup>>, BrokerError> {
        let body = match safe {
            Some(safe) => json!({ "standard": standard, "safe": safe }),
            None => json!({ "standard": standard }),
        };
        self.post("/lookup", None, &body)
    }

    fn config_crc(
        &self,
        filename: &str,
    ) -> Result<Envelope<Option<ConfigCrc>>, BrokerError> {
        self.post("/lookup/config-crc", None, &json!({ "filename": filename }))
    }

    fn relay_info(
        &self,
        automation_index: &str,
    ) -> Result<Envelope<Option<RelayInfo>>, BrokerError> {
        let endpoint = "/lookup-relay-info";
        let env: Envelope<Option<String>> = self.post(
            endpoint,
            None,
            &json!({ "automation_index": automation_index }),
        )?;

        // The wiring table comes as a JSON document nested into a string.
        let info = env
            .data
            .as_deref()
            .map(serde_json::from_str::<RelayInfo>)
            .transpose()
            .map_err(|source| BrokerError::Decode {
                endpoint: format!("{}{endpoint}", self.base),
                source,
            })?;
        Ok(Envelope { status: env.status, description: env.description, data: info })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_port_renders_numbers_and_strings() {
        let numeric: Lookup =
            serde_json::from_value(json!({ "port": 25, "toolname": "eip1" }))
                .unwrap();
        let textual: Lookup =
            serde_json::from_value(json!({ "port": "7", "toolname": "pn1" }))
                .unwrap();

        assert_eq!(numeric.port(), "25");
        assert_eq!(textual.port(), "7");
    }

    #[test]
    fn trims_trailing_slash_of_base_url() {
        let broker = HttpBroker::new("http://localhost:5000/api/v2/");

        assert_eq!(broker.base, "http://localhost:5000/api/v2");
    }
}
