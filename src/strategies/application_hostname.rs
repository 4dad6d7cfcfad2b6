use std::{collections::HashMap, net::UdpSocket};

use super::{split_list, Strategy};
use crate::Context;

/// Enabled on hosts listed in the comma-separated `hostNames` parameter.
///
/// The local address is resolved once, when the strategy is constructed, and reused for every
/// evaluation. Use [`ApplicationHostnameStrategy::with_host`] to supply the value explicitly.
#[derive(Debug, Clone)]
pub struct ApplicationHostnameStrategy {
    /// Lower-cased local address.
    host: String,
}

impl ApplicationHostnameStrategy {
    pub const HOST_NAMES_PARAM: &'static str = "hostNames";

    /// Value used when the local address cannot be determined. It never matches a real host.
    pub const UNDEFINED_HOST: &'static str = "undefined-ip-address";

    /// Create the strategy, resolving the local network address of this host.
    pub fn new() -> ApplicationHostnameStrategy {
        ApplicationHostnameStrategy::with_host(local_ip_address())
    }

    /// Create the strategy for an explicitly provided host value.
    ///
    /// An empty value is replaced with [`Self::UNDEFINED_HOST`], so it can't match empty entries.
    pub fn with_host(host: impl Into<String>) -> ApplicationHostnameStrategy {
        let host = host.into();
        let host = if host.trim().is_empty() {
            Self::UNDEFINED_HOST.to_owned()
        } else {
            host.to_lowercase()
        };
        ApplicationHostnameStrategy { host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Default for ApplicationHostnameStrategy {
    fn default() -> Self {
        ApplicationHostnameStrategy::new()
    }
}

impl Strategy for ApplicationHostnameStrategy {
    fn name(&self) -> &str {
        "applicationHostname"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, _context: &Context) -> bool {
        let Some(host_names) = parameters.get(Self::HOST_NAMES_PARAM) else {
            return false;
        };
        if host_names.is_empty() {
            return false;
        }
        split_list(&host_names.to_lowercase()).any(|host| host == self.host)
    }
}

/// Address of the interface this host would use for outbound traffic.
///
/// Connecting a UDP socket only selects a route; no packets are sent.
fn local_ip_address() -> String {
    let address = UdpSocket::bind(("0.0.0.0", 0)).and_then(|socket| {
        socket.connect(("192.0.2.1", 9))?;
        socket.local_addr()
    });

    match address {
        Ok(address) if !address.ip().is_unspecified() => address.ip().to_string(),
        Ok(_) => ApplicationHostnameStrategy::UNDEFINED_HOST.to_owned(),
        Err(err) => {
            log::warn!(target: "toggle", "failed to resolve local address: {err}");
            ApplicationHostnameStrategy::UNDEFINED_HOST.to_owned()
        }
    }
}
