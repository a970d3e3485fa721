//! Response types returned by the daemon's local API.
//!
//! Field names follow the daemon's JSON (PascalCase). Only the fields this
//! service consumes are modelled; everything else is ignored on decode.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// whois
// ---------------------------------------------------------------------------

/// Identity record for a peer address, as returned by `/localapi/v0/whois`.
///
/// Kept as an opaque JSON value so it round-trips to callers byte-for-byte in
/// meaning, including fields newer daemons add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhoIs(pub serde_json::Value);

impl WhoIs {
    /// `UserProfile.LoginName`, if present.
    pub fn login_name(&self) -> Option<&str> {
        self.0.get("UserProfile")?.get("LoginName")?.as_str()
    }

    /// `Node.Name` (the node's MagicDNS name), if present.
    pub fn node_name(&self) -> Option<&str> {
        self.0.get("Node")?.get("Name")?.as_str()
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

/// Subset of `/localapi/v0/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    /// Daemon state, e.g. `"Running"` or `"NeedsLogin"`.
    #[serde(default)]
    pub backend_state: String,

    /// This node's own peer entry.
    #[serde(rename = "Self", default)]
    pub self_status: Option<PeerStatus>,

    /// Domains the daemon can obtain TLS certificates for.
    #[serde(default)]
    pub cert_domains: Option<Vec<String>>,
}

/// Subset of a peer entry in [`Status`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerStatus {
    /// Fully-qualified MagicDNS name, with a trailing dot.
    #[serde(rename = "DNSName", default)]
    pub dns_name: String,
}

impl Status {
    /// This node's MagicDNS name with the trailing dot removed, or `""` when the
    /// daemon reported no self entry.
    pub fn self_dns_name(&self) -> &str {
        self.self_status
            .as_ref()
            .map(|s| s.dns_name.trim_end_matches('.'))
            .unwrap_or_default()
    }

    /// Cert domains, empty if the daemon sent none.
    pub fn cert_domains(&self) -> &[String] {
        self.cert_domains.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// JSON body the daemon sends alongside non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whois_accessors_read_nested_fields() {
        let w = WhoIs(json!({
            "Node": {"ID": 1, "Name": "laptop.example.ts.net."},
            "UserProfile": {"ID": 7, "LoginName": "alice@example.com"}
        }));
        assert_eq!(w.login_name(), Some("alice@example.com"));
        assert_eq!(w.node_name(), Some("laptop.example.ts.net."));
    }

    #[test]
    fn whois_serialises_transparently() {
        let raw = json!({"Node": {"Name": "n."}, "CapMap": {"x": [1]}});
        let w = WhoIs(raw.clone());
        assert_eq!(serde_json::to_value(&w).unwrap(), raw);
    }

    #[test]
    fn status_decodes_subset_and_trims_dns_name() {
        let st: Status = serde_json::from_value(json!({
            "Version": "1.70.0",
            "BackendState": "Running",
            "Self": {"DNSName": "server.example.ts.net.", "HostName": "server", "Online": true},
            "CertDomains": ["server.example.ts.net"],
            "Peer": {}
        }))
        .unwrap();
        assert_eq!(st.backend_state, "Running");
        assert_eq!(st.self_dns_name(), "server.example.ts.net");
        assert_eq!(st.cert_domains(), ["server.example.ts.net".to_string()]);
    }

    #[test]
    fn status_tolerates_missing_self_and_null_cert_domains() {
        let st: Status =
            serde_json::from_value(json!({"BackendState": "NeedsLogin", "CertDomains": null}))
                .unwrap();
        assert_eq!(st.self_dns_name(), "");
        assert!(st.cert_domains().is_empty());
    }
}
