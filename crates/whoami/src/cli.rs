//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

/// Serve the tailnet identity of HTTPS callers at `/whoami`.
#[derive(Debug, Clone, Parser)]
#[command(name = "whoami", version)]
pub struct Args {
    /// Comma-separated list of allowed origins.
    #[arg(long, default_value = "http://localhost:3000")]
    pub allowed_origins: String,

    /// Address to listen on (`host:port` or `:port`). Overrides `PORT`.
    #[arg(long)]
    pub address: Option<String>,

    /// Path to the tailscaled socket. Overrides `TAILSCALED_SOCKET`.
    #[arg(long)]
    pub socket: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["whoami"]);
        assert_eq!(args.allowed_origins, "http://localhost:3000");
        assert!(args.address.is_none());
        assert!(args.socket.is_none());
    }

    #[test]
    fn flags_parse() {
        let args = Args::parse_from([
            "whoami",
            "--allowed-origins",
            "https://a.example, https://b.example",
            "--address",
            ":9443",
        ]);
        assert_eq!(args.allowed_origins, "https://a.example, https://b.example");
        assert_eq!(args.address.as_deref(), Some(":9443"));
    }
}
