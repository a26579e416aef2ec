// src/signal/endpoint.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{RebuildError, Result};
use crate::types::TriggerSource;

/// Address of a trigger channel.
///
/// Text form is `unix:/path/to.sock` or `tcp:host:port`. Without a prefix,
/// anything containing a `/` is taken as a socket path and anything that
/// looks like `host:port` as a TCP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("unix:") {
            return unix_endpoint(s, path);
        }
        if let Some(addr) = s.strip_prefix("tcp:") {
            return tcp_endpoint(s, addr);
        }
        if s.contains('/') {
            return unix_endpoint(s, s);
        }
        tcp_endpoint(s, s)
    }

    /// Which trigger source connections on this endpoint count as.
    pub fn source(&self) -> TriggerSource {
        match self {
            Endpoint::Unix(_) => TriggerSource::Local,
            Endpoint::Tcp(_) => TriggerSource::Network,
        }
    }
}

fn unix_endpoint(raw: &str, path: &str) -> Result<Endpoint> {
    if path.is_empty() {
        return Err(RebuildError::InvalidEndpoint(raw.to_string()));
    }
    Ok(Endpoint::Unix(PathBuf::from(path)))
}

fn tcp_endpoint(raw: &str, addr: &str) -> Result<Endpoint> {
    let valid = match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    };
    if !valid {
        return Err(RebuildError::InvalidEndpoint(raw.to_string()));
    }
    Ok(Endpoint::Tcp(addr.to_string()))
}

impl FromStr for Endpoint {
    type Err = RebuildError;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp:{addr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_forms() -> Result<()> {
        assert_eq!(
            Endpoint::parse("unix:/run/x.sock")?,
            Endpoint::Unix("/run/x.sock".into())
        );
        assert_eq!(
            Endpoint::parse("tcp:127.0.0.1:45718")?,
            Endpoint::Tcp("127.0.0.1:45718".into())
        );
        assert_eq!(
            Endpoint::parse("tcp:[::1]:9000")?,
            Endpoint::Tcp("[::1]:9000".into())
        );
        Ok(())
    }

    #[test]
    fn infers_bare_forms() -> Result<()> {
        assert_eq!(
            Endpoint::parse("/tmp/a.sock")?.source(),
            TriggerSource::Local
        );
        assert_eq!(
            Endpoint::parse("localhost:80")?.source(),
            TriggerSource::Network
        );
        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "unix:", "tcp:", "tcp:host", "tcp::80", "host:notaport", "x:99999"] {
            assert!(Endpoint::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn display_round_trips_through_parse() -> Result<()> {
        let ep = Endpoint::Tcp("0.0.0.0:45718".into());
        assert_eq!(ep.to_string().parse::<Endpoint>()?, ep);
        Ok(())
    }
}
