use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetParseError {
    #[error("invalid IPv4 network: {0}")]
    InvalidNetwork(String),
    /// Well-formed block refused for its size.
    #[error(
        "{0}: valid network, but /{1} is too large to scan (minimum prefix: /{min})",
        min = MIN_IPV4_PREFIX
    )]
    TooLarge(String, u8),
    #[error("empty network")]
    Empty,
}

/// Minimum CIDR prefix length accepted. A /8 contains 16M hosts.
pub const MIN_IPV4_PREFIX: u8 = 8;

/// Parse `input` as an IPv4 CIDR block (host bits may be set).
pub fn parse_network(input: &str) -> Result<Ipv4Network, TargetParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TargetParseError::Empty);
    }

    let parsed: Ipv4Network = input
        .parse()
        .map_err(|e| TargetParseError::InvalidNetwork(format!("{input}: {e}")))?;

    // Normalize 192.168.1.77/24 to 192.168.1.0/24
    let network = Ipv4Network::new(parsed.network(), parsed.prefix())
        .map_err(|e| TargetParseError::InvalidNetwork(format!("{input}: {e}")))?;

    if network.prefix() < MIN_IPV4_PREFIX {
        return Err(TargetParseError::TooLarge(
            input.to_string(),
            network.prefix(),
        ));
    }

    Ok(network)
}

/// Expand a CIDR block into its usable host addresses, ascending.
///
/// Network and broadcast addresses are excluded. A /31 yields both of its
/// addresses and a /32 its single address.
pub fn expand_cidr(input: &str) -> Result<Vec<Ipv4Addr>, TargetParseError> {
    let network = parse_network(input)?;
    Ok(usable_hosts(network))
}

pub(crate) fn usable_hosts(network: Ipv4Network) -> Vec<Ipv4Addr> {
    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());

    match network.prefix() {
        32 => vec![network.network()],
        31 => vec![Ipv4Addr::from(first), Ipv4Addr::from(last)],
        _ => (first + 1..last).map(Ipv4Addr::from).collect(),
    }
}
