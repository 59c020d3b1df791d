//! Network identification for the Stacks blockchain.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default node API for mainnet.
pub const MAINNET_API_URL: &str = "https://api.hiro.so";

/// Default node API for testnet.
pub const TESTNET_API_URL: &str = "https://api.testnet.hiro.so";

/// The Stacks network a client is connected to.
///
/// The network determines the transaction version byte, the chain id, the
/// single-sig address version, and the default node API endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Stacks mainnet (production network).
    Mainnet,
    /// Stacks testnet.
    #[default]
    Testnet,
}

impl Network {
    /// Transaction version byte used in the serialized wire format.
    pub fn transaction_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x80,
        }
    }

    /// Chain id embedded in every transaction.
    pub fn chain_id(&self) -> u32 {
        match self {
            Network::Mainnet => 0x0000_0001,
            Network::Testnet => 0x8000_0000,
        }
    }

    /// c32 address version for single-signature (P2PKH) accounts.
    ///
    /// Mainnet addresses render as `SP…`, testnet addresses as `ST…`.
    pub fn address_version(&self) -> u8 {
        match self {
            Network::Mainnet => 22,
            Network::Testnet => 26,
        }
    }

    /// Default node API endpoint for this network.
    pub fn api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_API_URL,
            Network::Testnet => TESTNET_API_URL,
        }
    }

    /// Returns true if this is mainnet.
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    /// Returns the network identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(Error::Config(format!(
                "Unknown network '{other}', expected 'mainnet' or 'testnet'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_wire_constants() {
        assert_eq!(Network::Mainnet.transaction_version(), 0x00);
        assert_eq!(Network::Testnet.transaction_version(), 0x80);
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::Testnet.chain_id(), 0x8000_0000);
        assert_eq!(Network::Mainnet.address_version(), 22);
        assert_eq!(Network::Testnet.address_version(), 26);
    }

    #[test]
    fn test_network_display_parse() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert!("sandbox".parse::<Network>().is_err());
    }

    #[test]
    fn test_default_is_testnet() {
        assert_eq!(Network::default(), Network::Testnet);
    }
}
