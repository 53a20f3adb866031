use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The deployment whose warehouse schemas are queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Prod,
    Dev,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Dev => "dev",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" => Ok(Environment::Prod),
            "dev" => Ok(Environment::Dev),
            other => Err(CoreError::InvalidInput(
                "environment".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// Time granularity of the perps stats tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Daily,
    Hourly,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Daily => "daily",
            Resolution::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Resolution::Daily),
            "hourly" => Ok(Resolution::Hourly),
            other => Err(CoreError::InvalidInput(
                "resolution".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// A blockchain network with perps stats in the warehouse.
///
/// This is the allow-list for the identifiers that end up in schema and
/// table names, which cannot be bound as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    BaseMainnet,
    BaseSepolia,
    ArbitrumMainnet,
    ArbitrumSepolia,
    OptimismMainnet,
    EthMainnet,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::BaseMainnet => "base_mainnet",
            Chain::BaseSepolia => "base_sepolia",
            Chain::ArbitrumMainnet => "arbitrum_mainnet",
            Chain::ArbitrumSepolia => "arbitrum_sepolia",
            Chain::OptimismMainnet => "optimism_mainnet",
            Chain::EthMainnet => "eth_mainnet",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Chain::BaseMainnet,
            Chain::BaseSepolia,
            Chain::ArbitrumMainnet,
            Chain::ArbitrumSepolia,
            Chain::OptimismMainnet,
            Chain::EthMainnet,
        ]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::all()
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| CoreError::InvalidInput("chain".to_string(), s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_round_trips_through_identifier() {
        for chain in Chain::all() {
            assert_eq!(chain.as_str().parse::<Chain>(), Ok(chain));
        }
    }

    #[test]
    fn test_chain_rejects_injection_attempt() {
        let err = "base_mainnet; DROP TABLE users".parse::<Chain>().unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidInput(
                "chain".to_string(),
                "base_mainnet; DROP TABLE users".to_string()
            )
        );
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        assert!("Base_Mainnet".parse::<Chain>().is_err());
        assert!("PROD".parse::<Environment>().is_err());
        assert!("Daily".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_defaults_match_dashboard_defaults() {
        assert_eq!(Environment::default(), Environment::Prod);
        assert_eq!(Resolution::default(), Resolution::Daily);
    }

    #[test]
    fn test_serde_uses_identifiers() {
        assert_eq!(
            serde_json::to_string(&Chain::ArbitrumMainnet).unwrap(),
            "\"arbitrum_mainnet\""
        );
        assert_eq!(serde_json::to_string(&Resolution::Hourly).unwrap(), "\"hourly\"");
        let env: Environment = serde_json::from_str("\"dev\"").unwrap();
        assert_eq!(env, Environment::Dev);
    }
}
