// src/config/config.rs
use crate::network::connection::PoolEndpoint;
use crate::types::{Coin, MiningMode};
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lowest accepted thread count
pub const MIN_THREADS: usize = 1;
/// Highest accepted thread count
pub const MAX_THREADS: usize = 64;
/// Lowest accepted intensity
pub const MIN_INTENSITY: f64 = 0.1;
/// Highest accepted intensity
pub const MAX_INTENSITY: f64 = 1.0;

/// User configuration for one mining session
///
/// Immutable once mining starts; [`validate`](Self::validate) runs before
/// any work source or worker is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfiguration {
    /// Coin to mine
    pub coin: Coin,

    /// Solo or pool mining
    pub mode: MiningMode,

    /// Payout address for solo mining
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    /// Pool worker username (pool mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_username: Option<String>,

    /// Pool worker password
    /// (default: "x")
    #[serde(default = "default_pool_password")]
    pub pool_password: String,

    /// Pool host, or `host:port`, overriding the coin's default pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pool_address: Option<String>,

    /// Pool port overriding the coin's default pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pool_port: Option<u16>,

    /// Number of worker threads
    /// (default: logical cores - 1, at least 1)
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Duty cycle of each worker in [0.1, 1.0]
    /// (default: 1.0)
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

fn default_pool_password() -> String {
    "x".into()
}

/// Default worker count: one core left for the rest of the system
pub fn default_threads() -> usize {
    num_cpus::get()
        .saturating_sub(1)
        .clamp(MIN_THREADS, MAX_THREADS)
}

fn default_intensity() -> f64 {
    1.0
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl MiningConfiguration {
    /// Solo configuration with defaults for everything else
    pub fn solo(coin: Coin, wallet_address: impl Into<String>) -> Self {
        MiningConfiguration {
            coin,
            mode: MiningMode::Solo,
            wallet_address: Some(wallet_address.into()),
            pool_username: None,
            pool_password: default_pool_password(),
            custom_pool_address: None,
            custom_pool_port: None,
            threads: default_threads(),
            intensity: default_intensity(),
        }
    }

    /// Pool configuration with defaults for everything else
    pub fn pool(coin: Coin, username: impl Into<String>) -> Self {
        MiningConfiguration {
            mode: MiningMode::Pool,
            wallet_address: None,
            pool_username: Some(username.into()),
            ..MiningConfiguration::solo(coin, String::new())
        }
    }

    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(MiningConfiguration)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&config_str)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Checks the rules a configuration must meet before mining starts
    ///
    /// # Errors
    /// `MinerError::ConfigError` naming the first violated rule.
    pub fn validate(&self) -> Result<(), MinerError> {
        match self.mode {
            MiningMode::Solo => {
                if non_empty(&self.wallet_address).is_none() {
                    return Err(MinerError::ConfigError(
                        "Wallet address is required for solo mining".into(),
                    ));
                }
            }
            MiningMode::Pool => {
                if non_empty(&self.pool_username).is_none() {
                    return Err(MinerError::ConfigError(
                        "Pool username is required for pool mining".into(),
                    ));
                }
                self.pool_endpoint()?;
            }
        }

        if !(MIN_THREADS..=MAX_THREADS).contains(&self.threads) {
            return Err(MinerError::ConfigError(format!(
                "Thread count must be between {} and {}",
                MIN_THREADS, MAX_THREADS
            )));
        }

        if !self.intensity.is_finite()
            || !(MIN_INTENSITY..=MAX_INTENSITY).contains(&self.intensity)
        {
            return Err(MinerError::ConfigError(format!(
                "Intensity must be between {} and {}",
                MIN_INTENSITY, MAX_INTENSITY
            )));
        }

        Ok(())
    }

    /// Pool to connect to: the custom pool if set, else the coin's default
    pub fn pool_endpoint(&self) -> Result<PoolEndpoint, MinerError> {
        let preset = self.coin.preset();
        match (non_empty(&self.custom_pool_address), self.custom_pool_port) {
            (None, None) => Ok(PoolEndpoint::new(
                preset.default_pool_host,
                preset.default_pool_port,
            )),
            (None, Some(port)) => Ok(PoolEndpoint::new(preset.default_pool_host, port)),
            (Some(address), Some(port)) => {
                let host = address
                    .split("://")
                    .last()
                    .unwrap_or(address)
                    .split(':')
                    .next()
                    .unwrap_or(address);
                Ok(PoolEndpoint::new(host, port))
            }
            (Some(address), None) => PoolEndpoint::parse(address),
        }
    }

    /// Username sent with `mining.authorize`
    pub fn username(&self) -> &str {
        non_empty(&self.pool_username).unwrap_or_default()
    }

    /// Trimmed solo payout address
    pub fn wallet(&self) -> &str {
        non_empty(&self.wallet_address).unwrap_or_default()
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `mode` - Which mining mode the template is set up for
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template(mode: MiningMode) -> String {
        let mut template = String::new();
        template.push_str("# Scrypt Miner Configuration\n\n");
        template.push_str("# Supported coins: litecoin, dogecoin, feathercoin\n");
        template.push_str("coin = \"litecoin\"\n");
        template.push_str("# Mining mode: solo or pool\n");
        template.push_str(&format!("mode = \"{}\"\n", mode));
        template.push_str("# Number of worker threads (1-64, default: cores - 1)\n");
        template.push_str(&format!("threads = {}\n", default_threads()));
        template.push_str("# Fraction of time each worker spends hashing (0.1-1.0)\n");
        template.push_str("intensity = 1.0\n\n");

        match mode {
            MiningMode::Solo => {
                template.push_str("# Solo mining: block rewards are paid to this address\n");
                template.push_str("wallet_address = \"your_wallet_address\"\n");
            }
            MiningMode::Pool => {
                template.push_str("# Pool mining credentials\n");
                template.push_str("pool_username = \"your_wallet_address.worker01\"\n");
                template.push_str("pool_password = \"x\"\n");
                template.push_str("# Optional: override the coin's default pool\n");
                template.push_str("# custom_pool_address = \"stratum+tcp://pool.example.com\"\n");
                template.push_str("# custom_pool_port = 3333\n");
            }
        }

        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trips_through_loader() {
        for mode in [MiningMode::Solo, MiningMode::Pool] {
            let template = MiningConfiguration::generate_template(mode);
            let config: MiningConfiguration = toml::from_str(&template).unwrap();
            assert_eq!(config.mode, mode);
            assert_eq!(config.coin, Coin::Litecoin);
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: MiningConfiguration =
            toml::from_str("coin = \"dogecoin\"\nmode = \"pool\"\npool_username = \"bob\"\n")
                .unwrap();
        assert_eq!(config.pool_password, "x");
        assert_eq!(config.intensity, 1.0);
        assert!(config.threads >= 1);
        assert_eq!(
            config.pool_endpoint().unwrap(),
            PoolEndpoint::new("prohashing.com", 3332)
        );
    }

    #[test]
    fn test_validation_messages() {
        let mut solo = MiningConfiguration::solo(Coin::Litecoin, "  ");
        assert_eq!(
            solo.validate().unwrap_err().to_string(),
            "Configuration error: Wallet address is required for solo mining"
        );
        solo.wallet_address = Some("LWallet".into());
        solo.validate().unwrap();

        let pool = MiningConfiguration::pool(Coin::Litecoin, "");
        assert!(
            pool.validate()
                .unwrap_err()
                .to_string()
                .contains("Pool username is required")
        );

        for threads in [0, 65] {
            let mut config = MiningConfiguration::solo(Coin::Litecoin, "LWallet");
            config.threads = threads;
            assert!(config.validate().unwrap_err().to_string().contains("Thread count"));
        }
        for threads in [1, 64] {
            let mut config = MiningConfiguration::solo(Coin::Litecoin, "LWallet");
            config.threads = threads;
            config.validate().unwrap();
        }

        for intensity in [0.05, 1.01, f64::NAN] {
            let mut config = MiningConfiguration::solo(Coin::Litecoin, "LWallet");
            config.intensity = intensity;
            assert!(config.validate().unwrap_err().to_string().contains("Intensity"));
        }
    }

    #[test]
    fn test_custom_pool_endpoint() {
        let mut config = MiningConfiguration::pool(Coin::Litecoin, "alice");
        config.custom_pool_address = Some("stratum+tcp://my.pool:4444".into());
        assert_eq!(config.pool_endpoint().unwrap(), PoolEndpoint::new("my.pool", 4444));

        config.custom_pool_port = Some(5555);
        assert_eq!(config.pool_endpoint().unwrap(), PoolEndpoint::new("my.pool", 5555));

        config.custom_pool_address = Some("portless.pool".into());
        config.custom_pool_port = None;
        assert!(config.validate().is_err());
    }
}
