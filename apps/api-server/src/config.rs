//! Application configuration loaded from environment variables.

use std::collections::BTreeMap;
use std::env;

use turnstile_core::RatePolicy;
use turnstile_core::services::DEFAULT_NAMESPACE;

#[cfg(feature = "redis")]
use turnstile_infra::RedisConfig;

/// Built-in policy table: (prefix, window seconds, max requests per window).
pub const DEFAULT_POLICIES: &[(&str, u64, u64)] = &[
    ("/login", 10, 5),
    ("/anonymous", 60, 15),
    ("/card", 1, 5),
    ("/user", 1, 1),
    ("/package", 1, 2),
    ("/quota", 1, 2),
    ("/buy", 1, 2),
    ("/subscribe", 1, 2),
    ("/subscription", 1, 2),
    ("/chat", 1, 5),
    ("/conversation", 1, 5),
    ("/invite", 7200, 20),
    ("/v1", 1, 600),
    ("/generation", 1, 5),
    ("/article", 1, 5),
];

const POLICY_VAR_PREFIX: &str = "THROTTLE_POLICY_";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Redis settings, present when `REDIS_URL` is set.
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub throttle: ThrottleConfig,
}

/// Rate policy configuration.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Namespace prepended to every counter key.
    pub namespace: String,
    /// Prefix to policy, deduplicated. Later sources override earlier ones.
    pub policies: BTreeMap<String, RatePolicy>,
    /// Identify clients by `Forwarded` / `X-Forwarded-For`. Disable unless a
    /// trusted proxy sets them, otherwise clients can pick their own identity.
    pub trust_forwarded_headers: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        #[cfg(feature = "redis")]
        let redis = env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env());

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            #[cfg(feature = "redis")]
            redis,
            throttle: ThrottleConfig::from_env(),
        }
    }
}

impl ThrottleConfig {
    pub fn from_env() -> Self {
        let builtin = env::var("THROTTLE_BUILTIN_POLICIES")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            namespace: env::var("THROTTLE_KEY_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            policies: Self::collect_policies(builtin, env::vars()),
            trust_forwarded_headers: env::var("TRUST_FORWARDED_HEADERS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    /// Merge the built-in table with `THROTTLE_POLICY_<NAME>` overrides.
    /// Format: THROTTLE_POLICY_<NAME>=<prefix>,<window seconds>,<max count>
    /// Example: THROTTLE_POLICY_EXPORT=/export,60,3
    fn collect_policies(
        builtin: bool,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> BTreeMap<String, RatePolicy> {
        let mut policies = BTreeMap::new();

        if builtin {
            for &(prefix, window, count) in DEFAULT_POLICIES {
                match RatePolicy::new(window, count) {
                    Ok(policy) => {
                        policies.insert(prefix.to_string(), policy);
                    }
                    Err(e) => tracing::warn!(prefix, error = %e, "Skipping built-in policy"),
                }
            }
        }

        // Sorted so overrides apply in a stable order.
        let mut overrides: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with(POLICY_VAR_PREFIX))
            .collect();
        overrides.sort();

        for (key, value) in overrides {
            match parse_policy(&value) {
                Ok((prefix, policy)) => {
                    tracing::debug!(var = %key, prefix = %prefix, "Policy override loaded");
                    policies.insert(prefix, policy);
                }
                Err(reason) => {
                    tracing::warn!(
                        var = %key,
                        value = %value,
                        reason = %reason,
                        "Skipping invalid policy"
                    );
                }
            }
        }

        policies
    }
}

/// Parse `<prefix>,<window seconds>,<max count>`.
fn parse_policy(value: &str) -> Result<(String, RatePolicy), String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [prefix, window, count] = parts.as_slice() else {
        return Err("expected <prefix>,<window seconds>,<max count>".to_string());
    };

    if !prefix.starts_with('/') {
        return Err(format!("prefix must start with '/': {}", prefix));
    }
    let window: u64 = window
        .parse()
        .map_err(|_| format!("invalid window seconds: {}", window))?;
    let count: u64 = count
        .parse()
        .map_err(|_| format!("invalid max count: {}", count))?;

    let policy = RatePolicy::new(window, count).map_err(|e| e.to_string())?;
    Ok((prefix.to_string(), policy))
}
