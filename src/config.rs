use alloc::string::{String, ToString};

use crate::policy::DEFAULT_POLICY;

// Same default as NFD's `tables.cs_max_packets`
pub const DEFAULT_CS_LIMIT: usize = 65536;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CsConfig {
    // Zero disables caching
    pub limit: usize,
    pub policy: String,
    pub admit: bool,
    pub serve: bool,
}

impl Default for CsConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CS_LIMIT,
            policy: DEFAULT_POLICY.to_string(),
            admit: true,
            serve: true,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::CsConfig;

    #[test]
    fn test_partial_config() {
        let config: CsConfig = serde_json::from_str(r#"{"limit": 10, "policy": "lru"}"#).unwrap();
        assert_eq!(config.limit, 10);
        assert_eq!(config.policy, "lru");
        assert!(config.admit && config.serve);

        let config: CsConfig = serde_json::from_str(r#"{"serve": false}"#).unwrap();
        assert_eq!(config, CsConfig { serve: false, ..CsConfig::default() });
    }
}
