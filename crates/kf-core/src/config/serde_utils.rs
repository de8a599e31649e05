//! Serde helpers for configuration values

/// `Duration` stored as whole seconds, e.g. `step_settle_delay = 2`
pub mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Delays {
        #[serde(with = "duration_secs")]
        settle: Duration,
    }

    #[test]
    fn test_duration_secs_in_toml() {
        let delays = Delays {
            settle: Duration::from_secs(2),
        };
        let text = toml::to_string(&delays).unwrap();
        assert_eq!(text.trim(), "settle = 2");

        let parsed: Delays = toml::from_str("settle = 5").unwrap();
        assert_eq!(parsed.settle, Duration::from_secs(5));
    }

    #[test]
    fn test_duration_secs_rejects_negative() {
        assert!(toml::from_str::<Delays>("settle = -1").is_err());
    }
}
