use serde::{Deserialize, Serialize};

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_currency_label() -> String {
    "IDR".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// SQLite file path, or `:memory:`.
    pub database_path: String,
    /// How long a connection waits for another writer before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Printed after amounts in notification text.
    #[serde(default = "default_currency_label")]
    pub currency_label: String,
    #[serde(default = "default_true")]
    pub require_rejection_reason: bool,
}

impl Default for DeskConfig {
    /// A `desk.db` file in the working directory.
    fn default() -> Self {
        Self {
            database_path: "desk.db".into(),
            busy_timeout_ms: default_busy_timeout_ms(),
            currency_label: default_currency_label(),
            require_rejection_reason: true,
        }
    }
}

impl DeskConfig {
    /// Load from a JSON file.
    /// In tests, use DeskConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: DeskConfig = serde_json::from_str(content)?;
        if config.currency_label.trim().is_empty() {
            anyhow::bail!("currency_label must not be empty");
        }
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            database_path: ":memory:".into(),
            ..Self::default()
        }
    }

    pub fn format_amount(&self, amount: i64) -> String {
        format!("{amount} {}", self.currency_label)
    }
}
