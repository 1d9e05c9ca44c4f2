use anyhow::{Context, Result};
use paginated_fetcher::DEFAULT_SERVICE_MAX_PAGE_SIZE;

pub const MAX_PAGE_SIZE_VAR: &str = "BACKUP_LISTER_MAX_PAGE_SIZE";
pub const DEFAULT_MAX_ITEMS_VAR: &str = "BACKUP_LISTER_DEFAULT_MAX_ITEMS";
pub const STRICT_LIMIT_VAR: &str = "BACKUP_LISTER_STRICT_LIMIT";

/// Function-level settings, read from the Lambda environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ListerConfig {
    pub max_page_size: i32,
    pub default_max_items: Option<usize>,
    pub strict_limit: bool,
}

impl Default for ListerConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_SERVICE_MAX_PAGE_SIZE,
            default_max_items: None,
            strict_limit: false,
        }
    }
}

impl ListerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup; unset or empty values keep defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(MAX_PAGE_SIZE_VAR) {
            let size: i32 = value
                .trim()
                .parse()
                .with_context(|| format!("{MAX_PAGE_SIZE_VAR} is not a number: {value}"))?;
            anyhow::ensure!(
                (1..=DEFAULT_SERVICE_MAX_PAGE_SIZE).contains(&size),
                "{MAX_PAGE_SIZE_VAR} must be between 1 and {DEFAULT_SERVICE_MAX_PAGE_SIZE}, got {size}"
            );
            config.max_page_size = size;
        }

        if let Some(value) = get(DEFAULT_MAX_ITEMS_VAR) {
            let max_items = value
                .trim()
                .parse()
                .with_context(|| format!("{DEFAULT_MAX_ITEMS_VAR} is not a number: {value}"))?;
            config.default_max_items = Some(max_items);
        }

        if let Some(value) = get(STRICT_LIMIT_VAR) {
            config.strict_limit = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => anyhow::bail!("{STRICT_LIMIT_VAR} must be a boolean, got {other}"),
            };
        }

        Ok(config)
    }
}
