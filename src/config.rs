use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeApiConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// EmailJS credentials. When absent, emails are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub strict: bool,
    pub page_size: usize,
    pub fetch_size: usize,
    pub denylist_path: Option<PathBuf>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strict: true,
            page_size: 10,
            fetch_size: 50,
            denylist_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub recipes: RecipeApiConfig,
    pub llm: LlmConfig,
    pub email: Option<EmailConfig>,
    pub filter: FilterConfig,
    pub cron_secret: Option<String>,
    pub email_sweep_interval_secs: Option<u64>,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Accepts `1/0`, `true/false`, `yes/no`, `on/off`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: var_or("JWT_ISSUER", "cravings"),
            audience: var_or("JWT_AUDIENCE", "cravings-users"),
            ttl_minutes: parsed_var("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parsed_var("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let recipes = RecipeApiConfig {
            base_url: var_or("SPOONACULAR_BASE_URL", "https://api.spoonacular.com/recipes"),
            api_key: std::env::var("SPOONACULAR_API_KEY").unwrap_or_default(),
        };
        let llm = LlmConfig {
            base_url: var_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: var_or("OPENAI_MODEL", "gpt-4"),
        };
        let email = match (
            non_empty_var("EMAILJS_SERVICE_ID"),
            non_empty_var("EMAILJS_TEMPLATE_ID"),
            non_empty_var("EMAILJS_PUBLIC_KEY"),
            non_empty_var("EMAILJS_PRIVATE_KEY"),
        ) {
            (Some(service_id), Some(template_id), Some(public_key), Some(private_key)) => {
                Some(EmailConfig {
                    service_id,
                    template_id,
                    public_key,
                    private_key,
                })
            }
            _ => None,
        };
        let defaults = FilterConfig::default();
        let filter = FilterConfig {
            strict: std::env::var("DIETARY_FILTER_STRICT")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.strict),
            page_size: parsed_var("RECIPE_PAGE_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.page_size),
            fetch_size: parsed_var("RECIPE_FETCH_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.fetch_size),
            denylist_path: non_empty_var("DIETARY_DENYLIST_PATH").map(PathBuf::from),
        };

        Ok(Self {
            database_url,
            jwt,
            recipes,
            llm,
            email,
            filter,
            cron_secret: non_empty_var("CRON_SECRET"),
            email_sweep_interval_secs: parsed_var("EMAIL_SWEEP_INTERVAL_SECS").filter(|n| *n > 0),
        })
    }
}
