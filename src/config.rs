use std::env;

const DEFAULT_ORIGINS: &str = "http://localhost:5173,https://diagnostic-management-312cf.web.app";

/// SMTP relay used for report notifications
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub payment_currency: String,
    pub smtp: Option<SmtpSettings>,
    pub allowed_origins: Vec<String>,
    pub booking_status_requires_admin: bool,
}

impl Settings {
    /// Reads settings from the process environment (call `dotenv()` first)
    pub fn from_env() -> Result<Self, String> {
        let database_url = required("DATABASE_URL")?;
        let token_secret = required("ACCESS_TOKEN")?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("PORT must be a port number: {}", e))?;

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            log::warn!("⚠️  STRIPE_SECRET_KEY not set, payment intents will be rejected by Stripe");
            String::new()
        });

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpSettings {
                host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                from: env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "Diagnostic Center <no-reply@diagnostic.local>".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "diagnosticDB".to_string()),
            token_secret,
            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            stripe_secret_key,
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            payment_currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            smtp,
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string()),
            ),
            booking_status_requires_admin: parse_flag(
                &env::var("BOOKING_STATUS_REQUIRES_ADMIN").unwrap_or_default(),
            ),
        })
    }
}

fn required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{} must be set", key))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_split() {
        let origins = parse_origins(" http://localhost:5173/ , https://example.web.app,,");
        assert_eq!(
            origins,
            vec!["http://localhost:5173".to_string(), "https://example.web.app".to_string()]
        );
    }

    #[test]
    fn flags_accept_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("false"));
    }
}
