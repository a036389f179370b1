pub mod domain;
pub mod ingest;
pub mod mail;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod time;

pub mod config {
    use crate::mail::{MailCredentials, MailProvider, MailSecurity, MailServer};
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    const DEFAULT_TICKERS: &[&str] = &["GOOGL", "AAPL", "MSFT", "AMZN", "FMC", "TSLA"];
    const DEFAULT_DAYS: u32 = 10;
    const DEFAULT_REPORTS_DIR: &str = "reports";
    const DEFAULT_DATA_PROVIDER_BASE_URL: &str = "https://query2.finance.yahoo.com";
    const DEFAULT_DATA_PROVIDER_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_SCHEDULE_INTERVAL_DAYS: u64 = 1;
    const DEFAULT_SCHEDULE_POLL_SECS: u64 = 60;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub tickers: Vec<String>,
        pub days: u32,
        pub reports_dir: PathBuf,
        pub data_provider_base_url: String,
        pub data_provider_timeout: Duration,
        pub schedule_interval: Duration,
        pub schedule_poll: Duration,
        pub sentry_dsn: Option<String>,
        pub mail: MailSettings,
    }

    /// Mail provider selection plus whatever credentials were present at startup.
    #[derive(Clone)]
    pub struct MailSettings {
        pub provider: MailProvider,
        pub smtp_host: Option<String>,
        pub smtp_port: Option<u16>,
        pub smtp_security: Option<MailSecurity>,
        pub sender: Option<String>,
        pub password: Option<String>,
        pub receiver: Option<String>,
    }

    impl std::fmt::Debug for MailSettings {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MailSettings")
                .field("provider", &self.provider)
                .field("smtp_host", &self.smtp_host)
                .field("smtp_port", &self.smtp_port)
                .field("smtp_security", &self.smtp_security)
                .field("sender", &self.sender)
                .field("password", &self.password.as_ref().map(|_| "<redacted>"))
                .field("receiver", &self.receiver)
                .finish()
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            let tickers = match var("REPORT_TICKERS") {
                Some(s) => parse_tickers(&s),
                None => DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            };
            anyhow::ensure!(!tickers.is_empty(), "REPORT_TICKERS must name at least one ticker");

            let days = var("REPORT_DAYS")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|d| *d >= 1)
                .unwrap_or(DEFAULT_DAYS);

            let timeout_secs = var("DATA_PROVIDER_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_DATA_PROVIDER_TIMEOUT_SECS);

            let interval_days = var("SCHEDULE_INTERVAL_DAYS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|d| *d >= 1)
                .unwrap_or(DEFAULT_SCHEDULE_INTERVAL_DAYS);

            let poll_secs = var("SCHEDULE_POLL_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|s| *s >= 1)
                .unwrap_or(DEFAULT_SCHEDULE_POLL_SECS);

            let provider = match var("MAIL_PROVIDER") {
                Some(s) => s.parse::<MailProvider>()?,
                None => MailProvider::Gmail,
            };

            let smtp_security = var("SMTP_SECURITY")
                .map(|s| s.parse::<MailSecurity>())
                .transpose()?;
            let smtp_port = var("SMTP_PORT")
                .map(|s| s.trim().parse::<u16>().context("SMTP_PORT must be a port number"))
                .transpose()?;

            // Generic names win; provider-specific names are the fallback.
            let (sender_key, password_key) = provider.credential_env_keys();
            let sender = var("EMAIL_USER").or_else(|| sender_key.and_then(|k| var(k)));
            let password = var("EMAIL_PASS").or_else(|| password_key.and_then(|k| var(k)));

            Ok(Self {
                tickers,
                days,
                reports_dir: var("REPORTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR)),
                data_provider_base_url: var("DATA_PROVIDER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATA_PROVIDER_BASE_URL.to_string()),
                data_provider_timeout: Duration::from_secs(timeout_secs),
                schedule_interval: Duration::from_secs(interval_days * 24 * 3600),
                schedule_poll: Duration::from_secs(poll_secs),
                sentry_dsn: var("SENTRY_DSN"),
                mail: MailSettings {
                    provider,
                    smtp_host: var("SMTP_HOST"),
                    smtp_port,
                    smtp_security,
                    sender,
                    password,
                    receiver: var("EMAIL_RECEIVER"),
                },
            })
        }
    }

    impl MailSettings {
        pub fn server(&self) -> anyhow::Result<MailServer> {
            match self.provider {
                MailProvider::Custom => {
                    let host = self
                        .smtp_host
                        .clone()
                        .context("SMTP_HOST is required for MAIL_PROVIDER=custom")?;
                    let security = self.smtp_security.unwrap_or(MailSecurity::StartTls);
                    Ok(MailServer {
                        host,
                        port: self.smtp_port.unwrap_or(security.default_port()),
                        security,
                    })
                }
                known => known.server(),
            }
        }

        pub fn require_credentials(&self) -> anyhow::Result<MailCredentials> {
            let sender = self
                .sender
                .clone()
                .context("EMAIL_USER (or the provider-specific sender address) is required")?;
            let password = self
                .password
                .clone()
                .context("EMAIL_PASS (or the provider-specific password) is required")?;
            let receiver = self.receiver.clone().unwrap_or_else(|| sender.clone());

            Ok(MailCredentials {
                sender,
                password,
                receiver,
            })
        }
    }

    pub fn parse_tickers(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

}
