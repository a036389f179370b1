pub mod sender;

pub use sender::{build_message, ReportSender, SmtpReportSender};

use std::fmt;
use std::str::FromStr;

/// How the SMTP session is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailSecurity {
    /// Submission over TLS from the first byte (port 465).
    ImplicitTls,
    /// Plain connect, then a mandatory STARTTLS upgrade (port 587).
    StartTls,
    /// No encryption. Only meant for a local relay.
    None,
}

impl MailSecurity {
    pub fn default_port(self) -> u16 {
        match self {
            MailSecurity::ImplicitTls => 465,
            MailSecurity::StartTls => 587,
            MailSecurity::None => 25,
        }
    }
}

impl FromStr for MailSecurity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" | "ssl" | "implicit" => Ok(MailSecurity::ImplicitTls),
            "starttls" => Ok(MailSecurity::StartTls),
            "none" | "plain" => Ok(MailSecurity::None),
            other => anyhow::bail!("unknown SMTP_SECURITY {other:?} (expected tls, starttls or none)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Gmail,
    GmailStartTls,
    ProtonMail,
    Custom,
}

impl MailProvider {
    /// Provider-specific sender/password variable names used when the generic ones are unset.
    pub fn credential_env_keys(self) -> (Option<&'static str>, Option<&'static str>) {
        match self {
            MailProvider::Gmail | MailProvider::GmailStartTls => {
                (Some("GMAIL_EMAIL"), Some("GMAIL_PASSWORD"))
            }
            MailProvider::ProtonMail => (Some("PROTONMAIL_EMAIL"), Some("PROTONMAIL_PASSWORD")),
            MailProvider::Custom => (None, None),
        }
    }

    pub fn server(self) -> anyhow::Result<MailServer> {
        let (host, security) = match self {
            MailProvider::Gmail => ("smtp.gmail.com", MailSecurity::ImplicitTls),
            MailProvider::GmailStartTls => ("smtp.gmail.com", MailSecurity::StartTls),
            MailProvider::ProtonMail => ("mail.protonmail.ch", MailSecurity::StartTls),
            MailProvider::Custom => anyhow::bail!("custom mail provider has no fixed server"),
        };
        Ok(MailServer {
            host: host.to_string(),
            port: security.default_port(),
            security,
        })
    }
}

impl FromStr for MailProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" => Ok(MailProvider::Gmail),
            "gmail-starttls" => Ok(MailProvider::GmailStartTls),
            "protonmail" | "proton" => Ok(MailProvider::ProtonMail),
            "custom" => Ok(MailProvider::Custom),
            other => anyhow::bail!(
                "unknown MAIL_PROVIDER {other:?} (expected gmail, gmail-starttls, protonmail or custom)"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailServer {
    pub host: String,
    pub port: u16,
    pub security: MailSecurity,
}

#[derive(Clone)]
pub struct MailCredentials {
    pub sender: String,
    pub password: String,
    pub receiver: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("receiver", &self.receiver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_map_to_fixed_submission_endpoints() {
        let gmail = MailProvider::Gmail.server().unwrap();
        assert_eq!((gmail.host.as_str(), gmail.port), ("smtp.gmail.com", 465));
        assert_eq!(gmail.security, MailSecurity::ImplicitTls);

        let proton = MailProvider::ProtonMail.server().unwrap();
        assert_eq!((proton.host.as_str(), proton.port), ("mail.protonmail.ch", 587));
        assert_eq!(proton.security, MailSecurity::StartTls);

        assert!(MailProvider::Custom.server().is_err());
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("ProtonMail".parse::<MailProvider>().unwrap(), MailProvider::ProtonMail);
        assert_eq!("gmail-starttls".parse::<MailProvider>().unwrap(), MailProvider::GmailStartTls);
        assert!("yahoo".parse::<MailProvider>().is_err());
        assert_eq!("STARTTLS".parse::<MailSecurity>().unwrap(), MailSecurity::StartTls);
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = MailCredentials {
            sender: "a@example.com".into(),
            password: "hunter2".into(),
            receiver: "b@example.com".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
