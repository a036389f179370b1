use crate::config::MailSettings;
use crate::mail::{MailCredentials, MailSecurity, MailServer};
use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use std::time::Duration;

pub const SUBJECT: &str = "Daily Stock Market Report";
pub const BODY: &str = "Attached is the latest stock market report.";
const SMTP_TIMEOUT_SECS: u64 = 30;

#[async_trait::async_trait]
pub trait ReportSender: Send + Sync {
    /// Delivers the report at `path` to the configured recipient.
    async fn send(&self, path: &Path) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpReportSender {
    settings: MailSettings,
}

impl SmtpReportSender {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }

    fn transport(
        server: &MailServer,
        creds: &MailCredentials,
    ) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = match server.security {
            MailSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&server.host)
                .with_context(|| format!("failed to configure TLS for {}", server.host))?,
            MailSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server.host)
                    .with_context(|| format!("failed to configure STARTTLS for {}", server.host))?
            }
            MailSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server.host),
        };

        Ok(builder
            .port(server.port)
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT_SECS)))
            .credentials(Credentials::new(
                creds.sender.clone(),
                creds.password.clone(),
            ))
            .build())
    }
}

#[async_trait::async_trait]
impl ReportSender for SmtpReportSender {
    async fn send(&self, path: &Path) -> anyhow::Result<()> {
        let creds = self.settings.require_credentials()?;
        let server = self.settings.server()?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("report file {} is not readable", path.display()))?;
        let message = build_message(&creds, path, bytes)?;

        let transport = Self::transport(&server, &creds)?;
        let response = transport.send(message).await.with_context(|| {
            format!(
                "SMTP submission to {}:{} failed",
                server.host, server.port
            )
        })?;

        tracing::info!(
            host = %server.host,
            port = server.port,
            receiver = %creds.receiver,
            code = %response.code(),
            "report email sent"
        );
        Ok(())
    }
}

/// One multipart message: a plain-text body plus the report as a PDF attachment named after
/// the file's basename.
pub fn build_message(
    creds: &MailCredentials,
    path: &Path,
    pdf_bytes: Vec<u8>,
) -> anyhow::Result<Message> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("report path {} has no file name", path.display()))?;

    let pdf = ContentType::parse("application/pdf").context("invalid pdf content type")?;
    let attachment = Attachment::new(filename).body(pdf_bytes, pdf);

    Message::builder()
        .from(
            creds
                .sender
                .parse()
                .with_context(|| format!("invalid sender address {:?}", creds.sender))?,
        )
        .to(creds
            .receiver
            .parse()
            .with_context(|| format!("invalid receiver address {:?}", creds.receiver))?)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(attachment),
        )
        .context("failed to build report email")
}
