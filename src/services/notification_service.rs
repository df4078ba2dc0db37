use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::SmtpSettings;
use crate::models::BookingNotice;
use crate::utils::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;
}

/// Delivers mail through an SMTP relay (STARTTLS)
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| AppError::Internal(format!("Invalid SMTP relay: {}", e)))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| AppError::InvalidRequest(format!("Invalid recipient: {}", e)))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

/// Used when no SMTP relay is configured; the notification is only logged
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        log::info!("📭 SMTP not configured, dropping email to {}: {}", email.to, email.subject);
        Ok(())
    }
}

/// Fire-and-forget delivery of patient notifications
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub fn from_settings(smtp: Option<&SmtpSettings>) -> Result<Self, AppError> {
        let mailer: Arc<dyn Mailer> = match smtp {
            Some(settings) => {
                log::info!("📧 SMTP relay: {}:{}", settings.host, settings.port);
                Arc::new(SmtpMailer::new(settings)?)
            }
            None => {
                log::warn!("⚠️  SMTP_HOST not set, report emails will only be logged");
                Arc::new(LogMailer)
            }
        };
        Ok(Self::new(mailer))
    }

    /// Spawns the "report delivered" email. Returns `None` when the booking
    /// has no patient email to write to; the caller never awaits the send.
    pub fn report_delivered(&self, notice: &BookingNotice) -> Option<tokio::task::JoinHandle<()>> {
        let email = match report_delivered_email(notice) {
            Some(email) => email,
            None => {
                log::warn!("⚠️  Report delivered but booking has no patient email, skipping notification");
                return None;
            }
        };

        let mailer = self.mailer.clone();
        Some(tokio::spawn(async move {
            let to = email.to.clone();
            match mailer.send(email).await {
                Ok(()) => log::info!("📧 Report notification sent to {}", to),
                Err(e) => log::error!("❌ Failed to send report notification to {}: {}", to, e),
            }
        }))
    }
}

pub fn report_delivered_email(notice: &BookingNotice) -> Option<OutgoingEmail> {
    let to = notice
        .patient_info
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())?
        .to_string();

    let name = notice
        .patient_info
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("there");
    let test = notice.test_name.as_deref().unwrap_or("your diagnostic test");

    let mut body = format!(
        "Hello {},\n\nThe report for {} is ready and has been delivered to your account.\n",
        name, test
    );
    if let Some(link) = &notice.report_link {
        body.push_str(&format!("\nYou can view it here: {}\n", link));
    }
    body.push_str("\nThank you for choosing our diagnostic center.\n");

    Some(OutgoingEmail {
        to,
        subject: "Your test report is ready".to_string(),
        body,
    })
}
