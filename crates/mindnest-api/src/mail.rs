use std::sync::{Arc, Mutex};

use anyhow::Result;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Where account e-mails go.
#[derive(Clone)]
pub enum Mailer {
    /// STARTTLS relay with login credentials.
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    /// Writes mails to the log instead of sending them.
    Log,
    /// Keeps every mail in memory.
    Memory(Arc<Mutex<Vec<OutgoingMail>>>),
}

impl Mailer {
    pub fn smtp(host: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Mailer::Smtp {
            transport,
            from: from.parse()?,
        })
    }

    pub fn memory() -> Self {
        Mailer::Memory(Arc::new(Mutex::new(Vec::new())))
    }

    pub async fn send(&self, mail: OutgoingMail) -> Result<()> {
        match self {
            Mailer::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(mail.to.parse()?)
                    .subject(mail.subject)
                    .header(ContentType::TEXT_PLAIN)
                    .body(mail.body)?;
                transport.send(message).await?;
                info!("Mail sent to {}", mail.to);
            }
            Mailer::Log => {
                info!(to = %mail.to, subject = %mail.subject, "Mail not sent (no SMTP configured):\n{}", mail.body);
            }
            Mailer::Memory(outbox) => {
                outbox
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Outbox lock poisoned: {}", e))?
                    .push(mail);
            }
        }
        Ok(())
    }

    /// Mails captured by the memory backend, oldest first. Empty for the
    /// other backends.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        match self {
            Mailer::Memory(outbox) => outbox.lock().map(|mails| mails.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

pub fn otp_mail(to: &str, otp: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Your MindNest verification code".to_string(),
        body: format!(
            "Your verification code is {otp}.\n\nIt expires in 15 minutes. If you did not sign up for MindNest, ignore this e-mail."
        ),
    }
}

pub fn reset_mail(to: &str, link: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Reset your MindNest password".to_string(),
        body: format!(
            "Use the link below to choose a new password:\n\n{link}\n\nThe link expires in 15 minutes and works once."
        ),
    }
}
