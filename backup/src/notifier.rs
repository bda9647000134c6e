use crate::config::{Config, MailConfig};
use crate::run_log::RunLog;
use anyhow::{anyhow, Result};

/// A finished run log on its way to the administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
}

/// Outbound mail transport.
pub trait Mailer {
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// SMTP over implicit TLS. The password is read from the environment, never
/// from the configuration file.
pub struct SmtpMailer {
    server: String,
    port: u16,
    username: String,
    password: Option<String>,
}

impl SmtpMailer {
    pub fn from_env(mail: &MailConfig) -> Self {
        Self {
            server: mail.smtp_server.clone(),
            port: mail.port,
            username: mail.login().to_string(),
            password: std::env::var(common::SMTP_PASSWORD_ENV).ok(),
        }
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, notification: &Notification) -> Result<()> {
        use lettre::message::header::ContentType;
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{Message, SmtpTransport, Transport};

        let password = self
            .password
            .clone()
            .ok_or_else(|| anyhow!("SMTP password not set, export {}", common::SMTP_PASSWORD_ENV))?;

        let email = Message::builder()
            .from(notification.from.parse()?)
            .to(notification.to.parse()?)
            .subject(&notification.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())?;

        let creds = Credentials::new(self.username.clone(), password);
        let mailer = SmtpTransport::relay(&self.server)?
            .port(self.port)
            .credentials(creds)
            .build();

        mailer.send(&email)?;
        log::info!("Run log mailed to {} via {}:{}", notification.to, self.server, self.port);
        Ok(())
    }
}

pub struct Notifier<'a> {
    administrator: &'a str,
    mail: &'a MailConfig,
}

impl<'a> Notifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            administrator: &config.administrator,
            mail: &config.mail,
        }
    }

    pub fn compose(&self, body: String) -> Notification {
        Notification {
            subject: format!("ATT: {} - Backup Log", self.administrator),
            from: self.mail.sender.clone(),
            to: self.mail.receiver.clone(),
            body,
        }
    }

    /// Mail the run log as it stands. Any failure is appended to the log
    /// (which by then has already been sent, or could not be) and reported
    /// as `false`.
    pub fn notify(&self, log: &mut RunLog, mailer: &dyn Mailer) -> bool {
        let result = log
            .read_back()
            .map_err(anyhow::Error::from)
            .and_then(|body| mailer.send(&self.compose(body)));

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to mail run log {}: {:#}", log.path().display(), e);
                log.error(&format!("An error has occurred when trying to send email: - {:#}", e));
                false
            }
        }
    }
}
