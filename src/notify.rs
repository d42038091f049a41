//! Change notifications.
//!
//! [`render_summary`] turns a [`ChangeSet`] into a plain-text report;
//! [`EmailNotifier`] sends that report over SMTP with implicit TLS using the
//! blocking `lettre` transport. A failed delivery is reported to the caller
//! and never touches the baseline, which has already been written.

use crate::diff::ChangeSet;
use crate::error::{Result, SkinportError};
use crate::models::{format_price, DiscountedItem};

/// Something that can be told about the outcome of a search.
pub trait NotificationSink {
    fn deliver(&self, changes: &ChangeSet, currency: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Summary rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub subject: String,
    pub body: String,
}

pub fn render_summary(changes: &ChangeSet, currency: &str) -> Summary {
    let subject = format!(
        "[skinport-deals] {} new, {} still listed",
        changes.new_items.len(),
        changes.repeated_items.len()
    );

    let mut body = String::new();
    push_section(&mut body, "New discounted items", &changes.new_items, currency);
    push_section(&mut body, "Still available", &changes.repeated_items, currency);

    if !changes.price_moves.is_empty() {
        body.push_str(&format!("Price moves ({}):\n", changes.price_moves.len()));
        for mv in &changes.price_moves {
            let fmt = |p: Option<f64>| {
                p.map(|v| format_price(v, currency))
                    .unwrap_or_else(|| "n/a".to_string())
            };
            body.push_str(&format!(
                "  - {}: {} -> {}\n",
                mv.name,
                fmt(mv.previous_min_price),
                fmt(mv.current_min_price)
            ));
        }
    }

    Summary { subject, body }
}

fn push_section(out: &mut String, title: &str, items: &[DiscountedItem], currency: &str) {
    out.push_str(&format!("{title} ({}):\n", items.len()));
    if items.is_empty() {
        out.push_str("  (none)\n");
    }
    for entry in items {
        let item = &entry.item;
        out.push_str(&format!(
            "  - {}: {} (suggested {}, -{:.2}%)\n",
            item.name,
            item.min_price
                .map(|p| format_price(p, currency))
                .unwrap_or_default(),
            item.suggested_price
                .map(|p| format_price(p, currency))
                .unwrap_or_default(),
            entry.discount_percent
        ));
        if let Some(link) = &item.link {
            out.push_str(&format!("    {link}\n"));
        }
    }
    out.push('\n');
}

// ---------------------------------------------------------------------------
// LogNotifier
// ---------------------------------------------------------------------------

/// Writes the summary to the log instead of sending it anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn deliver(&self, changes: &ChangeSet, currency: &str) -> Result<()> {
        let summary = render_summary(changes, currency);
        tracing::info!(subject = %summary.subject, "\n{}", summary.body);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Why an email could not be sent. Surfaces to callers as
/// [`SkinportError::Notify`].
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("cannot reach SMTP server: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("bad mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("cannot assemble message: {0}")]
    Build(String),
}

impl From<EmailError> for SkinportError {
    fn from(e: EmailError) -> Self {
        SkinportError::Notify(e.to_string())
    }
}

const SMTPS_PORT: u16 = 465;
const FALLBACK_SENDER: &str = "skinport-deals@localhost";

/// Where change summaries are mailed and how to log in to the relay.
///
/// The connection always uses implicit TLS, so `smtp_port` should point at an
/// SMTPS listener.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub to_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Read `SMTP_HOST` and `SMTP_TO`, plus the optional `SMTP_PORT`,
    /// `SMTP_FROM`, `SMTP_USER` and `SMTP_PASSWORD`.
    ///
    /// `None` means email is not configured and the caller should fall back
    /// to another sink.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    /// Blank values count as unset; an unparsable port falls back to 465.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Some(Self {
            smtp_host: var("SMTP_HOST")?,
            to_address: var("SMTP_TO")?,
            smtp_port: var("SMTP_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(SMTPS_PORT),
            from_address: var("SMTP_FROM").unwrap_or_else(|| FALLBACK_SENDER.to_string()),
            smtp_user: var("SMTP_USER"),
            smtp_password: var("SMTP_PASSWORD"),
        })
    }
}

/// Emails the change summary. Empty change sets are not sent.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn message(&self, summary: Summary) -> std::result::Result<lettre::Message, EmailError> {
        lettre::Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.config.to_address.parse()?)
            .subject(summary.subject)
            .header(lettre::message::header::ContentType::TEXT_PLAIN)
            .body(summary.body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    fn mailer(&self) -> std::result::Result<lettre::SmtpTransport, EmailError> {
        let relay = lettre::SmtpTransport::relay(&self.config.smtp_host)?.port(self.config.smtp_port);
        Ok(match (&self.config.smtp_user, &self.config.smtp_password) {
            (Some(user), Some(pass)) => relay
                .credentials(lettre::transport::smtp::authentication::Credentials::new(
                    user.clone(),
                    pass.clone(),
                ))
                .build(),
            _ => relay.build(),
        })
    }
}

impl NotificationSink for EmailNotifier {
    fn deliver(&self, changes: &ChangeSet, currency: &str) -> Result<()> {
        if changes.is_empty() {
            tracing::debug!("nothing to report, skipping email");
            return Ok(());
        }
        let message = self.message(render_summary(changes, currency))?;
        lettre::Transport::send(&self.mailer()?, &message).map_err(EmailError::from)?;
        tracing::info!(to = %self.config.to_address, "summary email sent");
        Ok(())
    }
}
