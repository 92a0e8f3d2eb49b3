//! Checkout email delivery.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use supermarket_cart::{CheckoutMailer, CheckoutMessage, NotifyError};
use supermarket_core::{CartItem, Email};

use crate::config::EmailConfig;

/// HTML template for the checkout email.
#[derive(Template)]
#[template(path = "email/checkout.html")]
struct CheckoutEmailHtml<'a> {
    user_name: &'a str,
    store_name: &'a str,
    items: &'a [CartItem],
    total: String,
}

/// Plain text template for the checkout email.
#[derive(Template)]
#[template(path = "email/checkout.txt")]
struct CheckoutEmailText<'a> {
    user_name: &'a str,
    store_name: &'a str,
    items: &'a [CartItem],
    total: String,
}

/// Sends checkout emails over SMTP.
#[derive(Clone)]
pub struct SmtpCheckoutMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpCheckoutMailer {
    /// Create a new mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer })
    }
}

#[async_trait]
impl CheckoutMailer for SmtpCheckoutMailer {
    async fn send_checkout_email(&self, message: &CheckoutMessage) -> Result<(), NotifyError> {
        let email = build_message(message)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(to = %message.user_email, subject = %message.subject(), "Email sent successfully");
        Ok(())
    }
}

/// Render the plain text and HTML bodies.
fn render_bodies(message: &CheckoutMessage) -> Result<(String, String), NotifyError> {
    let items = message.items.items();
    let total = message.total.display();
    let store_name = message.sender.name.as_str();
    let user_name = message.user_name.as_str();

    let text = CheckoutEmailText {
        user_name,
        store_name,
        items,
        total: total.clone(),
    }
    .render()
    .map_err(|e| NotifyError::Template(e.to_string()))?;
    let html = CheckoutEmailHtml {
        user_name,
        store_name,
        items,
        total,
    }
    .render()
    .map_err(|e| NotifyError::Template(e.to_string()))?;

    Ok((text, html))
}

/// Build a multipart email with both plain text and HTML versions.
fn build_message(message: &CheckoutMessage) -> Result<Message, NotifyError> {
    let (text_body, html_body) = render_bodies(message)?;

    Message::builder()
        .from(mailbox(Some(&message.sender.name), &message.sender.address)?)
        .to(mailbox(Some(&message.user_name), &message.user_email)?)
        .subject(message.subject())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body),
                ),
        )
        .map_err(|e| NotifyError::Transport(e.to_string()))
}

fn mailbox(name: Option<&str>, email: &Email) -> Result<Mailbox, NotifyError> {
    let address = email
        .as_str()
        .parse()
        .map_err(|_| NotifyError::InvalidAddress(email.to_string()))?;
    let name = name.filter(|n| !n.trim().is_empty()).map(str::to_owned);
    Ok(Mailbox::new(name, address))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supermarket_cart::SenderIdentity;
    use supermarket_core::{CartSnapshot, Price};

    use super::*;

    fn message() -> CheckoutMessage {
        let items = CartSnapshot::from(vec![
            CartItem::new("1", "p1", Price::from_cents(250).unwrap()).with_title("Milk"),
            CartItem::new("2", "p2", Price::from_cents(300).unwrap()).with_title("Bread & Butter"),
        ]);
        CheckoutMessage {
            user_name: "Ada".to_string(),
            user_email: Email::parse("ada@example.com").unwrap(),
            sender: SenderIdentity {
                name: "Supermarket".to_string(),
                address: Email::parse("orders@supermarket.example").unwrap(),
            },
            total: items.total(),
            items,
        }
    }

    #[test]
    fn test_render_text_lists_items_and_total() {
        let (text, _) = render_bodies(&message()).unwrap();
        assert!(text.contains("Hi Ada"));
        assert!(text.contains("Milk"));
        assert!(text.contains("2.50"));
        assert!(text.contains("Total: 5.50"));
    }

    #[test]
    fn test_render_html_escapes_titles() {
        let (_, html) = render_bodies(&message()).unwrap();
        assert!(html.contains("Bread &#38; Butter") || html.contains("Bread &amp; Butter"));
        assert!(html.contains("5.50"));
    }

    #[test]
    fn test_build_message_headers() {
        let email = build_message(&message()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Subject: Supermarket - your order (2 items)"));
        assert!(raw.contains("ada@example.com"));
        assert!(raw.contains("orders@supermarket.example"));
    }

    #[test]
    fn test_mailbox_without_name() {
        let mailbox = mailbox(Some("  "), &Email::parse("a@b.c").unwrap()).unwrap();
        assert!(mailbox.name.is_none());
    }
}
