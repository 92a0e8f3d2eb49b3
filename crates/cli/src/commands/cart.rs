//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart and the checkout total
//! supermarket cart show
//!
//! # Remove lines by id
//! supermarket cart remove 5d1f 8c2a
//!
//! # Email a checkout summary to the signed-in user
//! supermarket cart checkout --name "Ada Lovelace" --email ada@example.com
//! ```

use std::sync::Arc;

use supermarket_cart::{CartEvent, CartSession, CheckoutNotifier};
use supermarket_core::{CartItem, CartItemId, Email, ViewState};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::CliConfig;
use crate::error::CliError;
use crate::services::{HttpCartSource, SmtpCheckoutMailer};

/// A loaded cart session plus its event stream.
struct LoadedCart {
    session: CartSession,
    events: UnboundedReceiver<CartEvent>,
    load_failed: bool,
}

impl LoadedCart {
    /// Open a session and wait for the load.
    ///
    /// Without a `notifier` the session can load and delete but not check out.
    async fn open(config: &CliConfig, notifier: Option<CheckoutNotifier>) -> Result<Self, CliError> {
        let source = Arc::new(HttpCartSource::new(&config.data)?);
        let (mut session, mut events) = match notifier {
            Some(notifier) => CartSession::new(source, notifier),
            None => CartSession::without_checkout(source),
        };
        session.request_load()?;
        session.settle().await;

        let load_failed = drain(&mut events).contains(&CartEvent::LoadFailureNotice);
        Ok(Self {
            session,
            events,
            load_failed,
        })
    }

    /// Wait for background work, then close the session.
    async fn close(mut self) -> Vec<CartEvent> {
        self.session.settle().await;
        self.session.teardown();
        drain(&mut self.events)
    }
}

/// Print the cart.
pub async fn show(config: &CliConfig) -> Result<(), CliError> {
    let cart = LoadedCart::open(config, None).await?;
    if cart.load_failed {
        tracing::warn!("Could not load products");
    }
    print(&render(cart.session.store().items(), cart.session.view_state()));
    cart.close().await;
    Ok(())
}

/// Remove the given lines and print the resulting cart.
pub async fn remove(config: &CliConfig, ids: &[String]) -> Result<(), CliError> {
    let mut cart = LoadedCart::open(config, None).await?;
    if cart.load_failed {
        return Err(CliError::LoadFailed);
    }

    for id in ids {
        let id = CartItemId::new(id.as_str());
        if !cart.session.store().items().iter().any(|item| item.id == id) {
            tracing::warn!(%id, "Item not in cart");
        }
        cart.session.request_delete(&id)?;
    }

    print(&render(cart.session.store().items(), cart.session.view_state()));
    cart.close().await;
    Ok(())
}

/// Send the checkout email for the current cart.
pub async fn checkout(
    config: &CliConfig,
    name: Option<String>,
    email: Option<String>,
) -> Result<(), CliError> {
    let user_name = name
        .or_else(|| config.user_name.clone())
        .ok_or(CliError::MissingUser("name"))?;
    let user_email = match email {
        Some(email) => Email::parse(&email)?,
        None => config
            .user_email
            .clone()
            .ok_or(CliError::MissingUser("email"))?,
    };

    let email_config = config.email.as_ref().ok_or(CliError::EmailNotConfigured)?;
    let mailer = Arc::new(SmtpCheckoutMailer::new(email_config)?);
    let notifier = CheckoutNotifier::new(mailer, email_config.sender());

    let mut cart = LoadedCart::open(config, Some(notifier)).await?;
    if cart.load_failed {
        return Err(CliError::LoadFailed);
    }

    let total = cart.session.store().total();
    cart.session.request_checkout(&user_name, user_email.clone())?;
    let events = cart.close().await;

    if events.contains(&CartEvent::CheckoutFailureNotice) {
        return Err(CliError::CheckoutFailed);
    }
    tracing::info!(to = %user_email, %total, "Checkout complete");
    Ok(())
}

fn drain(events: &mut UnboundedReceiver<CartEvent>) -> Vec<CartEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

/// Format the cart as the app's cart screen would show it.
fn render(items: &[CartItem], view_state: ViewState) -> String {
    let mut lines = match view_state {
        ViewState::Loading => vec!["Loading...".to_string()],
        ViewState::Empty => vec!["Your cart is empty".to_string()],
        ViewState::Populated { .. } => items.iter().map(render_item).collect(),
    };
    if let Some(label) = view_state.button_label() {
        lines.push(format!("[{label}]"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_item(item: &CartItem) -> String {
    let title = if item.product_title.is_empty() {
        item.product_id.as_str()
    } else {
        item.product_title.as_str()
    };
    format!(
        "{:<12} {:<32} {:>10}",
        item.id.as_str(),
        title,
        item.product_price.display()
    )
}

#[allow(clippy::print_stdout)]
fn print(output: &str) {
    print!("{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supermarket_core::Price;

    use super::*;

    #[test]
    fn test_render_populated() {
        let items = [
            CartItem::new("1", "p1", Price::from_cents(250).unwrap()).with_title("Milk"),
            CartItem::new("2", "p2", Price::from_cents(300).unwrap()),
        ];
        let out = render(
            &items,
            ViewState::Populated {
                total: Price::from_cents(550).unwrap(),
            },
        );
        assert!(out.contains("Milk"));
        assert!(out.contains("p2"));
        assert!(out.ends_with("[Checkout: 5.50]\n"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_render_loading() {
        assert_eq!(render(&[], ViewState::Loading), "Loading...\n");
    }

    #[test]
    fn test_render_empty() {
        let out = render(&[], ViewState::Empty);
        assert_eq!(out, "Your cart is empty\n[Start shopping]\n");
    }
}
