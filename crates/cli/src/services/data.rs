//! HTTP client for the cart data service.
//!
//! # Endpoints
//!
//! - `GET {base}/cart` - JSON array of cart items, or `null` when the user
//!   has no cart
//! - `DELETE {base}/cart/{id}` - remove one line

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use supermarket_cart::{CartSource, LoadError};
use supermarket_core::{CartItem, CartItemId};
use url::Url;

use crate::config::DataServiceConfig;

/// Cart data service client.
#[derive(Clone)]
pub struct HttpCartSource {
    client: reqwest::Client,
    cart_url: Url,
    token: Option<secrecy::SecretString>,
}

impl HttpCartSource {
    /// Create a new data service client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be extended or the HTTP client
    /// fails to build.
    pub fn new(config: &DataServiceConfig) -> Result<Self, LoadError> {
        let cart_url = cart_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LoadError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            cart_url,
            token: config.token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    fn item_url(&self, id: &CartItemId) -> Result<Url, LoadError> {
        let mut url = self.cart_url.clone();
        url.path_segments_mut()
            .map_err(|()| LoadError::Parse(format!("cannot extend URL {}", self.cart_url)))?
            .push(id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl CartSource for HttpCartSource {
    async fn fetch_cart_items(&self) -> Result<Option<Vec<CartItem>>, LoadError> {
        let response = self
            .authorize(self.client.get(self.cart_url.clone()))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LoadError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        parse_cart(&body)
    }

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), LoadError> {
        let url = self.item_url(id)?;
        let response = self
            .authorize(self.client.delete(url))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        // Already gone counts as deleted.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(LoadError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Resolve the `cart` collection URL under `base`.
fn cart_url(base: &Url) -> Result<Url, LoadError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| LoadError::Parse(format!("cannot extend URL {base}")))?
        .pop_if_empty()
        .push("cart");
    Ok(url)
}

/// Decode a cart response body. An empty body or `null` means no cart.
fn parse_cart(body: &[u8]) -> Result<Option<Vec<CartItem>>, LoadError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map_err(|e| LoadError::Parse(e.to_string()))
}

#[allow(clippy::needless_pass_by_value)] // used as a `map_err` adapter
fn transport(e: reqwest::Error) -> LoadError {
    LoadError::Transport(e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use supermarket_core::Price;

    use super::*;

    #[test]
    fn test_cart_url_with_and_without_trailing_slash() {
        for base in ["https://data.example.com/api", "https://data.example.com/api/"] {
            let url = cart_url(&Url::parse(base).unwrap()).unwrap();
            assert_eq!(url.as_str(), "https://data.example.com/api/cart");
        }
    }

    #[test]
    fn test_item_url_escapes_id() {
        let source = HttpCartSource::new(&DataServiceConfig {
            base_url: Url::parse("https://data.example.com/").unwrap(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let url = source.item_url(&CartItemId::new("a b/c")).unwrap();
        assert_eq!(url.as_str(), "https://data.example.com/cart/a%20b%2Fc");
    }

    #[test]
    fn test_parse_cart_items() {
        let body = br#"[{"id":"1","productId":"p1","productTitle":"Milk","productPrice":2.5}]"#;
        let items = parse_cart(body).unwrap().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_price, Price::from_cents(250).unwrap());
    }

    #[test]
    fn test_parse_cart_null_and_empty_body() {
        assert_eq!(parse_cart(b"null").unwrap(), None);
        assert_eq!(parse_cart(b"  \n").unwrap(), None);
        assert_eq!(parse_cart(b"[]").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_parse_cart_rejects_garbage() {
        assert!(matches!(parse_cart(b"{oops"), Err(LoadError::Parse(_))));
    }
}
