//! Integration test harness for the checkout storefront.
//!
//! [`TestContext`] starts the real router on an ephemeral port, pointed at a
//! `wiremock` server standing in for the backend coupon API, and hands out a
//! `reqwest` client with a cookie store so the session carries across
//! requests.
//!
//! ```rust,ignore
//! let ctx = TestContext::start().await;
//! let page = ctx.get("/checkout").await.text().await.unwrap();
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use checkout_core::DecrementPolicy;
use checkout_storefront::config::{ApiConfig, CheckoutConfig};
use checkout_storefront::state::AppState;
use reqwest::{Client, Response};
use url::Url;
use wiremock::MockServer;

/// Outbound request timeout used by the harness.
const TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A running checkout host plus its mocked backend.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub backend: MockServer,
}

impl TestContext {
    /// Start with the default (`ignore`) decrement policy.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start() -> Self {
        Self::start_with(DecrementPolicy::Ignore, None).await
    }

    /// Start with a decrement policy and, optionally, a backend URL that
    /// overrides the mock server (e.g. an unreachable one).
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start_with(policy: DecrementPolicy, api_base_url: Option<Url>) -> Self {
        let backend = MockServer::start().await;
        let api_base_url = api_base_url.unwrap_or_else(|| {
            Url::parse(&format!("{}/", backend.uri())).expect("mock server URI is a valid URL")
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener has a local address");
        let base_url = format!("http://{addr}");

        let config = CheckoutConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            store_name: "Test Store".to_string(),
            api: ApiConfig {
                base_url: api_base_url,
                request_timeout: TEST_REQUEST_TIMEOUT,
            },
            decrement_policy: policy,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config).expect("build application state");
        let app = checkout_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("build reqwest client");

        Self {
            client,
            base_url,
            backend,
        }
    }

    /// Absolute URL for a path on the checkout host.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// POST a form to a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Load the checkout page (starting the session) and return the coupon
    /// form id rendered in it.
    ///
    /// # Panics
    ///
    /// Panics if the page has no coupon form.
    pub async fn open_checkout(&self) -> String {
        let html = self.get("/checkout").await.text().await.expect("page body");
        form_id(&html).expect("checkout page renders a coupon form id")
    }

    /// Add a product line.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn add_product(&self, id: &str, name: &str, price: &str, quantity: u32) -> Response {
        let quantity = quantity.to_string();
        self.post(
            "/checkout/cart/add",
            &[
                ("product_id", id),
                ("name", name),
                ("price", price),
                ("quantity", &quantity),
            ],
        )
        .await
    }
}

/// The coupon form id in a rendered page or fragment.
#[must_use]
pub fn form_id(html: &str) -> Option<String> {
    attribute_values(html, "name=\"form_id\" value=\"").into_iter().next()
}

/// Radio values of a rendered address selector, in order.
#[must_use]
pub fn address_ids(html: &str) -> Vec<String> {
    attribute_values(html, "name=\"address_id\" value=\"")
}

/// Every value following `prefix` up to the closing quote.
fn attribute_values(html: &str, prefix: &str) -> Vec<String> {
    html.split(prefix)
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

/// Value of the `HX-Trigger` header, if any.
#[must_use]
pub fn hx_trigger(response: &Response) -> Option<String> {
    response
        .headers()
        .get("hx-trigger")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
