//! End-to-end tests for the coupon form against a mocked backend.

use std::time::Duration;

use checkout_core::DecrementPolicy;
use checkout_integration_tests::{TestContext, hx_trigger};
use serde_json::json;
use url::Url;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Successful validation body for `code`.
fn validated(code: &str, discount: u32, final_amount: u32) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "coupon": { "code": code, "type": "fixed" },
        "discountAmount": discount,
        "finalAmount": final_amount,
    }))
}

/// Open the page with one $200 line and return the coupon form id.
async fn checkout_of_200(ctx: &TestContext) -> String {
    ctx.open_checkout().await;
    ctx.add_product("p1", "Gift Basket", "200.00", 1).await;
    ctx.open_checkout().await
}

async fn submit(ctx: &TestContext, form_id: &str, code: &str) -> reqwest::Response {
    ctx.post(
        "/checkout/coupon/validate",
        &[("form_id", form_id), ("code", code)],
    )
    .await
}

async fn backend_calls(ctx: &TestContext) -> usize {
    ctx.backend
        .received_requests()
        .await
        .map_or(0, |requests| requests.len())
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_save20_is_applied() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .and(body_json(json!({ "code": "SAVE20", "orderAmount": 200.0 })))
        .respond_with(validated("SAVE20", 20, 180))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    let resp = submit(&ctx, &form_id, "save20").await;

    assert_eq!(resp.status(), 200);
    assert_eq!(hx_trigger(&resp).as_deref(), Some("checkout-updated"));
    let html = resp.text().await.unwrap();
    assert!(html.contains("Coupon applied! You saved $20.00"));
    assert!(html.contains("SAVE20"));
    assert!(html.contains("hx-post=\"/checkout/coupon/remove\""));

    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(summary.contains("$200.00"));
    assert!(summary.contains("$180.00"));
}

#[tokio::test]
async fn test_credentials_are_forwarded_without_session_cookie() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .and(header("authorization", "Bearer visitor-token"))
        .respond_with(validated("SAVE10", 10, 190))
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    let resp = ctx
        .client
        .post(ctx.url("/checkout/coupon/validate"))
        .header("authorization", "Bearer visitor-token")
        .form(&[("form_id", form_id.as_str()), ("code", "SAVE10")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("You saved $10.00"));

    let requests = ctx.backend.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let cookie = requests[0]
        .headers
        .get("cookie")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(!cookie.contains("checkout_session"));
}

#[tokio::test]
async fn test_server_error_message_is_displayed() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Coupon expired" })))
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    let resp = submit(&ctx, &form_id, "old10").await;

    assert_eq!(resp.status(), 200);
    assert_eq!(hx_trigger(&resp), None);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Coupon expired"));
    assert!(html.contains("role=\"alert\""));
    assert!(html.contains("value=\"OLD10\""));
}

#[tokio::test]
async fn test_rejection_without_message_uses_fallback() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({})))
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    let html = submit(&ctx, &form_id, "NOPE").await.text().await.unwrap();
    assert!(html.contains("Failed to validate coupon"));
}

#[tokio::test]
async fn test_blank_code_never_reaches_backend() {
    let ctx = TestContext::start().await;
    let form_id = checkout_of_200(&ctx).await;

    let html = submit(&ctx, &form_id, "   ").await.text().await.unwrap();

    assert!(html.contains("Please enter a coupon code"));
    assert_eq!(backend_calls(&ctx).await, 0);
}

#[tokio::test]
async fn test_unreachable_backend_shows_transport_message() {
    // Bind then drop to get a port nothing listens on.
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let api = Url::parse(&format!("http://{}/", closed.local_addr().unwrap())).unwrap();
    drop(closed);

    let ctx = TestContext::start_with(DecrementPolicy::Ignore, Some(api)).await;
    let form_id = checkout_of_200(&ctx).await;
    let html = submit(&ctx, &form_id, "SAVE10").await.text().await.unwrap();

    assert!(html.contains("Could not reach the coupon service. Please try again."));
    assert!(!html.contains("Failed to validate coupon"));
}

#[tokio::test]
async fn test_concurrent_submit_is_rejected() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(validated("SAVE10", 10, 190).set_delay(Duration::from_millis(500)))
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    let (first, second) = tokio::join!(
        submit(&ctx, &form_id, "SAVE10"),
        submit(&ctx, &form_id, "SAVE10")
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409]);
    assert_eq!(backend_calls(&ctx).await, 1);
}

#[tokio::test]
async fn test_stale_form_id_is_rejected() {
    let ctx = TestContext::start().await;
    checkout_of_200(&ctx).await;

    let resp = submit(&ctx, "00000000-0000-4000-8000-000000000000", "SAVE10").await;
    assert_eq!(resp.status(), 409);
    assert_eq!(backend_calls(&ctx).await, 0);
}

// =============================================================================
// Edit and Remove
// =============================================================================

#[tokio::test]
async fn test_edit_clears_previous_error() {
    let ctx = TestContext::start().await;
    let form_id = checkout_of_200(&ctx).await;
    let html = submit(&ctx, &form_id, "").await.text().await.unwrap();
    assert!(html.contains("Please enter a coupon code"));

    let resp = ctx
        .post(
            "/checkout/coupon/edit",
            &[("form_id", form_id.as_str()), ("code", "s")],
        )
        .await;
    assert_eq!(resp.status(), 200);
    let messages = resp.text().await.unwrap();
    assert!(!messages.contains("coupon-error"));

    let form = ctx.get("/checkout/coupon").await.text().await.unwrap();
    assert!(form.contains("value=\"S\""));
}

#[tokio::test]
async fn test_remove_restores_entry_form() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(validated("SAVE20", 20, 180))
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    submit(&ctx, &form_id, "SAVE20").await;

    let resp = ctx.post("/checkout/coupon/remove", &[]).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(hx_trigger(&resp).as_deref(), Some("checkout-updated"));
    let html = resp.text().await.unwrap();
    assert!(html.contains("name=\"code\""));
    assert!(!html.contains("You saved"));
    assert_eq!(
        checkout_integration_tests::form_id(&html).as_deref(),
        Some(form_id.as_str())
    );

    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(!summary.contains("$180.00"));
    assert_eq!(backend_calls(&ctx).await, 1);
}

#[tokio::test]
async fn test_cart_change_clears_applied_coupon() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(validated("SAVE20", 20, 180))
        .mount(&ctx.backend)
        .await;

    let form_id = checkout_of_200(&ctx).await;
    submit(&ctx, &form_id, "SAVE20").await;

    let resp = ctx
        .post(
            "/checkout/cart/quantity",
            &[("product_id", "p1"), ("direction", "increase")],
        )
        .await;
    assert_eq!(
        hx_trigger(&resp).as_deref(),
        Some("checkout-updated, coupon-cleared")
    );

    let form = ctx.get("/checkout/coupon").await.text().await.unwrap();
    assert!(form.contains("name=\"code\""));
    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(summary.contains("$400.00"));
}

// =============================================================================
// Changes During Validation
// =============================================================================

/// Mount a SAVE20 validation that takes 500 ms to answer.
async fn slow_save20(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(validated("SAVE20", 20, 180).set_delay(Duration::from_millis(500)))
        .mount(&ctx.backend)
        .await;
}

/// Run `during` 100 ms after a SAVE20 submit starts; returns both responses.
async fn while_validating<F>(
    ctx: &TestContext,
    form_id: &str,
    during: F,
) -> (reqwest::Response, reqwest::Response)
where
    F: Future<Output = reqwest::Response>,
{
    tokio::join!(submit(ctx, form_id, "SAVE20"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        during.await
    })
}

#[tokio::test]
async fn test_quantity_change_waits_for_pending_validation() {
    let ctx = TestContext::start().await;
    slow_save20(&ctx).await;
    let form_id = checkout_of_200(&ctx).await;

    let (validation, change) = while_validating(
        &ctx,
        &form_id,
        ctx.post(
            "/checkout/cart/quantity",
            &[("product_id", "p1"), ("direction", "increase")],
        ),
    )
    .await;

    assert_eq!(change.status(), 409);
    assert_eq!(validation.status(), 200);

    // The summary matches what each response showed: one item, discounted.
    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(summary.contains("<dd>1</dd>"));
    assert!(summary.contains("$200.00"));
    assert!(summary.contains("$180.00"));

    // Once the validation is done the change goes through.
    let resp = ctx
        .post(
            "/checkout/cart/quantity",
            &[("product_id", "p1"), ("direction", "increase")],
        )
        .await;
    assert_eq!(resp.status(), 200);
    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(summary.contains("<dd>2</dd>"));
    assert!(summary.contains("$400.00"));
}

#[tokio::test]
async fn test_add_and_remove_wait_for_pending_validation() {
    let ctx = TestContext::start().await;
    slow_save20(&ctx).await;
    let form_id = checkout_of_200(&ctx).await;

    let (_, added) = while_validating(
        &ctx,
        &form_id,
        ctx.add_product("p2", "Tea Tin", "15.00", 1),
    )
    .await;
    assert_eq!(added.status(), 409);

    let (_, removed) = while_validating(
        &ctx,
        &form_id,
        ctx.post("/checkout/cart/remove", &[("product_id", "p1")]),
    )
    .await;
    assert_eq!(removed.status(), 409);

    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(summary.contains("<dd>1</dd>"));
    assert!(summary.contains("$200.00"));
}

#[tokio::test]
async fn test_coupon_edit_and_remove_wait_for_pending_validation() {
    let ctx = TestContext::start().await;
    slow_save20(&ctx).await;
    let form_id = checkout_of_200(&ctx).await;

    let (validation, edit) = while_validating(
        &ctx,
        &form_id,
        ctx.post(
            "/checkout/coupon/edit",
            &[("form_id", form_id.as_str()), ("code", "OTHER")],
        ),
    )
    .await;
    assert_eq!(edit.status(), 409);
    assert!(validation.text().await.unwrap().contains("You saved $20.00"));

    // Applied now; validate again to hold a claim while removing.
    let (_, remove) = while_validating(
        &ctx,
        &form_id,
        ctx.post("/checkout/coupon/remove", &[]),
    )
    .await;
    assert_eq!(remove.status(), 409);

    let summary = ctx.get("/checkout/summary").await.text().await.unwrap();
    assert!(summary.contains("$180.00"));
}

#[tokio::test]
async fn test_address_added_during_validation_is_kept() {
    let ctx = TestContext::start().await;
    slow_save20(&ctx).await;
    let form_id = checkout_of_200(&ctx).await;

    let (validation, address) = while_validating(
        &ctx,
        &form_id,
        ctx.post(
            "/checkout/address",
            &[
                ("recipient_name", "Ada Lovelace"),
                ("street", "1 Oak St"),
                ("city", "Portland"),
                ("state", "OR"),
                ("zip_code", "97201"),
                ("country", "US"),
            ],
        ),
    )
    .await;
    assert_eq!(address.status(), 200);
    assert_eq!(validation.status(), 200);

    let page = ctx.get("/checkout").await.text().await.unwrap();
    assert!(page.contains("1 Oak St"));
    assert_eq!(checkout_integration_tests::address_ids(&page).len(), 1);
    assert!(page.contains("$180.00"));
}
