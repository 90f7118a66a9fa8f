//! Askama filters used by the page layout.

use std::fmt::Display;

/// Year shown in the footer: `{{ ""|current_year }}`.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Fingerprint of the stylesheet, set by `build.rs`: `{{ ""|css_hash }}`.
///
/// The layout links `/static/css/derived/main.{hash}.css`, which is served
/// with an immutable cache header.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}
