//! Shipping address type.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// A saved shipping address.
///
/// Owned by the backend; checkout components only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

impl Address {
    /// Single-line form used in address listings.
    ///
    /// ```
    /// use checkout_core::{Address, AddressId};
    ///
    /// let address = Address {
    ///     id: AddressId::new("a1"),
    ///     street: "1 Main St".into(),
    ///     city: "Springfield".into(),
    ///     state: "IL".into(),
    ///     country: "US".into(),
    ///     zip_code: "62701".into(),
    /// };
    /// assert_eq!(address.one_line(), "1 Main St, Springfield, IL 62701, US");
    /// ```
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.zip_code, self.country
        )
    }
}
