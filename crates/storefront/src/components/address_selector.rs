//! Address selector component.
//!
//! Renders saved addresses as a radio group. Changing the selection posts
//! `address_id` to `on_select`; the "add new" button requests `on_add_new`.

use askama::Template;
use checkout_core::{Address, AddressId};

use super::ActionUrl;

/// One radio entry.
#[derive(Debug, Clone)]
pub struct AddressOption {
    pub id: String,
    pub summary: String,
    pub selected: bool,
}

/// Address selector fragment.
#[derive(Template)]
#[template(path = "components/address_selector.html")]
pub struct AddressSelector {
    pub options: Vec<AddressOption>,
    pub display_name: String,
    pub on_select: ActionUrl,
    pub on_add_new: ActionUrl,
}

impl AddressSelector {
    /// Build the selector. At most one option is marked selected: the one
    /// whose id equals `selected_id`.
    #[must_use]
    pub fn new(
        addresses: &[Address],
        display_name: impl Into<String>,
        selected_id: Option<&AddressId>,
        on_select: ActionUrl,
        on_add_new: ActionUrl,
    ) -> Self {
        let options = addresses
            .iter()
            .map(|address| AddressOption {
                id: address.id.to_string(),
                summary: address.one_line(),
                selected: selected_id == Some(&address.id),
            })
            .collect();

        Self {
            options,
            display_name: display_name.into(),
            on_select,
            on_add_new,
        }
    }

    /// Whether there are no addresses to choose from.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
