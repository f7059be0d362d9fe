//! Dismissable error alert component.

use dioxus::prelude::*;

/// Error message with a link that reloads the page without it.
#[component]
pub fn ErrorAlert(
    /// The error message to display
    message: String,
    /// Where the dismiss link goes
    dismiss_href: String,
) -> Element {
    rsx! {
        article { role: "alert", class: "status-err",
            "{message} "
            a { href: "{dismiss_href}", "aria-label": "Dismiss", "×" }
        }
    }
}
