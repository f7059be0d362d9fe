//! Layout component wrapping all pages with Pico CSS and common elements.

use dioxus::prelude::*;

/// CSS styles for the application (extends Pico CSS).
const CUSTOM_STYLES: &str = r#"
:root { --pico-font-size: 15px; }
.status-err { color: var(--pico-del-color); }
.device-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 1rem; }
.controls { display: flex; gap: 0.5rem; align-items: center; flex-wrap: wrap; margin-bottom: 1rem; }
.controls form { margin: 0; }
.controls button, .controls [role=button] { margin: 0; padding: 0.4rem 0.9rem; }
.field { display: flex; gap: 0.5rem; align-items: center; margin-bottom: 0.4rem; }
.field form { display: flex; gap: 0.5rem; align-items: center; margin: 0; flex: 1; }
.field input, .field select { margin: 0; padding: 0.25rem 0.5rem; height: auto; }
.field button, .field [role=button] { margin: 0; padding: 0.2rem 0.6rem; font-size: 0.8rem; }
.field .value { flex: 1; }
.swatch { display: inline-block; width: 1em; height: 1em; border-radius: 2px; vertical-align: middle; }
small { color: var(--pico-muted-color); }
"#;

#[derive(Props, Clone, PartialEq)]
pub struct LayoutProps {
    /// Page title (shown in browser tab)
    pub title: String,
    /// Page content
    pub children: Element,
    /// Optional additional scripts to include
    #[props(default)]
    pub scripts: Option<String>,
}

/// Main layout component wrapping all pages.
#[component]
pub fn Layout(props: LayoutProps) -> Element {
    let version = env!("HDD_VERSION");

    rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{props.title} - Home Device Dashboard" }
            link {
                rel: "stylesheet",
                href: "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css"
            }
            style { {CUSTOM_STYLES} }
        }
        body {
            main { class: "container",
                {props.children}
            }
            footer { class: "container",
                small { "Home Device Dashboard v{version}" }
            }
            if let Some(scripts) = props.scripts {
                script { dangerous_inner_html: "{scripts}" }
            }
        }
    }
}
