//! Embedded static resources for the demo server.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Demo server templates (page.html, client.js)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{CLIENT_JS, ClientVars, PAGE_HTML, PageVars};
//!
//! let js = CLIENT_JS.render(&ClientVars { ws_port: 5278 });
//! let html = PAGE_HTML.render(&PageVars { title: "demo".into(), body: markup });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};
    use crate::utils::html::escape;

    /// URL the page loads the client script from.
    pub const CLIENT_JS_URL: &str = "/purview.js";

    /// Variables for client.js template.
    pub struct ClientVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ClientVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Browser script: registers roots, forwards events, applies updates.
    pub const CLIENT_JS: Template<ClientVars> = Template::new(include_str!("serve/client.js"));

    /// Variables for page.html template.
    pub struct PageVars {
        pub title: String,
        /// Pre-rendered markup, inserted verbatim.
        pub body: String,
    }

    impl TemplateVars for PageVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__TITLE__", &escape(&self.title))
                .replace("__BODY__", &self.body)
        }
    }

    /// Page shell around a rendered root.
    pub const PAGE_HTML: Template<PageVars> = Template::new(include_str!("serve/page.html"));
}

#[cfg(test)]
mod tests {
    use super::serve::*;

    #[test]
    fn test_client_js_port_injection() {
        let js = CLIENT_JS.render(&ClientVars { ws_port: 4321 });
        assert!(js.contains("var WS_PORT = 4321;"));
        assert!(!js.contains("__WS_PORT__"));
    }

    #[test]
    fn test_page_wraps_body_and_loads_client() {
        let html = PAGE_HTML.render(&PageVars {
            title: "a < b".into(),
            body: "<p data-component-id=\"x\">hi</p>".into(),
        });
        assert!(html.contains("<title>a &lt; b</title>"));
        assert!(html.contains("<p data-component-id=\"x\">hi</p>"));
        assert!(html.contains(CLIENT_JS_URL));
    }
}
