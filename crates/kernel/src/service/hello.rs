//! Built-in greeting service.

use agnstk_sdk::{Capabilities, MenuConfig, RenderArgs, RenderError, Renderable};

use crate::content::html_escape;

/// Greeting service: the `hello` shortcode, the `/hello` page and its menu
/// entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloService;

impl Renderable for HelloService {
    fn render(&self, args: &RenderArgs) -> Result<String, RenderError> {
        let message = args.get("message").unwrap_or("Hello from AGNSTK!");
        let mut html = String::from("<div class=\"hello-service\">");
        if let Some(title) = args.get("title") {
            html.push_str(&format!("<h3>{}</h3>", html_escape(title)));
        }
        html.push_str(&format!("<p>{}</p></div>", html_escape(message)));
        Ok(html)
    }

    fn title(&self) -> Option<String> {
        Some("Hello".to_string())
    }

    fn describe(&self) -> Capabilities {
        Capabilities::default()
            .shortcode("hello")
            .uri("/hello")
            .menu(MenuConfig::new("Hello").order(20))
    }
}
