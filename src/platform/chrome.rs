//! Page chrome: the dialog box and the fake error overlay

use glam::Vec2;

/// Text surfaces that live outside the canvas
pub trait Chrome {
    /// Show a narrative message, nudged from center by `offset` pixels
    fn show_message(&mut self, text: &str, offset: Vec2);
    fn hide_message(&mut self);
    /// Show the fake crash report. `pos_percent` is the top-left corner as a
    /// percentage of the viewport.
    fn show_error(&mut self, text: &str, pos_percent: Vec2);
    fn hide_error(&mut self);
}

/// Chrome for headless runs: everything goes to the log
#[derive(Debug, Clone, Default)]
pub struct LogChrome {
    message: Option<String>,
    error: Option<String>,
}

impl LogChrome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message currently on screen
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Chrome for LogChrome {
    fn show_message(&mut self, text: &str, offset: Vec2) {
        log::info!("[dialog] {text} (offset {:.0},{:.0})", offset.x, offset.y);
        self.message = Some(text.to_string());
    }

    fn hide_message(&mut self) {
        self.message = None;
    }

    fn show_error(&mut self, text: &str, _pos_percent: Vec2) {
        log::warn!("[crash] {}", text.replace('\n', " | "));
        self.error = Some(text.to_string());
    }

    fn hide_error(&mut self) {
        self.error = None;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::DomChrome;

#[cfg(target_arch = "wasm32")]
mod web {
    use glam::Vec2;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlElement;

    use super::Chrome;

    fn element(document: &web_sys::Document, id: &str) -> Option<HtmlElement> {
        document.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn set_style(el: &HtmlElement, prop: &str, value: &str) {
        if let Err(e) = el.style().set_property(prop, value) {
            log::debug!("style {prop} failed: {e:?}");
        }
    }

    /// `#dialogBox` and `#errorMessage` elements of the host page. Missing
    /// elements turn the matching calls into no-ops.
    pub struct DomChrome {
        dialog: Option<HtmlElement>,
        error: Option<HtmlElement>,
    }

    impl DomChrome {
        pub fn new(document: &web_sys::Document) -> Self {
            let dialog = element(document, "dialogBox");
            let error = element(document, "errorMessage");
            if dialog.is_none() {
                log::warn!("#dialogBox not found; messages will not be shown");
            }
            if error.is_none() {
                log::warn!("#errorMessage not found; crash overlay disabled");
            }
            Self { dialog, error }
        }
    }

    impl Chrome for DomChrome {
        fn show_message(&mut self, text: &str, offset: Vec2) {
            let Some(dialog) = &self.dialog else { return };
            dialog.set_text_content(Some(text));
            set_style(
                dialog,
                "transform",
                &format!(
                    "translate(calc(-50% + {}px), calc(-50% + {}px))",
                    offset.x, offset.y
                ),
            );
            set_style(dialog, "display", "block");
        }

        fn hide_message(&mut self) {
            if let Some(dialog) = &self.dialog {
                set_style(dialog, "display", "none");
            }
        }

        fn show_error(&mut self, text: &str, pos_percent: Vec2) {
            let Some(error) = &self.error else { return };
            // Escape first so only our own line breaks become markup
            let escaped = text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('\n', "<br>");
            error.set_inner_html(&escaped);
            set_style(error, "top", &format!("{}%", pos_percent.y));
            set_style(error, "left", &format!("{}%", pos_percent.x));
            set_style(error, "display", "block");
        }

        fn hide_error(&mut self) {
            if let Some(error) = &self.error {
                set_style(error, "display", "none");
            }
        }
    }
}
