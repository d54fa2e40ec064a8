//! Platform abstraction layer
//!
//! Browser glue for the wasm shell:
//! - DOM lookups that fail with [`SandlotError`](crate::SandlotError)
//! - Event listeners that are removed again when the level is torn down
//! - HUD text updates

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use glam::Vec2;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, EventTarget, HtmlCanvasElement, Window};

    use crate::error::{Result, SandlotError};

    pub fn window() -> Result<Window> {
        web_sys::window().ok_or(SandlotError::MissingWindow)
    }

    pub fn document() -> Result<Document> {
        window()?.document().ok_or(SandlotError::MissingWindow)
    }

    pub fn element(id: &str) -> Result<Element> {
        document()?
            .get_element_by_id(id)
            .ok_or_else(|| SandlotError::MissingElement(id.to_string()))
    }

    pub fn canvas(id: &str) -> Result<HtmlCanvasElement> {
        element(id)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SandlotError::NotACanvas(id.to_string()))
    }

    /// Top-left corner of the canvas in client coordinates
    pub fn canvas_origin(canvas: &HtmlCanvasElement) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(rect.left() as f32, rect.top() as f32)
    }

    /// Blocking message box
    pub fn alert(message: &str) {
        if let Ok(window) = window() {
            let _ = window.alert_with_message(message);
        }
    }

    /// Set the text of the first element matching `selector`
    pub fn set_text(selector: &str, text: &str) {
        if let Some(el) = document()
            .ok()
            .and_then(|d| d.query_selector(selector).ok().flatten())
        {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    /// Show or hide an element through the `hidden` class
    pub fn set_visible(id: &str, visible: bool) {
        if let Ok(el) = element(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    struct Listener {
        target: EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut(web_sys::Event)>,
    }

    /// Registered DOM listeners. Dropping the set removes them all.
    #[derive(Default)]
    pub struct ListenerSet {
        listeners: Vec<Listener>,
    }

    impl ListenerSet {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register `handler` for `event` on `target`
        pub fn listen<F>(&mut self, target: &EventTarget, event: &'static str, handler: F) -> Result<()>
        where
            F: FnMut(web_sys::Event) + 'static,
        {
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
            target
                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                .map_err(|e| SandlotError::MissingElement(format!("{}: {:?}", event, e)))?;
            self.listeners.push(Listener {
                target: target.clone(),
                event,
                closure,
            });
            Ok(())
        }

        pub fn len(&self) -> usize {
            self.listeners.len()
        }

        pub fn is_empty(&self) -> bool {
            self.listeners.is_empty()
        }

        pub fn remove_all(&mut self) {
            for listener in self.listeners.drain(..) {
                let _ = listener.target.remove_event_listener_with_callback(
                    listener.event,
                    listener.closure.as_ref().unchecked_ref(),
                );
            }
        }
    }

    impl Drop for ListenerSet {
        fn drop(&mut self) {
            self.remove_all();
        }
    }
}
