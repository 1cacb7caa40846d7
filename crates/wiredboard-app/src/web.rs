//! WebAssembly entry point and the JS-facing board handle.

use kurbo::Point;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wiredboard_core::color::LinkColor;
use wiredboard_core::elements::ElementId;
use wiredboard_core::input::{Modifiers, MouseButton, PointerEvent, WheelEvent};
use wiredboard_core::onboarding::{self, Answer};
use wiredboard_core::storage::LocalStorage;

use crate::app::{App, AppConfig, Notice};
use crate::event_handler::{BoardEvent, EventResponse};

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// DOM `MouseEvent.button` to our button, `None` for back/forward buttons.
fn dom_button(button: i16) -> Option<MouseButton> {
    match button {
        0 => Some(MouseButton::Left),
        1 => Some(MouseButton::Middle),
        2 => Some(MouseButton::Right),
        _ => None,
    }
}

fn parse_id(id: &str) -> Result<ElementId, JsValue> {
    ElementId::parse_str(id).map_err(js_error)
}

/// Dispatch result handed back to JS event listeners.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebResponse {
    pub handled: bool,
    pub prevent_default: bool,
    pub suppress_context_menu: bool,
}

impl From<EventResponse> for WebResponse {
    fn from(r: EventResponse) -> Self {
        Self {
            handled: r.handled,
            prevent_default: r.prevent_default,
            suppress_context_menu: r.suppress_context_menu,
        }
    }
}

/// Board handle owned by the page script.
#[wasm_bindgen]
pub struct WebBoard {
    app: App<LocalStorage>,
}

#[wasm_bindgen]
impl WebBoard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebBoard, JsValue> {
        let storage = LocalStorage::new().map_err(js_error)?;
        let mut config = AppConfig::default();
        if let Some(width) = web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|v| v.as_f64())
        {
            config.viewport_width = width;
        }
        Ok(Self {
            app: App::new(Arc::new(storage), config),
        })
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16) -> WebResponse {
        let Some(button) = dom_button(button) else {
            return WebResponse::default();
        };
        let event = PointerEvent::Down {
            position: Point::new(x, y),
            button,
        };
        self.app.handle_event(BoardEvent::Pointer(event)).into()
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> WebResponse {
        let event = PointerEvent::Move {
            position: Point::new(x, y),
        };
        self.app.handle_event(BoardEvent::Pointer(event)).into()
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, button: i16) -> WebResponse {
        let Some(button) = dom_button(button) else {
            return WebResponse::default();
        };
        let event = PointerEvent::Up {
            position: Point::new(x, y),
            button,
        };
        self.app.handle_event(BoardEvent::Pointer(event)).into()
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> WebResponse {
        let event = WheelEvent {
            position: Point::new(x, y),
            delta_y,
            modifiers: Modifiers { shift, ctrl, alt, meta },
        };
        self.app.handle_event(BoardEvent::Wheel(event)).into()
    }

    pub fn drop_file(&mut self, x: f64, y: f64, file_name: String, mime: String, data: Vec<u8>) -> WebResponse {
        let event = BoardEvent::Drop {
            position: Point::new(x, y),
            file_name,
            mime: if mime.is_empty() { None } else { Some(mime) },
            data,
        };
        self.app.handle_event(event).into()
    }

    pub fn resize(&mut self, width: f64) {
        self.app.set_viewport_width(width);
    }

    pub fn add_note(&mut self) -> String {
        self.app.add_note().to_string()
    }

    pub fn update_text(&mut self, id: &str, text: &str) -> Result<(), JsValue> {
        self.app.update_text(parse_id(id)?, text);
        Ok(())
    }

    pub fn delete_element(&mut self, id: &str) -> Result<(), JsValue> {
        self.app.delete_element(parse_id(id)?);
        Ok(())
    }

    pub fn toggle_link(&mut self, id: &str) -> Result<(), JsValue> {
        let outcome = self.app.toggle_link(parse_id(id)?);
        log::debug!("Link toggle: {:?}", outcome);
        Ok(())
    }

    pub fn set_link_color(&mut self, hex: &str) -> Result<(), JsValue> {
        let color: LinkColor = hex.parse().map_err(js_error)?;
        self.app.set_link_color(color);
        Ok(())
    }

    pub fn save_session(&mut self, name: &str) -> Result<(), JsValue> {
        self.app.save_session(name).map_err(js_error)
    }

    pub fn load_session(&mut self, name: &str) -> Result<(), JsValue> {
        self.app.load_session(name).map_err(js_error)
    }

    pub fn new_session(&mut self, name: &str) {
        self.app.new_session(name);
    }

    pub fn delete_session(&mut self, name: &str) -> Result<(), JsValue> {
        self.app.delete_session(name).map_err(js_error)
    }

    pub fn list_sessions(&self) -> Result<Vec<String>, JsValue> {
        self.app.list_sessions().map_err(js_error)
    }

    pub fn current_session(&self) -> String {
        self.app.current_session().to_string()
    }

    /// Answer the current onboarding question: "ok", "yes", "no" or "name".
    pub fn answer_onboarding(&mut self, answer: &str, name: Option<String>) -> Result<(), JsValue> {
        let answer = match answer {
            "ok" => Answer::Ok,
            "yes" => Answer::Yes,
            "no" => Answer::No,
            "name" => Answer::Name(name.unwrap_or_default()),
            other => return Err(JsValue::from_str(&format!("unknown answer '{}'", other))),
        };
        self.app
            .answer_onboarding(answer, onboarding::now_ms())
            .map(|_| ())
            .map_err(js_error)
    }

    /// Current onboarding question, `undefined` when blocked or done.
    pub fn onboarding_step(&self) -> Option<u8> {
        self.app.onboarding().step_index()
    }

    pub fn is_board_unlocked(&self) -> bool {
        self.app.is_board_unlocked()
    }

    pub fn display_name(&self) -> Option<String> {
        self.app.onboarding().display_name().map(str::to_string)
    }

    pub fn reset_onboarding(&mut self) {
        self.app.reset_onboarding();
    }

    /// Call from `requestAnimationFrame`.
    pub fn tick(&mut self) {
        self.app.tick(onboarding::now_ms());
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        self.app
            .take_notices()
            .into_iter()
            .map(|notice| match notice {
                Notice::Info(message) | Notice::Error(message) => message,
            })
            .collect()
    }

    /// Everything the page needs to draw the board, as JSON.
    pub fn render_state(&self) -> Result<String, JsValue> {
        let board: serde_json::Value = serde_json::from_str(&self.app.snapshot().to_json().map_err(js_error)?)
            .map_err(js_error)?;
        let arrows: Vec<serde_json::Value> = self
            .app
            .link_arrows()
            .into_iter()
            .map(|(link, arrow)| {
                serde_json::json!({
                    "from": link.from,
                    "to": link.to,
                    "line": [[arrow.line.p0.x, arrow.line.p0.y], [arrow.line.p1.x, arrow.line.p1.y]],
                    "head": arrow.head.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
                })
            })
            .collect();
        let state = serde_json::json!({
            "session": self.app.current_session(),
            "board": board,
            "arrows": arrows,
            "linkingFrom": self.app.board().linking_from(),
        });
        serde_json::to_string(&state).map_err(js_error)
    }
}

/// Initialize logging for the WASM build.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&js_error(e));
    }

    log::info!("Starting Wiredboard (WASM)");
}
