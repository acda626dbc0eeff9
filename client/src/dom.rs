use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Window};

use prizewheel_shared::RewardSession;

use crate::render::redraw;
use crate::state::{SessionHeader, State};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_status(status_el: &Element, status_text: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_text.set_text_content(Some(text));
}

fn set_visible(element: &HtmlElement, visible: bool) {
    let display = if visible { "" } else { "none" };
    let _ = element.style().set_property("display", display);
}

pub fn show_session(header: &SessionHeader, session: Option<&RewardSession>) {
    let Some(session) = session else {
        header.title.set_text_content(Some("Prize wheel"));
        header.description.set_text_content(None);
        set_visible(&header.banner, false);
        return;
    };
    header.title.set_text_content(Some(&session.title));
    header
        .description
        .set_text_content(Some(&session.description));
    match session.banner.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            let _ = header
                .banner
                .style()
                .set_property("background-image", &format!("url(\"{url}\")"));
            set_visible(&header.banner, true);
        }
        None => set_visible(&header.banner, false),
    }
}

pub fn resize_canvas(window: &Window, state: &mut State) {
    let rect = state.canvas.get_bounding_client_rect();
    let dpr = window.device_pixel_ratio();
    state.canvas.set_width((rect.width() * dpr) as u32);
    state.canvas.set_height((rect.height() * dpr) as u32);
    let _ = state.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    state.width = rect.width();
    state.height = rect.height();
    state.log(&format!(
        "canvas resized to {}x{} dpr={dpr}",
        state.width, state.height
    ));
    redraw(state);
}
