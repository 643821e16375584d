use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

pub fn element<T: JsCast>(document: &web::Document, id: &str) -> anyhow::Result<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("missing #{id}"))?
        .dyn_into::<T>()
        .map_err(|_| anyhow::anyhow!("#{id} has the wrong element type"))
}

pub fn add_listener<E: JsCast + 'static>(
    target: &web::EventTarget,
    event: &str,
    mut handler: impl FnMut(E) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    }) as Box<dyn FnMut(web::Event)>);
    let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

#[inline]
pub fn add_click_listener(
    document: &web::Document,
    element_id: &str,
    mut handler: impl FnMut() + 'static,
) {
    if let Some(el) = document.get_element_by_id(element_id) {
        add_listener::<web::Event>(&el, "click", move |_| handler());
    }
}

/// Keeps the canvas backing store at CSS size times devicePixelRatio.
/// Returns true when the size changed.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> bool {
    let Some(w) = web::window() else {
        return false;
    };
    let dpr = w.device_pixel_ratio();
    let rect = canvas.get_bounding_client_rect();
    let w_px = ((rect.width() * dpr) as u32).max(1);
    let h_px = ((rect.height() * dpr) as u32).max(1);
    if canvas.width() == w_px && canvas.height() == h_px {
        return false;
    }
    canvas.set_width(w_px);
    canvas.set_height(h_px);
    true
}

pub fn set_text(document: &web::Document, id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}
