use crate::dom;
use tree_core::{PhotoId, Scene, TrackerStatus};
use wasm_bindgen::JsCast;
use web_sys as web;

pub const PHOTO_LIST_ID: &str = "photo-list";
pub const STATUS_ID: &str = "hand-status";
pub const STATE_ID: &str = "tree-state";

/// What the page last showed, so the DOM is only touched on change.
#[derive(Default)]
pub struct Overlay {
    listed: Vec<PhotoId>,
    status: Option<TrackerStatus>,
    state: &'static str,
}

impl Overlay {
    pub fn sync(
        &mut self,
        document: &web::Document,
        scene: &Scene,
        status: TrackerStatus,
        on_delete: &dyn Fn(&web::Element, PhotoId),
    ) {
        if self.status != Some(status) {
            dom::set_text(document, STATUS_ID, status.label());
            if let Some(el) = document.get_element_by_id(STATUS_ID) {
                let _ = el.set_attribute("data-status", status.label());
            }
            self.status = Some(status);
        }
        let state = scene.state().name();
        if self.state != state {
            if let Some(el) = document.body() {
                let _ = el.set_attribute("data-state", state);
            }
            dom::set_text(document, STATE_ID, state);
            self.state = state;
        }
        let ids = scene.photos().ids();
        if ids != self.listed {
            if let Err(e) = rebuild_list(document, scene, on_delete) {
                log::warn!("[scene] photo list not updated: {e:?}");
            }
            self.listed = ids;
        }
    }
}

fn rebuild_list(
    document: &web::Document,
    scene: &Scene,
    on_delete: &dyn Fn(&web::Element, PhotoId),
) -> Result<(), wasm_bindgen::JsValue> {
    let Some(list) = document.get_element_by_id(PHOTO_LIST_ID) else {
        return Ok(());
    };
    list.set_inner_html("");
    for photo in scene.photos().iter() {
        let item = document.create_element("li")?;
        let thumb = document
            .create_element("img")?
            .dyn_into::<web::HtmlImageElement>()?;
        thumb.set_src(&photo.image);
        thumb.set_alt(photo.id.as_str());
        item.append_child(&thumb)?;

        let button = document.create_element("button")?;
        button.set_text_content(Some("Delete"));
        let _ = button.set_attribute("data-photo", photo.id.as_str());
        on_delete(&button, photo.id.clone());
        item.append_child(&button)?;
        list.append_child(&item)?;
    }
    Ok(())
}
