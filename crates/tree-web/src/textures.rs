use crate::dom;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tree_core::constants::PHOTO_TEXTURE_MAX_SIDE;
use tree_core::{texture_extent, PhotoCollection, PhotoId, PhotoPixels};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

type Ready = Rc<RefCell<Vec<(PhotoId, PhotoPixels)>>>;

/// Turns stored data URLs into RGBA pixels through an image element and a
/// scratch 2D canvas. Decoding finishes on the browser's schedule; results
/// are collected by `drain`.
#[derive(Default)]
pub struct PhotoDecoder {
    requested: HashSet<PhotoId>,
    ready: Ready,
}

impl PhotoDecoder {
    /// Starts decoding every photo not seen before; forgets deleted ones.
    pub fn request_missing(&mut self, photos: &PhotoCollection) {
        self.requested.retain(|id| photos.get(id).is_some());
        for photo in photos.iter() {
            if !self.requested.insert(photo.id.clone()) {
                continue;
            }
            if let Err(e) = start(&photo.image, photo.id.clone(), Rc::clone(&self.ready)) {
                log::warn!("[gpu] photo {} keeps its placeholder: {e:?}", photo.id);
            }
        }
    }

    pub fn drain(&mut self) -> Vec<(PhotoId, PhotoPixels)> {
        self.ready.borrow_mut().drain(..).collect()
    }
}

fn start(url: &str, id: PhotoId, ready: Ready) -> Result<(), JsValue> {
    let img = web::HtmlImageElement::new()?;
    let img_done = img.clone();
    let id_err = id.clone();

    let onload = Closure::once(move || match rasterize(&img_done) {
        Ok(pixels) => ready.borrow_mut().push((id, pixels)),
        Err(e) => log::warn!("[gpu] photo {id} keeps its placeholder: {e:?}"),
    });
    let onerror = Closure::once(move || {
        log::warn!("[gpu] photo {id_err} failed to decode");
    });

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();
    img.set_src(url);
    Ok(())
}

fn rasterize(img: &web::HtmlImageElement) -> Result<PhotoPixels, JsValue> {
    let (w, h) = texture_extent(img.natural_width(), img.natural_height(), PHOTO_TEXTURE_MAX_SIDE);
    let document = dom::window_document().ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<web::HtmlCanvasElement>()?;
    canvas.set_width(w.max(1));
    canvas.set_height(h.max(1));
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<web::CanvasRenderingContext2d>()?;
    ctx.draw_image_with_html_image_element_and_dw_and_dh(img, 0.0, 0.0, w as f64, h as f64)?;
    let data = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?;
    PhotoPixels::new(w, h, data.data().0).map_err(|e| JsValue::from_str(&e.to_string()))
}
