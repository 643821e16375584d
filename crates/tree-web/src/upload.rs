use std::cell::RefCell;
use std::rc::Rc;
use tree_core::NewPhoto;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Collects one multi-file selection; `done` fires once every file has
/// either decoded or failed.
struct Batch {
    remaining: usize,
    items: Vec<Option<NewPhoto>>,
    done: Option<Box<dyn FnOnce(Vec<NewPhoto>)>>,
}

impl Batch {
    fn finish_one(batch: &Rc<RefCell<Batch>>, index: usize, item: Option<NewPhoto>) {
        let ready = {
            let mut b = batch.borrow_mut();
            if let Some(slot) = b.items.get_mut(index) {
                *slot = item;
            }
            b.remaining = b.remaining.saturating_sub(1);
            if b.remaining == 0 {
                b.done.take().map(|done| (done, std::mem::take(&mut b.items)))
            } else {
                None
            }
        };
        // selection order is kept
        if let Some((done, items)) = ready {
            done(items.into_iter().flatten().collect());
        }
    }
}

/// Reads every selected file as a data URL and measures it through an
/// image element so the aspect ratio is known before anything is stored.
pub fn read_files(files: &web::FileList, done: impl FnOnce(Vec<NewPhoto>) + 'static) {
    let count = files.length() as usize;
    if count == 0 {
        return;
    }
    let batch = Rc::new(RefCell::new(Batch {
        remaining: count,
        items: vec![None; count],
        done: Some(Box::new(done)),
    }));
    for i in 0..count {
        let Some(file) = files.get(i as u32) else {
            Batch::finish_one(&batch, i, None);
            continue;
        };
        if let Err(e) = read_one(&file, i, Rc::clone(&batch)) {
            log::error!("[store] cannot read {}: {e:?}", file.name());
            Batch::finish_one(&batch, i, None);
        }
    }
}

fn read_one(
    file: &web::File,
    index: usize,
    batch: Rc<RefCell<Batch>>,
) -> Result<(), wasm_bindgen::JsValue> {
    let reader = web::FileReader::new()?;
    let name = file.name();
    let reader_done = reader.clone();
    let batch_err = Rc::clone(&batch);
    let name_err = name.clone();

    let onload = Closure::once(move || {
        let Some(url) = reader_done.result().ok().and_then(|v| v.as_string()) else {
            log::error!("[store] {name} did not decode to a data URL");
            Batch::finish_one(&batch, index, None);
            return;
        };
        if let Err(e) = measure(url, index, Rc::clone(&batch)) {
            log::error!("[store] cannot measure {name}: {e:?}");
            Batch::finish_one(&batch, index, None);
        }
    });
    let onerror = Closure::once(move || {
        log::error!("[store] failed to read {name_err}");
        Batch::finish_one(&batch_err, index, None);
    });

    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();
    reader.read_as_data_url(file)
}

fn measure(
    url: String,
    index: usize,
    batch: Rc<RefCell<Batch>>,
) -> Result<(), wasm_bindgen::JsValue> {
    let img = web::HtmlImageElement::new()?;
    let img_done = img.clone();
    let batch_err = Rc::clone(&batch);
    let image = url.clone();

    let onload = Closure::once(move || {
        let (w, h) = (img_done.natural_width(), img_done.natural_height());
        let item = (w > 0 && h > 0).then(|| NewPhoto {
            image,
            aspect_ratio: w as f32 / h as f32,
        });
        if item.is_none() {
            log::error!("[store] image has no pixels");
        }
        Batch::finish_one(&batch, index, item);
    });
    let onerror = Closure::once(move || {
        log::error!("[store] image failed to decode");
        Batch::finish_one(&batch_err, index, None);
    });

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();
    img.set_src(&url);
    Ok(())
}
