use crate::dom;
use crate::gpu::GpuState;
use crate::textures::PhotoDecoder;
use crate::ui::Overlay;
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use tree_core::{FrameClock, FrameContext, GestureLoop, NewPhoto, PhotoId, PhotoStore, Scene};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct App {
    pub scene: Scene,
    pub store: Box<dyn PhotoStore>,
    pub gestures: GestureLoop,
    pub gpu: Option<GpuState<'static>>,
    pub canvas: web::HtmlCanvasElement,
    pub clock: FrameClock,
    pub overlay: Overlay,
    pub decoder: PhotoDecoder,
    /// Delete buttons queue ids here; drained at the start of a frame.
    pub deletes: Rc<RefCell<Vec<PhotoId>>>,
}

impl App {
    pub fn upload(&mut self, items: Vec<NewPhoto>) {
        if items.is_empty() {
            return;
        }
        let now_ms = js_sys::Date::now() as u64;
        let report = self.scene.upload(self.store.as_mut(), items, now_ms);
        for e in &report.failed {
            log::error!("[store] upload failed: {e}");
        }
    }

    fn frame_context(&mut self) -> FrameContext {
        let (dt, time) = self.clock.tick();
        let dpr = web::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0) as f32;
        let viewport = match &self.gpu {
            Some(gpu) => gpu.viewport(),
            None => Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32),
        };
        FrameContext::new(dt, time, dpr, viewport)
    }

    pub fn frame(&mut self) {
        dom::sync_canvas_backing_size(&self.canvas);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.sync_size();
        }
        let ctx = self.frame_context();
        self.scene.camera_mut().set_aspect(ctx.aspect());

        let deletes: Vec<PhotoId> = self.deletes.borrow_mut().drain(..).collect();
        for id in deletes {
            if let Err(e) = self.scene.remove(self.store.as_mut(), &id) {
                log::error!("[store] delete {id} failed: {e}");
            }
        }

        let status = self.gestures.tick(self.clock.elapsed());
        self.scene.frame(&ctx);

        if let Some(gpu) = self.gpu.as_mut() {
            self.decoder.request_missing(self.scene.photos());
            for (id, pixels) in self.decoder.drain() {
                gpu.set_photo_pixels(&id, &pixels);
            }
            match gpu.render(&self.scene, &ctx) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
                Err(e) => log::warn!("[gpu] {e}"),
            }
        }

        if let Some(document) = dom::window_document() {
            let queue = Rc::clone(&self.deletes);
            self.overlay
                .sync(&document, &self.scene, status, &|button, id| {
                    let queue = Rc::clone(&queue);
                    dom::add_listener::<web::Event>(button, "click", move |_| {
                        queue.borrow_mut().push(id.clone());
                    });
                });
        }
    }
}

pub fn start_loop(app: Rc<RefCell<App>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        app.borrow_mut().frame();
        request_frame(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
