#![cfg(target_arch = "wasm32")]
mod dom;
mod frame;
mod gpu;
mod hands;
mod storage;
mod textures;
mod ui;
mod upload;

use frame::App;
use std::cell::RefCell;
use std::rc::Rc;
use tree_core::{
    FrameClock, GestureLoop, HandlerCell, MemoryStore, PhotoStore, Scene, SceneParams, StopHandle,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

const CANVAS_ID: &str = "app-canvas";
const VIDEO_ID: &str = "hand-video";
const TOGGLE_ID: &str = "toggle-btn";
const UPLOAD_ID: &str = "photo-upload";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("tree-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

fn open_store() -> Box<dyn PhotoStore> {
    match storage::LocalStorageStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::error!("[store] {e}; photos will not survive a reload");
            Box::new(MemoryStore::new())
        }
    }
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = dom::element(&document, CANVAS_ID)?;
    dom::sync_canvas_backing_size(&canvas);

    let store = open_store();
    let mut scene = Scene::new(SceneParams::default(), js_sys::Date::now() as u64)?;
    if let Err(e) = scene.load_from_store(store.as_ref()) {
        log::error!("[store] load failed, starting empty: {e}");
    }

    // The surface needs a 'static canvas reference.
    let leaked_canvas: &'static web::HtmlCanvasElement = Box::leak(Box::new(canvas.clone()));
    let gpu = match gpu::GpuState::new(leaked_canvas, &scene).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("WebGPU init error: {:?}", e);
            dom::set_text(&document, ui::STATE_ID, "WebGPU unavailable");
            None
        }
    };

    let handlers = HandlerCell::new();
    let sink = scene.gesture_sink();
    handlers.register(move |g| sink.set(g));
    let pose = scene.hand_pose_sink();

    // Shared with the detector start-up below so a teardown that lands first
    // still closes the camera once it opens.
    let stop = StopHandle::default();
    let app = Rc::new(RefCell::new(App {
        gestures: GestureLoop::inactive(pose.clone()).with_stop_handle(stop.clone()),
        scene,
        store,
        gpu,
        canvas: canvas.clone(),
        clock: FrameClock::new(),
        overlay: ui::Overlay::default(),
        decoder: textures::PhotoDecoder::default(),
        deletes: Rc::new(RefCell::new(Vec::new())),
    }));

    wire_pointer(&canvas, &app);
    wire_controls(&document, &app)?;

    {
        let app = Rc::clone(&app);
        dom::add_listener::<web::Event>(&window, "pagehide", move |_| {
            app.borrow_mut().gestures.stop();
        });
    }

    {
        let app = Rc::clone(&app);
        spawn_local(async move {
            let init = hands::WebHandDetector::start(VIDEO_ID).await;
            app.borrow_mut().gestures =
                GestureLoop::from_init(init, handlers, pose).with_stop_handle(stop);
        });
    }

    frame::start_loop(app);
    Ok(())
}

fn wire_pointer(canvas: &web::HtmlCanvasElement, app: &Rc<RefCell<App>>) {
    let local_x = |canvas: &web::HtmlCanvasElement, ev: &web::PointerEvent| {
        let rect = canvas.get_bounding_client_rect();
        (
            (ev.client_x() as f64 - rect.left()) as f32,
            rect.width().max(1.0) as f32,
        )
    };
    {
        let app = Rc::clone(app);
        let c = canvas.clone();
        dom::add_listener::<web::PointerEvent>(canvas, "pointerdown", move |ev| {
            let _ = c.set_pointer_capture(ev.pointer_id());
            let (x, _) = local_x(&c, &ev);
            app.borrow_mut().scene.pointer_down(x);
        });
    }
    {
        let app = Rc::clone(app);
        let c = canvas.clone();
        dom::add_listener::<web::PointerEvent>(canvas, "pointermove", move |ev| {
            let (x, width) = local_x(&c, &ev);
            app.borrow_mut().scene.pointer_move(x, width);
        });
    }
    for name in ["pointerup", "pointercancel"] {
        let app = Rc::clone(app);
        dom::add_listener::<web::PointerEvent>(canvas, name, move |_| {
            app.borrow_mut().scene.pointer_up();
        });
    }
}

fn wire_controls(document: &web::Document, app: &Rc<RefCell<App>>) -> anyhow::Result<()> {
    {
        let app = Rc::clone(app);
        dom::add_click_listener(document, TOGGLE_ID, move || {
            app.borrow_mut().scene.toggle();
        });
    }
    {
        let app = Rc::clone(app);
        dom::add_listener::<web::KeyboardEvent>(document, "keydown", move |ev| {
            if ev.key() == " " {
                ev.prevent_default();
                app.borrow_mut().scene.toggle();
            }
        });
    }

    let input: web::HtmlInputElement = dom::element(document, UPLOAD_ID)?;
    let target = input.clone();
    let app = Rc::clone(app);
    dom::add_listener::<web::Event>(&input, "change", move |_| {
        let Some(files) = target.files() else {
            return;
        };
        let app = Rc::clone(&app);
        upload::read_files(&files, move |items| app.borrow_mut().upload(items));
        // allow picking the same files again
        target.set_value("");
    });
    Ok(())
}
