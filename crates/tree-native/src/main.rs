mod hand;
mod import;
mod store;

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

use glam::Vec2;
use hand::{HandInput, HandShape, SyntheticHand};
use store::DirectoryStore;
use tree_core::gpu::SceneRenderer;
use tree_core::{
    FrameClock, FrameContext, GestureLoop, HandlerCell, PhotoId, Scene, SceneParams,
    TrackerStatus,
};

const DEFAULT_STORE_DIR: &str = "photo-tree-store";

struct GpuState<'w> {
    window: &'w Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    /// Photos whose file could not be decoded; they keep the placeholder card.
    undecodable: HashSet<PhotoId>,
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w Window, scene: &Scene) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        log::info!("[gpu] surface {}x{} {:?}", config.width, config.height, format);

        let renderer = SceneRenderer::new(&device, &queue, format, scene);
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            undecodable: HashSet::new(),
        })
    }

    /// Decodes and uploads images for photos that have none yet.
    fn sync_photo_textures(&mut self, scene: &Scene) {
        for photo in scene.photos().iter() {
            if self.renderer.has_photo_pixels(&photo.id) || self.undecodable.contains(&photo.id) {
                continue;
            }
            match import::decode_pixels(Path::new(&photo.image)) {
                Ok(pixels) => {
                    self.renderer
                        .set_photo_pixels(&self.device, &self.queue, &photo.id, &pixels)
                }
                Err(e) => {
                    log::warn!("[gpu] {} shows a placeholder: {e}", photo.image);
                    self.undecodable.insert(photo.id.clone());
                }
            }
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn viewport(&self) -> Vec2 {
        Vec2::new(self.config.width as f32, self.config.height as f32)
    }

    fn render(&mut self, scene: &Scene, ctx: &FrameContext) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer
            .render(&self.device, &self.queue, &view, scene, ctx);
        frame.present();
        Ok(())
    }
}

struct App {
    scene: Scene,
    store: DirectoryStore,
    clock: FrameClock,
    gestures: GestureLoop,
    hand: Rc<RefCell<HandInput>>,
    cursor: Vec2,
    title: String,
}

impl App {
    fn frame_context(&mut self, gpu: &GpuState) -> FrameContext {
        let (dt, time) = self.clock.tick();
        FrameContext::new(
            dt,
            time,
            gpu.window.scale_factor() as f32,
            gpu.viewport(),
        )
    }

    fn step(&mut self, ctx: &FrameContext) -> TrackerStatus {
        self.scene.camera_mut().set_aspect(ctx.aspect());
        let status = self.gestures.tick(self.clock.elapsed());
        self.scene.frame(ctx);
        status
    }

    fn update_title(&mut self, window: &Window, status: TrackerStatus) {
        let title = format!(
            "Photo Tree | {} | {} photos | hand: {}",
            self.scene.state().name(),
            self.scene.photos().len(),
            status.label()
        );
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }

    fn on_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        if let Some(shape) = HandShape::from_key(key) {
            let mut hand = self.hand.borrow_mut();
            if pressed {
                hand.held = Some(shape);
            } else if hand.held == Some(shape) {
                hand.held = None;
            }
            return;
        }
        if !pressed || repeat {
            return;
        }
        match key {
            KeyCode::Space => {
                self.scene.toggle();
            }
            KeyCode::KeyH => {
                let mut hand = self.hand.borrow_mut();
                hand.resting = !hand.resting;
            }
            KeyCode::Delete | KeyCode::Backspace => self.delete_current(),
            _ => {}
        }
    }

    /// Removes the featured photo, or the newest one when nothing is featured.
    fn delete_current(&mut self) {
        let target: Option<PhotoId> = self
            .scene
            .state()
            .featured()
            .cloned()
            .or_else(|| self.scene.photos().iter().last().map(|p| p.id.clone()));
        let Some(id) = target else {
            return;
        };
        if let Err(e) = self.scene.remove(&mut self.store, &id) {
            log::error!("[store] delete {id} failed: {e}");
        }
    }

    fn on_cursor(&mut self, x: f32, y: f32, size: Vec2) {
        self.cursor = Vec2::new(x, y);
        self.hand.borrow_mut().cursor = [x / size.x.max(1.0), y / size.y.max(1.0)];
        self.scene.pointer_move(x, size.x);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = import::parse_args(std::env::args().skip(1))?;
    let store_dir = args
        .store_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
    let mut store = DirectoryStore::open(store_dir)?;
    log::info!("[store] using {}", store.root().display());

    let mut scene = Scene::new(SceneParams::default(), now_ms())?;
    if let Err(e) = scene.load_from_store(&store) {
        log::error!("[store] load failed, starting empty: {e}");
    }
    let imports = import::load_images(&args.images);
    if !imports.is_empty() {
        let report = scene.upload(&mut store, imports, now_ms());
        for e in &report.failed {
            log::error!("[store] import failed: {e}");
        }
    }

    let hand = Rc::new(RefCell::new(HandInput::default()));
    let handlers = HandlerCell::new();
    let sink = scene.gesture_sink();
    handlers.register(move |g| sink.set(g));
    let gestures = GestureLoop::from_init(
        SyntheticHand::new(Rc::clone(&hand)),
        handlers,
        scene.hand_pose_sink(),
    );

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Photo Tree")
        .build(&event_loop)?;

    let mut gpu = pollster::block_on(GpuState::new(&window, &scene))?;
    let mut app = App {
        scene,
        store,
        clock: FrameClock::new(),
        gestures,
        hand,
        cursor: Vec2::ZERO,
        title: String::new(),
    };

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => gpu.resize(size),
            WindowEvent::CloseRequested => {
                app.gestures.stop();
                elwt.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    app.gestures.stop();
                    elwt.exit();
                } else {
                    app.on_key(code, state == ElementState::Pressed, repeat);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                app.on_cursor(position.x as f32, position.y as f32, gpu.viewport());
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => app.scene.pointer_down(app.cursor.x),
                ElementState::Released => app.scene.pointer_up(),
            },
            _ => {}
        },
        Event::AboutToWait => {
            let ctx = app.frame_context(&gpu);
            let status = app.step(&ctx);
            app.update_title(gpu.window, status);
            gpu.sync_photo_textures(&app.scene);
            match gpu.render(&app.scene, &ctx) {
                Ok(_) => gpu.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    gpu.resize(gpu.window.inner_size())
                }
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(e) => log::warn!("[gpu] {e}"),
            }
        }
        _ => {}
    })?;
    Ok(())
}
