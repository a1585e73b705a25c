//! Application event loop.
//!
//! [`run`] opens a window and drives the demo from winit events:
//!
//! 1. On resume the GPU context, the renderer, any OBJ meshes or textures
//!    replacing the built-in ones and the optional glTF model are
//!    created asynchronously (tokio natively, `spawn_local` on the web)
//! 2. Window and device events feed the [`InputState`]
//! 3. Every `RedrawRequested` advances the [`Scene`] by the elapsed time,
//!    renders the packed batch plus the loaded models and requests the next frame
//!
//! Initialization and rendering errors other than a lost, outdated or timed
//! out surface are fatal: they are logged once, the loop exits and [`run`]
//! returns the error.

use std::sync::Arc;

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    context::Context,
    data_structures::{batch::ObjectKind, model::GltfModel},
    input::{InputState, apply_pointer_lock},
    render::{RenderError, Renderer},
    resources::{gltf::GltfLoader, load_texture, obj::load_obj_mesh},
    scene::{Scene, SceneConfig},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything [`run`] needs to know up front.
#[derive(Debug, Clone)]
pub struct Config {
    pub scene: SceneConfig,
    /// glTF document loaded at startup and drawn every frame.
    pub model_url: Option<String>,
    /// Image files replacing the generated checkerboard of a kind.
    pub textures: Vec<(ObjectKind, String)>,
    /// OBJ files replacing the built-in vertices of a kind.
    pub meshes: Vec<(ObjectKind, String)>,
    pub title: String,
    pub clear_colour: wgpu::Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            model_url: None,
            textures: Vec::new(),
            meshes: Vec::new(),
            title: "instanced-ngin".to_string(),
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
        }
    }
}

/// GPU-side state, available once async initialization finished.
pub struct AppState {
    ctx: Context,
    renderer: Renderer,
    models: Vec<GltfModel>,
}

impl AppState {
    async fn new(window: Arc<Window>, config: Config) -> anyhow::Result<Self> {
        let ctx = Context::new(window)
            .await
            .context("cannot create the GPU context")?;
        let mut renderer = Renderer::new(&ctx, config.scene.capacity)
            .await
            .context("cannot create the renderer")?;
        renderer.clear_colour = config.clear_colour;
        for (kind, url) in &config.textures {
            let texture = load_texture(url, &ctx.device, &ctx.queue)
                .await
                .with_context(|| format!("cannot load texture {}", url))?;
            renderer.set_texture(&ctx.device, *kind, texture);
        }
        for (kind, url) in &config.meshes {
            let mesh = load_obj_mesh(url, &ctx.device)
                .await
                .with_context(|| format!("cannot load mesh {}", url))?;
            renderer.set_mesh(*kind, mesh);
        }

        let mut models = Vec::new();
        if let Some(url) = &config.model_url {
            let mut loader = GltfLoader::new(&ctx.device, ctx.config.format, renderer.frame_layout());
            let model = loader
                .load(url)
                .await
                .with_context(|| format!("cannot load model {}", url))?;
            log::info!(
                "Model {} ready: {} nodes, {} primitives",
                url,
                model.nodes.len(),
                model.primitive_count()
            );
            models.push(model);
        }

        Ok(Self {
            ctx,
            renderer,
            models,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
        if self.ctx.is_surface_configured() {
            self.renderer.resize(width, height);
        }
    }
}

pub enum AppEvent {
    Initialized(Box<anyhow::Result<AppState>>),
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: EventLoopProxy<AppEvent>,
    config: Config,
    state: Option<AppState>,
    initializing: bool,
    scene: Scene,
    input: InputState,
    last_time: Instant,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, config: Config) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            scene: Scene::new(&config.scene),
            config,
            state: None,
            initializing: false,
            input: InputState::new(),
            last_time: Instant::now(),
            failure: None,
        })
    }

    /// Log `error`, remember it for [`run`] and stop the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        if self.failure.is_none() {
            self.failure = Some(error);
        }
        event_loop.exit();
    }

    fn window_attributes(&self) -> anyhow::Result<winit::window::WindowAttributes> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&self.config.title);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .with_context(|| format!("no element with id {}", CANVAS_ID))?;
            window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
        }

        Ok(window_attributes)
    }

    fn initialized(&mut self, event_loop: &ActiveEventLoop, result: anyhow::Result<AppState>) {
        self.initializing = false;
        match result {
            Ok(mut state) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    /// Update the scene and draw one frame. Errors returned here are fatal.
    fn redraw(&mut self) -> anyhow::Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        let now = Instant::now();
        let dt = (now - self.last_time).as_secs_f32();
        self.last_time = now;

        state.ctx.window.request_redraw();
        if !state.ctx.is_surface_configured() {
            return Ok(());
        }

        self.scene.update(dt, &mut self.input)?;
        match state.renderer.render(
            &state.ctx,
            self.scene.batch(),
            self.scene.camera(),
            &state.models,
        ) {
            Ok(()) => Ok(()),
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                Ok(())
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout, skipping frame");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.initializing {
            return;
        }

        let window = match self
            .window_attributes()
            .and_then(|attributes| Ok(event_loop.create_window(attributes)?))
        {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.context("cannot create the window")),
        };
        self.initializing = true;
        let init_future = AppState::new(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(init_future);
            self.initialized(event_loop, result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = init_future.await;
                if proxy
                    .send_event(AppEvent::Initialized(Box::new(result)))
                    .is_err()
                {
                    log::error!("Event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(result) => self.initialized(event_loop, *result),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        self.input.handle_device_event(&event);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.input.handle_window_event(&event);
        if let Some(request) = self.input.take_lock_request()
            && let Some(state) = &self.state
        {
            apply_pointer_lock(&state.ctx.window, &mut self.input, request);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e.context("render loop halted"));
                }
            }
            _ => (),
        }
    }
}

fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        // Fails only when a logger is already installed.
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Open a window and run the demo until it is closed or fails.
pub fn run(config: Config) -> anyhow::Result<()> {
    init_logger();

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(Config::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
