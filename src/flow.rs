//! Application event loop.
//!
//! The flow owns the window, the GPU [`Context`], the CPU [`SceneContext`], its
//! GPU mirror and the parameter bridge.
//!
//! # Lifecycle
//!
//! 1. Load the config, build the scene and load ground assets
//! 2. Run the placement pass for every group (once, before the first frame)
//! 3. Create the GPU context, upload meshes and materials
//! 4. Per frame: deliver pending bridge messages to the scene, sync changes to
//!    the GPU, draw, present
//!
//! On the web step 1-3 run in `spawn_local` and hand the finished state back
//! through a user event.

use std::{fmt::Debug, iter, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    bridge::{BridgeHandle, CAMERA_OBJECT, ObjectValues, ParameterBridge},
    config::SceneConfig,
    context::Context,
    render::GpuScene,
    resources,
    scene::SceneContext,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

const CAMERA_STEP: f32 = 5.0;
const FOV_STEP: f32 = 2.0;

/// Where the scene description comes from.
#[derive(Clone, Debug)]
pub enum ConfigSource {
    Inline(SceneConfig),
    /// A JSON file under the asset root.
    File(String),
}

impl ConfigSource {
    async fn load(self) -> SceneConfig {
        match self {
            ConfigSource::Inline(config) => config,
            ConfigSource::File(file) => resources::load_config(&file).await.unwrap_or_else(|e| {
                log::error!("{e}: {:#}, using the default scene", e.source);
                SceneConfig::default()
            }),
        }
    }
}

/// Everything a running scene needs: GPU context, scene state and bridge.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    scene: SceneContext,
    gpu: GpuScene,
    bridge: BridgeHandle,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, source: ConfigSource) -> anyhow::Result<Self> {
        let config = source.load().await;
        let mut scene = resources::load_scene(&config).await;
        let size = window.inner_size();
        scene.resize(size.width, size.height);

        let seed = config.seed.unwrap_or_else(|| instant::now() as u64);
        log::info!("Placing instances with seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let failures = scene.populate(&mut rng);
        if !failures.is_empty() {
            log::warn!(
                "{} of {} groups could not be placed",
                failures.len(),
                scene.groups().len()
            );
        }

        let ctx = Context::new(window, &scene).await?;
        let matcap =
            resources::texture::load_matcap(config.matcap.as_deref(), &ctx.device, &ctx.queue).await;
        let gpu = GpuScene::new(&ctx, &scene, matcap.as_ref());

        let bridge = BridgeHandle::new(ParameterBridge::for_scene(&scene, config.mailbox_capacity));
        if let Some(file) = config.project_state.as_deref() {
            match resources::load_json(file).await {
                Ok(state) => {
                    let restored = bridge.restore_project_state(&state, &config.sheet);
                    log::info!("Restored {restored} objects from {file}");
                }
                Err(e) => log::error!("{e}: {:#}", e.source),
            }
        }

        Ok(Self {
            ctx,
            scene,
            gpu,
            bridge,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.scene.resize(width, height);
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // parameter updates land before anything reads the scene this frame
        let applied = self.bridge.deliver(&mut self.scene);
        if applied > 0 {
            log::debug!("Applied {applied} parameter updates");
        }
        self.gpu.sync(&mut self.ctx, &mut self.scene);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.gpu.draw(&mut render_pass, &self.ctx, &self.scene);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Keyboard camera moves go through the bridge like any editor update.
fn nudge_camera(bridge: &BridgeHandle, key: &Key) {
    let Some(ObjectValues::Camera { mut position, mut fov }) = bridge.values(CAMERA_OBJECT) else {
        return;
    };
    match key {
        Key::Named(NamedKey::ArrowLeft) => position[0] -= CAMERA_STEP,
        Key::Named(NamedKey::ArrowRight) => position[0] += CAMERA_STEP,
        Key::Named(NamedKey::ArrowUp) => position[2] -= CAMERA_STEP,
        Key::Named(NamedKey::ArrowDown) => position[2] += CAMERA_STEP,
        Key::Named(NamedKey::PageUp) => position[1] += CAMERA_STEP,
        Key::Named(NamedKey::PageDown) => position[1] -= CAMERA_STEP,
        Key::Character(c) if c.as_str() == "+" => fov -= FOV_STEP,
        Key::Character(c) if c.as_str() == "-" => fov += FOV_STEP,
        _ => return,
    }
    if let Err(e) = bridge.push_values(CAMERA_OBJECT, &ObjectValues::Camera { position, fov }) {
        log::warn!("{e}");
    }
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static BRIDGE: std::cell::RefCell<Option<BridgeHandle>> = const { std::cell::RefCell::new(None) };
}

/// Queues new values for a named object, e.g.
/// `set_object_values("Camera", '{"position": {"x": 10}}')`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_object_values(object: &str, values: &str) -> Result<(), JsValue> {
    BRIDGE.with_borrow(|bridge| {
        let bridge = bridge
            .as_ref()
            .ok_or_else(|| JsValue::from_str("scene is not initialised yet"))?;
        bridge
            .push_str(object, values)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    })
}

/// Current values of every editable object as a JSON string.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn object_values() -> Option<String> {
    BRIDGE.with_borrow(|bridge| bridge.as_ref().map(|b| b.snapshot().to_string()))
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    // taken once the window exists
    source: Option<ConfigSource>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, source: ConfigSource) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            source: Some(source),
        })
    }

    fn initialized(&mut self, mut state: AppState) {
        #[cfg(target_arch = "wasm32")]
        BRIDGE.with_borrow_mut(|bridge| *bridge = Some(state.bridge.clone()));

        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.state = Some(state);
    }
}

pub enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    Failed(String),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(source) = self.source.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("scatter-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = AppState::new(window, source);

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init_future) {
            Ok(state) => self.initialized(state),
            Err(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => FlowEvent::Initialized(Box::new(state)),
                    Err(e) => FlowEvent::Failed(format!("{e:#}")),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the scene was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(state) => self.initialized(*state),
            FlowEvent::Failed(e) => {
                log::error!("App initialization failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                nudge_camera(&state.bridge, &event.logical_key);
            }
            WindowEvent::RedrawRequested => match state.render() {
                Ok(_) => {}
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                }
                Err(e) => {
                    log::error!("Unable to render {}", e);
                }
            },
            _ => {}
        }
    }
}

fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }
}

/// Opens the window and runs the scene until it is closed.
pub fn run(source: ConfigSource) -> anyhow::Result<()> {
    init_logger();

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, source)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Web entry point: loads `scene.json` from the asset root.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ConfigSource::File("scene.json".to_string())).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
