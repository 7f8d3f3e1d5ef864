use std::any::Any;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::{debug, error, info, warn};
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::error::OsError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::backend::{
    DrawBackend, ShaderBackend, ShaderHandle, UniformLocation, UniformValue, WindowBackend,
};
use crate::camera::Camera;
use crate::color::Color;
use crate::config::AppConfig;
use crate::render::common::{CUBE_INDICES, CUBE_VERTICES, DEFAULT_SHADER, OVERLAY_SHADER};
use crate::render::font;
use crate::render::uniforms::{self, LightingUniforms, UniformBlock};

/// Event pumps allowed for the platform to hand out the first `resumed`.
const WINDOW_CREATE_ATTEMPTS: usize = 16;

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
const OVERLAY_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

/// The platform could not give us a window. Callers may fall back to the
/// headless backend.
#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {message}")]
pub struct WindowInitError {
    stage: &'static str,
    message: String,
}

impl WindowInitError {
    fn new(stage: &'static str, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }

    fn from_panic(stage: &'static str, panic: Box<dyn Any + Send>) -> Self {
        let message = match panic.downcast::<String>() {
            Ok(msg) => *msg,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "unknown panic".into(),
            },
        };
        Self { stage, message }
    }
}

/// Some platforms panic instead of returning an error when no display is
/// reachable.
fn create_event_loop() -> Result<EventLoop<()>, WindowInitError> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::new("event loop", err))
}

/// wgpu renderer in a winit window, driven one frame at a time.
pub struct NativeBackend {
    gpu: Gpu,
    programs: Vec<Program>,
    frame: FrameCommands,
    camera: Option<Camera>,
    active_shader: Option<ShaderHandle>,
    last_frame: Instant,
    frame_delta: f32,
    window_state: WindowState,
    event_loop: EventLoop<()>,
}

impl NativeBackend {
    /// Opens the window and initializes the GPU. Window system failures come
    /// back as a [`WindowInitError`] inside the `anyhow::Error`.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut event_loop = create_event_loop()?;
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height));
        let mut window_state = WindowState::new(attributes);

        for _ in 0..WINDOW_CREATE_ATTEMPTS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut window_state)
            {
                return Err(WindowInitError::new(
                    "window",
                    format!("event loop exited with code {code}"),
                )
                .into());
            }
            if window_state.window.is_some() || window_state.create_error.is_some() {
                break;
            }
        }
        if let Some(err) = window_state.create_error.take() {
            return Err(WindowInitError::new("window", err).into());
        }
        let window = window_state
            .window
            .clone()
            .ok_or_else(|| WindowInitError::new("window", "the event loop never resumed"))?;

        let gpu = pollster::block_on(Gpu::new(window, config.msaa_samples))?;
        info!(
            "opened {}x{} window \"{}\" ({}x MSAA)",
            config.window_width, config.window_height, config.title, gpu.target.samples
        );

        Ok(Self {
            gpu,
            programs: Vec::new(),
            frame: FrameCommands::default(),
            camera: None,
            active_shader: None,
            last_frame: Instant::now(),
            frame_delta: 0.0,
            window_state,
            event_loop,
        })
    }

    fn program_index(&self, shader: ShaderHandle) -> Option<usize> {
        let index = usize::try_from(shader.0).ok()?.checked_sub(1)?;
        (index < self.programs.len()).then_some(index)
    }

    fn program(&self, shader: ShaderHandle) -> Option<&Program> {
        self.program_index(shader).map(|index| &self.programs[index])
    }
}

impl WindowBackend for NativeBackend {
    fn should_close(&mut self) -> bool {
        if let PumpStatus::Exit(_) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.window_state)
        {
            self.window_state.close_requested = true;
        }
        if let Some(size) = self.window_state.resized.take() {
            self.gpu.resize(size);
        }
        self.window_state.close_requested
    }

    fn begin_frame(&mut self) {
        self.frame = FrameCommands::default();
        self.camera = None;
        self.active_shader = None;
    }

    fn end_frame(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        match self.gpu.render(&frame, &self.programs) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU is out of memory; frame dropped");
            }
            Err(other) => {
                warn!("surface error ({other}); retrying next frame");
            }
        }
        let now = Instant::now();
        self.frame_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
    }

    fn clear(&mut self, color: Color) {
        self.frame.clear = Some(color);
    }

    fn frame_delta_seconds(&self) -> f32 {
        self.frame_delta
    }
}

impl ShaderBackend for NativeBackend {
    fn load_shader(&mut self, vertex: &Path, fragment: &Path) -> ShaderHandle {
        let sources = read_stage(vertex).and_then(|v| read_stage(fragment).map(|f| (v, f)));
        let (vertex_source, fragment_source) = match sources {
            Ok(sources) => sources,
            Err(err) => {
                warn!("{err:#}");
                return ShaderHandle::DEFAULT;
            }
        };
        match self.gpu.lit_pipeline(&vertex_source, &fragment_source) {
            Ok(pipeline) => {
                self.programs.push(Program {
                    pipeline,
                    source: vertex_source + "\n" + &fragment_source,
                    uniforms: UniformBlock::new(),
                });
                ShaderHandle(self.programs.len() as u32)
            }
            Err(err) => {
                warn!(
                    "shader {} + {} rejected: {err:#}",
                    vertex.display(),
                    fragment.display()
                );
                ShaderHandle::DEFAULT
            }
        }
    }

    fn uniform_location(&self, shader: ShaderHandle, name: &str) -> UniformLocation {
        self.program(shader)
            .filter(|program| uniforms::source_declares(&program.source, name))
            .and_then(|_| uniforms::lookup(name))
            .unwrap_or(UniformLocation::INVALID)
    }

    fn set_uniform(&mut self, shader: ShaderHandle, location: UniformLocation, value: UniformValue) {
        let written = match self.program_index(shader) {
            Some(index) => self.programs[index].uniforms.write(location, value),
            None => false,
        };
        if !written {
            debug!("dropped uniform write to {location:?} of program {}", shader.0);
        }
    }
}

impl DrawBackend for NativeBackend {
    fn begin_mode_3d(&mut self, camera: &Camera) {
        self.camera = Some(*camera);
    }

    fn end_mode_3d(&mut self) {
        self.camera = None;
    }

    fn begin_shader_mode(&mut self, shader: ShaderHandle) {
        self.active_shader = Some(shader);
    }

    fn end_shader_mode(&mut self) {
        self.active_shader = None;
    }

    fn draw_cube(&mut self, center: Vec3, width: f32, height: f32, depth: f32, color: Color) {
        let view_proj = match &self.camera {
            Some(camera) => camera.view_projection(self.gpu.aspect()),
            None => self.gpu.screen_projection(),
        };
        let model = Mat4::from_translation(center) * Mat4::from_scale(Vec3::new(width, height, depth));
        let model3 = Mat3::from_mat4(model);
        let normal = if model3.determinant().abs() > f32::EPSILON {
            model3.inverse().transpose()
        } else {
            Mat3::IDENTITY
        };
        let program = self
            .active_shader
            .and_then(|shader| self.program_index(shader));
        let lighting = program
            .map(|index| *self.programs[index].uniforms.values())
            .unwrap_or_default();

        self.frame.draws.push(DrawCommand {
            program,
            uniform: DrawUniform {
                view_proj: view_proj.to_cols_array_2d(),
                model: model.to_cols_array_2d(),
                normal: mat3_to_3x4(normal),
                color: self.gpu.shade(color),
            },
            lighting,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: i32, color: Color) {
        let color = self.gpu.shade(color);
        let (width, height) = self.gpu.surface_size();
        let to_ndc = |px: f32, py: f32| [px / width * 2.0 - 1.0, 1.0 - py / height * 2.0];
        for quad in font::layout_text(text, x as f32, y as f32, size as f32) {
            let [left, top] = to_ndc(quad.min[0], quad.min[1]);
            let [right, bottom] = to_ndc(quad.max[0], quad.max[1]);
            for position in [
                [left, top],
                [left, bottom],
                [right, bottom],
                [left, top],
                [right, bottom],
                [right, top],
            ] {
                self.frame.overlay.push(OverlayVertex { position, color });
            }
        }
    }
}

fn read_stage(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read shader stage {}", path.display()))
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Receives winit callbacks while the backend pumps the event loop.
struct WindowState {
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    create_error: Option<OsError>,
    close_requested: bool,
    resized: Option<PhysicalSize<u32>>,
}

impl WindowState {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes,
            window: None,
            create_error: None,
            close_requested: false,
            resized: None,
        }
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.create_error.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => self.create_error = Some(err),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|window| window.id()) != Some(window_id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(size) => self.resized = Some(size),
            _ => {}
        }
    }
}

struct Program {
    pipeline: wgpu::RenderPipeline,
    source: String,
    uniforms: UniformBlock,
}

/// Work recorded between `begin_frame` and `end_frame`.
#[derive(Default)]
struct FrameCommands {
    clear: Option<Color>,
    draws: Vec<DrawCommand>,
    overlay: Vec<OverlayVertex>,
}

struct DrawCommand {
    /// Index into the loaded programs; `None` draws with the default program.
    program: Option<usize>,
    uniform: DrawUniform,
    lighting: LightingUniforms,
}

#[derive(Clone, Copy)]
struct TargetFormat {
    color: wgpu::TextureFormat,
    samples: u32,
}

/// Device, surface and the fixed pipelines.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    target: TargetFormat,
    depth: RenderTarget,
    msaa: Option<RenderTarget>,
    draw_layout: wgpu::BindGroupLayout,
    mesh_layout: wgpu::PipelineLayout,
    default_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    cube: MeshBuffers,
}

impl Gpu {
    async fn new(window: Arc<Window>, requested_samples: u32) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orbit-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no supported formats")?;

        let samples = if requested_samples <= 1 {
            1
        } else if adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(requested_samples)
        {
            requested_samples
        } else {
            warn!("{requested_samples}x MSAA unsupported for {surface_format:?}; rendering without it");
            1
        };
        let target = TargetFormat {
            color: surface_format,
            samples,
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| {
                    matches!(
                        mode,
                        wgpu::PresentMode::Mailbox | wgpu::PresentMode::Immediate
                    )
                })
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = RenderTarget::depth(&device, config.width, config.height, samples);
        let msaa = RenderTarget::multisampled(&device, target, config.width, config.height);

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw-bind-layout"),
            entries: &[
                uniform_layout_entry(0, std::mem::size_of::<DrawUniform>()),
                uniform_layout_entry(1, std::mem::size_of::<LightingUniforms>()),
            ],
        });
        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh-pipeline-layout"),
            bind_group_layouts: &[&draw_layout],
            push_constant_ranges: &[],
        });

        let default_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("default-shader"),
            source: wgpu::ShaderSource::Wgsl(DEFAULT_SHADER.into()),
        });
        let default_pipeline = mesh_pipeline(
            &device,
            &mesh_layout,
            target,
            "default-pipeline",
            &default_module,
            &default_module,
        );
        let overlay_pipeline = overlay_pipeline(&device, target);

        let cube = MeshBuffers::new(&device, CUBE_VERTICES, CUBE_INDICES, "cube");

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            target,
            depth,
            msaa,
            draw_layout,
            mesh_layout,
            default_pipeline,
            overlay_pipeline,
            cube,
        })
    }

    /// Compiles a lit pipeline from the two stage sources. Validation errors
    /// are captured instead of aborting the process.
    fn lit_pipeline(&self, vertex_source: &str, fragment_source: &str) -> Result<wgpu::RenderPipeline> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lighting-vertex"),
            source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lighting-fragment"),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });
        let pipeline = mesh_pipeline(
            &self.device,
            &self.mesh_layout,
            self.target,
            "lighting-pipeline",
            &vertex,
            &fragment,
        );
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(pipeline),
        }
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn surface_size(&self) -> (f32, f32) {
        (self.config.width.max(1) as f32, self.config.height.max(1) as f32)
    }

    /// Pixel-space projection used for draws outside a 3D block.
    fn screen_projection(&self) -> Mat4 {
        let (width, height) = self.surface_size();
        Mat4::orthographic_rh(0.0, width, height, 0.0, -1000.0, 1000.0)
    }

    /// Shader-ready color for the current surface format.
    fn shade(&self, color: Color) -> [f32; 4] {
        let [r, g, b, a] = color.to_normalized();
        if self.target.color.is_srgb() {
            [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
        } else {
            [r, g, b, a]
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth = RenderTarget::depth(
            &self.device,
            self.config.width,
            self.config.height,
            self.target.samples,
        );
        self.msaa =
            RenderTarget::multisampled(&self.device, self.target, self.config.width, self.config.height);
    }

    fn render(&mut self, frame: &FrameCommands, programs: &[Program]) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let bind_groups: Vec<wgpu::BindGroup> = frame
            .draws
            .iter()
            .map(|draw| self.draw_bind_group(draw))
            .collect();
        let overlay = (!frame.overlay.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("overlay-vertices"),
                    contents: bytemuck::cast_slice(&frame.overlay),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let [r, g, b, a] = self.shade(frame.clear.unwrap_or(Color::BLACK));
        let (target_view, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(r),
                        g: f64::from(g),
                        b: f64::from(b),
                        a: f64::from(a),
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_vertex_buffer(0, self.cube.vertex.slice(..));
        pass.set_index_buffer(self.cube.index.slice(..), wgpu::IndexFormat::Uint32);
        for (draw, bind_group) in frame.draws.iter().zip(&bind_groups) {
            let pipeline = draw
                .program
                .and_then(|index| programs.get(index))
                .map_or(&self.default_pipeline, |program| &program.pipeline);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw_indexed(0..self.cube.index_count, 0, 0..1);
        }

        if let Some(buffer) = &overlay {
            pass.set_pipeline(&self.overlay_pipeline);
            pass.set_vertex_buffer(0, buffer.slice(..));
            pass.draw(0..frame.overlay.len() as u32, 0..1);
        }

        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }

    fn draw_bind_group(&self, draw: &DrawCommand) -> wgpu::BindGroup {
        let draw_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("draw-uniform"),
                contents: bytemuck::bytes_of(&draw.uniform),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let lighting_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lighting-uniform"),
                contents: bytemuck::bytes_of(&draw.lighting),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-bind-group"),
            layout: &self.draw_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: draw_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        })
    }
}

fn uniform_layout_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    target: TargetFormat,
    label: &str,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (6 * std::mem::size_of::<f32>()) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &MESH_ATTRIBUTES,
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: RenderTarget::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: target.samples,
            ..Default::default()
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.color,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

fn overlay_pipeline(device: &wgpu::Device, target: TargetFormat) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("overlay-shader"),
        source: wgpu::ShaderSource::Wgsl(OVERLAY_SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("overlay-pipeline-layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("overlay-pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<OverlayVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &OVERLAY_ATTRIBUTES,
            }],
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: RenderTarget::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: target.samples,
            ..Default::default()
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.color,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn new(device: &wgpu::Device, vertices: &[f32], indices: &[u32], label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: indices.len() as u32,
        }
    }
}

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn depth(device: &wgpu::Device, width: u32, height: u32, samples: u32) -> Self {
        Self::create(device, "depth-texture", Self::DEPTH_FORMAT, width, height, samples)
    }

    /// Multisampled color target, or `None` when MSAA is off.
    fn multisampled(device: &wgpu::Device, target: TargetFormat, width: u32, height: u32) -> Option<Self> {
        (target.samples > 1).then(|| {
            Self::create(device, "msaa-texture", target.color, width, height, target.samples)
        })
    }

    fn create(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: samples,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct OverlayVertex {
    position: [f32; 2],
    color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 192);
        assert_eq!(std::mem::size_of::<OverlayVertex>(), 24);
    }

    #[test]
    fn normal_matrix_is_padded_per_column() {
        let packed = mat3_to_3x4(Mat3::from_diagonal(Vec3::new(2.0, 3.0, 4.0)));
        assert_eq!(packed[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(packed[1], [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(packed[2], [0.0, 0.0, 4.0, 0.0]);
    }

    #[test]
    fn srgb_conversion_keeps_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }
}
