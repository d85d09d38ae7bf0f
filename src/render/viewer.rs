//! Presentation layer: winit window, wgpu device, input normalization and
//! the per-frame hand-off from the gallery's parameter records to GPU
//! uniforms.
//!
//! The atlas is built on a background thread owning a tokio runtime and
//! arrives over a channel; until then every frame is a plain clear.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossbeam_channel as xchan;
use glam::{Mat4, Vec3};
use tracing::{info, warn};
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::atlas::{self, Atlas};
use crate::config::Configuration;
use crate::gallery::Gallery;
use crate::layout::InstanceRaw;
use crate::scroll::ScrollState;

const FOV_Y_DEG: f32 = 50.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 200.0;
/// Width and height of the centered plane, world units.
const CENTER_PLANE: [f32; 2] = [1.7, 2.3];
/// Rough pixels-per-line factor for line-based wheel deltas.
const LINE_HEIGHT_PX: f32 = 40.0;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

// UV origin bottom-left; the shaders flip into texture space themselves.
const QUAD: [Vertex; 4] = [
    Vertex {
        pos: [-1.0, -1.0],
        uv: [0.0, 0.0],
    }, // bottom-left
    Vertex {
        pos: [1.0, -1.0],
        uv: [1.0, 0.0],
    }, // bottom-right
    Vertex {
        pos: [-1.0, 1.0],
        uv: [0.0, 1.0],
    }, // top-left
    Vertex {
        pos: [1.0, 1.0],
        uv: [1.0, 1.0],
    }, // top-right
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CylinderUniforms {
    view_proj: [[f32; 4]; 4],
    time: f32,
    scroll: f32,
    speed: f32,
    direction: f32,
    z_range: f32,
    max_z: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CenterUniforms {
    view_proj: [[f32; 4]; 4],
    uv_rect: [f32; 4],
    size: [f32; 2],
    _pad: [f32; 2],
}

/// Run the gallery window until closed.
///
/// # Errors
/// Returns an error if the event loop or the rendering backend fails to
/// initialize.
pub fn run_gallery(cfg: Configuration, paths: Vec<PathBuf>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(cfg, paths);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct Tex {
    _tex: wgpu::Texture,
    view: wgpu::TextureView,
}

struct Gpu {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

/// GPU resources that exist only once a non-empty atlas has arrived.
struct SceneResources {
    cylinder_pipeline: wgpu::RenderPipeline,
    cylinder_bind: wgpu::BindGroup,
    cylinder_ubuf: wgpu::Buffer,
    center_pipeline: wgpu::RenderPipeline,
    center_bind: wgpu::BindGroup,
    center_ubuf: wgpu::Buffer,
    quad_vbuf: wgpu::Buffer,
    instance_buf: wgpu::Buffer,
    instance_count: u32,
}

struct App {
    cfg: Configuration,
    gallery: Gallery,

    // atlas loading
    pending_paths: Option<Vec<PathBuf>>,
    rx_atlas: xchan::Receiver<Atlas>,
    atlas_tex: Option<Tex>,

    // window/gpu
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    scene: Option<SceneResources>,

    started: Instant,
    last_touch_y: Option<f64>,
    last_direction: f32,
}

impl App {
    fn new(cfg: Configuration, paths: Vec<PathBuf>) -> Self {
        // replaced once the loader thread is started in `resumed`
        let (_tx_dummy, rx_atlas) = xchan::unbounded::<Atlas>();

        let gallery = Gallery::new(
            cfg.layout_params(),
            cfg.layout_seed,
            ScrollState::new(cfg.idle_drift, cfg.smoothing),
        );

        Self {
            cfg,
            gallery,
            pending_paths: Some(paths),
            rx_atlas,
            atlas_tex: None,
            window: None,
            gpu: None,
            scene: None,
            started: Instant::now(),
            last_touch_y: None,
            last_direction: 1.0,
        }
    }

    /// World-space height of the viewport at the origin, as seen from the
    /// reference camera depth. Input deltas are scaled by this so a
    /// full-window swipe moves a full world viewport.
    fn world_viewport_height(&self) -> f32 {
        2.0 * (FOV_Y_DEG.to_radians() / 2.0).tan() * self.cfg.camera_z
    }

    fn feed_scroll_pixels(&mut self, pixel_delta: f32) {
        let win_h = self
            .window
            .as_ref()
            .map_or(1.0, |w| w.inner_size().height.max(1) as f32);
        if pixel_delta != 0.0 {
            self.last_direction = pixel_delta.signum();
        }
        let delta = pixel_delta * self.world_viewport_height() / win_h;
        self.gallery.update_scroll(delta, self.last_direction);
    }

    fn view_proj(&self) -> Mat4 {
        let (w, h) = self
            .gpu
            .as_ref()
            .map_or((1, 1), |g| (g.config.width.max(1), g.config.height.max(1)));
        let proj = Mat4::perspective_rh(
            FOV_Y_DEG.to_radians(),
            w as f32 / h as f32,
            Z_NEAR,
            Z_FAR,
        );
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, self.cfg.camera_z), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    /// Install a finished atlas: upload the bitmap (placeholder included)
    /// and, for a non-empty image sequence, build both render surfaces.
    fn install_atlas(&mut self, atlas: Atlas) {
        let Some(gpu) = &self.gpu else { return };

        let tex = upload_texture(&gpu.device, &gpu.queue, &atlas.pixels, atlas.width, atlas.height);
        self.atlas_tex = Some(tex);

        self.gallery.install_atlas(atlas.images);
        let Some(layout) = self.gallery.layout() else {
            info!("no images loaded; gallery stays empty");
            return;
        };

        let atlas_view = &self.atlas_tex.as_ref().expect("atlas texture just set").view;
        self.scene = Some(build_scene(gpu, atlas_view, &layout.instances));
        info!(
            images = self.gallery.images().len(),
            instances = layout.instances.len(),
            "gallery surfaces created"
        );
    }

    fn draw(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f32();
        self.gallery.render(elapsed);

        let Some(gpu) = &self.gpu else { return };
        let Ok(frame) = gpu.surface.get_current_texture() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(scene) = &self.scene {
            let vp = self.view_proj().to_cols_array_2d();
            if let (Some(cyl), Some(center)) =
                (self.gallery.cylinder_params(), self.gallery.center_params())
            {
                let cu = CylinderUniforms {
                    view_proj: vp,
                    time: cyl.time,
                    scroll: cyl.scroll,
                    speed: cyl.speed,
                    direction: cyl.direction,
                    z_range: cyl.z_range,
                    max_z: cyl.max_z,
                    _pad: [0.0; 2],
                };
                gpu.queue
                    .write_buffer(&scene.cylinder_ubuf, 0, bytemuck::bytes_of(&cu));

                let ce = CenterUniforms {
                    view_proj: vp,
                    uv_rect: center.uv.to_array(),
                    size: CENTER_PLANE,
                    _pad: [0.0; 2],
                };
                gpu.queue
                    .write_buffer(&scene.center_ubuf, 0, bytemuck::bytes_of(&ce));
            }
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gallery_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.03,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(scene) = &self.scene {
                rpass.set_pipeline(&scene.cylinder_pipeline);
                rpass.set_bind_group(0, &scene.cylinder_bind, &[]);
                rpass.set_vertex_buffer(0, scene.quad_vbuf.slice(..));
                rpass.set_vertex_buffer(1, scene.instance_buf.slice(..));
                rpass.draw(0..4, 0..scene.instance_count);

                rpass.set_pipeline(&scene.center_pipeline);
                rpass.set_bind_group(0, &scene.center_bind, &[]);
                rpass.set_vertex_buffer(0, scene.quad_vbuf.slice(..));
                rpass.draw(0..4, 0..1);
            }
        }

        gpu.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("photo carousel")
            .with_inner_size(LogicalSize::new(1280.0, 800.0));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        self.window = Some(window.clone());

        // ----- background atlas build -----
        if let Some(paths) = self.pending_paths.take() {
            let (tx, rx) = xchan::bounded::<Atlas>(1);
            self.rx_atlas = rx;
            std::thread::spawn(move || {
                let rt = match tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        warn!("atlas runtime failed to start: {e}");
                        return;
                    }
                };
                let atlas = rt.block_on(atlas::build_atlas(&paths));
                // receiver may be gone if the window closed already
                let _ = tx.send(atlas);
            });
        }

        // ----- GPU init -----
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let gpu_init = async move {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .context("no compatible GPU adapter found")?;

            let (device, queue) = adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("device"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::default(),
                        memory_hints: wgpu::MemoryHints::Performance,
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
                .unwrap_or(caps.formats[0]);
            let PhysicalSize { width, height } = window.inner_size();
            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: width.max(1),
                height: height.max(1),
                present_mode: wgpu::PresentMode::AutoVsync,
                alpha_mode: caps.alpha_modes[0],
                view_formats: vec![],
                desired_maximum_frame_latency: 1,
            };
            surface.configure(&device, &config);

            Ok::<Gpu, anyhow::Error>(Gpu {
                _instance: instance,
                surface,
                _adapter: adapter,
                device,
                queue,
                config,
            })
        };

        self.gpu = Some(pollster::block_on(gpu_init).expect("GPU init"));
        self.started = Instant::now();
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(win) = &self.window else { return };
        if win.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => std::process::exit(0),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Released {
                    use winit::keyboard::{KeyCode, PhysicalKey};
                    if let PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) = event.physical_key {
                        std::process::exit(0)
                    }
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(gpu) = &mut self.gpu
                    && width > 0
                    && height > 0
                {
                    gpu.config.width = width;
                    gpu.config.height = height;
                    gpu.surface.configure(&gpu.device, &gpu.config);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // wheel-down scrolls forward, matching web deltaY
                let pixel_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
                    MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
                };
                self.feed_scroll_pixels(pixel_y);
            }
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => match phase {
                TouchPhase::Started => {
                    self.last_touch_y = Some(location.y);
                }
                TouchPhase::Moved => {
                    if let Some(last_y) = self.last_touch_y {
                        let delta_y = (last_y - location.y) as f32;
                        self.last_touch_y = Some(location.y);
                        self.feed_scroll_pixels(delta_y);
                    }
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.last_touch_y = None;
                }
            },
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _el: &ActiveEventLoop) {
        // receive the finished atlas (non-blocking)
        while let Ok(atlas) = self.rx_atlas.try_recv() {
            self.install_atlas(atlas);
        }

        if let Some(win) = &self.window {
            win.request_redraw();
        }
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, pixels: &[u8], w: u32, h: u32) -> Tex {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("atlas"),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        tex.as_image_copy(),
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    Tex {
        view: tex.create_view(&wgpu::TextureViewDescriptor::default()),
        _tex: tex,
    }
}

fn build_scene(gpu: &Gpu, atlas_view: &wgpu::TextureView, instances: &[InstanceRaw]) -> SceneResources {
    let device = &gpu.device;

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("atlas_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("gallery_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let cylinder_ubuf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("cylinder_uniforms"),
        size: std::mem::size_of::<CylinderUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let center_ubuf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("center_uniforms"),
        size: std::mem::size_of::<CenterUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let make_bind = |ubuf: &wgpu::Buffer, label: &str| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubuf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    };
    let cylinder_bind = make_bind(&cylinder_ubuf, "cylinder_bind");
    let center_bind = make_bind(&center_ubuf, "center_bind");

    let quad_vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("quad"),
        contents: bytemuck::cast_slice(&QUAD),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let instance_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("instances"),
        contents: bytemuck::cast_slice(instances),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };
    let instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![2 => Float32x4, 3 => Float32x4, 4 => Float32x4],
    };

    let pip_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("gallery_pl"),
        bind_group_layouts: &[&bind_layout],
        push_constant_ranges: &[],
    });

    let cylinder_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("cylinder_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cylinder.wgsl").into()),
    });
    let center_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("center_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/center.wgsl").into()),
    });

    let cylinder_pipeline = make_pipeline(
        device,
        "cylinder_pipeline",
        &cylinder_shader,
        &pip_layout,
        gpu.config.format,
        &[vertex_layout.clone(), instance_layout],
    );
    let center_pipeline = make_pipeline(
        device,
        "center_pipeline",
        &center_shader,
        &pip_layout,
        gpu.config.format,
        &[vertex_layout],
    );

    SceneResources {
        cylinder_pipeline,
        cylinder_bind,
        cylinder_ubuf,
        center_pipeline,
        center_bind,
        center_ubuf,
        quad_vbuf,
        instance_buf,
        instance_count: instances.len() as u32,
    }
}

fn make_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    pip_layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(pip_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
