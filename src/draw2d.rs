//! GPU batch renderer for canvas layers and text.
//!
//! A [`Draw2d`] collects the triangles of one [`Layer`] plus any text runs,
//! uploads them once per frame and draws them in a single pass. Every vertex
//! goes through the same [`Pose`] uniform: a zoom around the screen center and
//! an opacity multiplier, which is how scene transitions reach the overlay.

use glam::Vec2;
use std::collections::HashMap;

use crate::assets::{FontAtlas, Fonts};
use crate::canvas::{Layer, Vertex2d};
use crate::gpu::GpuContext;
use crate::scene::Pose;
use crate::ui::{Align, TextRun, TextStyle};

const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex2d>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        // position
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        },
        // uv
        wgpu::VertexAttribute {
            offset: 8,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x2,
        },
        // color
        wgpu::VertexAttribute {
            offset: 16,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x4,
        },
    ],
};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    scale: f32,
    opacity: f32,
}

const INITIAL_VERTICES: usize = 16384;

/// Alpha blending shared by both pipelines.
const BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Batched 2D drawing for one target format.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    /// Vertex capacity of `vertex_buffer`.
    capacity: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    font_bind_groups: HashMap<TextStyle, wgpu::BindGroup>,

    colored_vertices: Vec<Vertex2d>,
    text_batches: Vec<(TextStyle, Vec<Vertex2d>)>,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext, format: wgpu::TextureFormat, fonts: Option<&Fonts>) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(DRAW2D_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let colored_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Colored Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Textured Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, layout: &wgpu::PipelineLayout, fragment: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[VERTEX_LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(BLEND),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let colored_pipeline = pipeline("Draw2d Colored Pipeline", &colored_layout, "fs_colored");
        let textured_pipeline =
            pipeline("Draw2d Textured Pipeline", &textured_layout, "fs_textured");

        let font_bind_groups = fonts
            .map(|fonts| {
                TextStyle::ALL
                    .iter()
                    .filter_map(|&style| {
                        let atlas = fonts.atlas(style)?;
                        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                            label: Some("Font Bind Group"),
                            layout: &texture_bind_group_layout,
                            entries: &[
                                wgpu::BindGroupEntry {
                                    binding: 0,
                                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 1,
                                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                                },
                            ],
                        });
                        Some((style, group))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            colored_pipeline,
            textured_pipeline,
            vertex_buffer: Self::create_vertex_buffer(gpu, INITIAL_VERTICES),
            capacity: INITIAL_VERTICES,
            uniform_buffer,
            uniform_bind_group,
            font_bind_groups,
            colored_vertices: Vec::with_capacity(1024),
            text_batches: Vec::new(),
        }
    }

    fn create_vertex_buffer(gpu: &GpuContext, vertices: usize) -> wgpu::Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (vertices * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Drop everything queued for the previous frame.
    pub fn clear(&mut self) {
        self.colored_vertices.clear();
        self.text_batches.clear();
    }

    /// Queue the triangles of a canvas layer.
    pub fn layer(&mut self, layer: &Layer) {
        self.colored_vertices.extend_from_slice(layer.vertices());
    }

    /// Queue a text run, wrapping and centering with the style's atlas metrics.
    pub fn text(&mut self, fonts: &Fonts, run: &TextRun) {
        let Some(font) = fonts.atlas(run.style) else {
            return;
        };
        let batch = match self.text_batches.iter().position(|(s, _)| *s == run.style) {
            Some(i) => i,
            None => {
                self.text_batches.push((run.style, Vec::new()));
                self.text_batches.len() - 1
            }
        };
        let vertices = &mut self.text_batches[batch].1;

        for (i, line) in run.lines(|s| font.measure(s)).iter().enumerate() {
            let width = font.measure(line);
            let x = match run.align {
                Align::Left => run.x,
                Align::Center => run.x - width / 2.0,
            };
            let y = run.y + i as f32 * font.line_height();
            push_line(vertices, font, line, Vec2::new(x, y), run.color.to_array());
        }
    }

    /// Upload this frame's vertices and pose. Grows the vertex buffer if needed.
    pub fn prepare(&mut self, gpu: &GpuContext, resolution: Vec2, pose: Pose) {
        let uniforms = Draw2dUniforms {
            resolution: resolution.to_array(),
            scale: pose.scale,
            opacity: pose.opacity,
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let total = self.colored_vertices.len()
            + self.text_batches.iter().map(|(_, v)| v.len()).sum::<usize>();
        if total > self.capacity {
            self.capacity = total.next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(gpu, self.capacity);
            log::debug!("[draw2d] vertex buffer grown to {}", self.capacity);
        }

        let stride = std::mem::size_of::<Vertex2d>();
        let mut offset = 0;
        if !self.colored_vertices.is_empty() {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.colored_vertices),
            );
            offset += self.colored_vertices.len();
        }
        for (_, vertices) in &self.text_batches {
            if vertices.is_empty() {
                continue;
            }
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (offset * stride) as u64,
                bytemuck::cast_slice(vertices),
            );
            offset += vertices.len();
        }
    }

    /// Draw everything uploaded by [`prepare`](Self::prepare).
    pub fn render(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        if !self.colored_vertices.is_empty() {
            render_pass.set_pipeline(&self.colored_pipeline);
            render_pass.draw(0..self.colored_vertices.len() as u32, 0..1);
        }

        let mut offset = self.colored_vertices.len();
        for (style, vertices) in &self.text_batches {
            if vertices.is_empty() {
                continue;
            }
            let start = offset;
            offset += vertices.len();
            let Some(bind_group) = self.font_bind_groups.get(style) else {
                continue;
            };
            render_pass.set_pipeline(&self.textured_pipeline);
            render_pass.set_bind_group(1, bind_group, &[]);
            render_pass.draw(start as u32..offset as u32, 0..1);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colored_vertices.is_empty() && self.text_batches.iter().all(|(_, v)| v.is_empty())
    }
}

/// Append glyph quads for one line of text with its top-left at `origin`.
fn push_line(
    vertices: &mut Vec<Vertex2d>,
    font: &FontAtlas,
    line: &str,
    origin: Vec2,
    color: [f32; 4],
) {
    let mut cursor_x = origin.x;
    let baseline_y = origin.y + font.size();

    for ch in line.chars() {
        let Some(glyph) = font.glyph(ch) else {
            cursor_x += font.size() * 0.5;
            continue;
        };

        if glyph.width > 0 && glyph.height > 0 {
            // fontdue's ymin is the distance from the baseline to the glyph's bottom.
            let gx = cursor_x + glyph.offset_x;
            let gy = baseline_y - glyph.offset_y - glyph.height as f32;
            let gw = glyph.width as f32;
            let gh = glyph.height as f32;

            let u0 = glyph.uv[0];
            let v0 = glyph.uv[1];
            let u1 = u0 + glyph.uv[2];
            let v1 = v0 + glyph.uv[3];

            let corner = |x: f32, y: f32, u: f32, v: f32| Vertex2d {
                position: [x, y],
                uv: [u, v],
                color,
            };
            vertices.extend_from_slice(&[
                corner(gx, gy, u0, v0),
                corner(gx + gw, gy, u1, v0),
                corner(gx, gy + gh, u0, v1),
                corner(gx + gw, gy, u1, v0),
                corner(gx + gw, gy + gh, u1, v1),
                corner(gx, gy + gh, u0, v1),
            ]);
        }

        cursor_x += glyph.advance;
    }
}

const DRAW2D_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2f,
    scale: f32,
    opacity: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexIn {
    @location(0) position: vec2f,
    @location(1) uv: vec2f,
    @location(2) color: vec4f,
}

struct VertexOut {
    @builtin(position) clip: vec4f,
    @location(0) uv: vec2f,
    @location(1) color: vec4f,
}

// Canvas colors are sRGB; targets are sRGB formats that expect linear output.
fn to_linear(c: vec3f) -> vec3f {
    return pow(c, vec3f(2.2));
}

@vertex
fn vs(in: VertexIn) -> VertexOut {
    let center = u.resolution * 0.5;
    let p = center + (in.position - center) * u.scale;
    let ndc = vec2f(p.x / u.resolution.x * 2.0 - 1.0, 1.0 - p.y / u.resolution.y * 2.0);

    var out: VertexOut;
    out.clip = vec4f(ndc, 0.0, 1.0);
    out.uv = in.uv;
    out.color = vec4f(to_linear(in.color.rgb), in.color.a * u.opacity);
    return out;
}

@fragment
fn fs_colored(in: VertexOut) -> @location(0) vec4f {
    return in.color;
}

@group(1) @binding(0) var glyph_texture: texture_2d<f32>;
@group(1) @binding(1) var glyph_sampler: sampler;

@fragment
fn fs_textured(in: VertexOut) -> @location(0) vec4f {
    let coverage = textureSample(glyph_texture, glyph_sampler, in.uv).r;
    return vec4f(in.color.rgb, in.color.a * coverage);
}
"#;
