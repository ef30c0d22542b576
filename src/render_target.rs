//! The persistent off-screen target a scene's effects layer is drawn into.

use crate::canvas::LoadAction;
use crate::gpu::GpuContext;
use crate::ui::Color;

/// Scene render target.
///
/// It survives across frames, so a renderer that does not clear sees its
/// previous frame underneath whatever it draws next. That is how low-alpha
/// fades leave trails. The target is both a color attachment and a sampled
/// texture for the composite pass.
pub struct SceneTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    /// Nothing has been drawn since (re)creation, so the first pass must clear.
    fresh: bool,
}

impl SceneTarget {
    pub fn new(gpu: &GpuContext) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Target"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width: gpu.width(),
            height: gpu.height(),
            fresh: true,
        }
    }

    /// Recreate the target if the surface size changed. Returns true if it did.
    pub fn ensure_size(&mut self, gpu: &GpuContext) -> bool {
        if self.width != gpu.width() || self.height != gpu.height() {
            *self = Self::new(gpu);
            true
        } else {
            false
        }
    }

    /// Load operation for this frame's scene pass.
    pub fn load_op(&mut self, action: LoadAction) -> wgpu::LoadOp<wgpu::Color> {
        let op = match action {
            LoadAction::Clear(color) => wgpu::LoadOp::Clear(clear_color(color)),
            LoadAction::Load if self.fresh => wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            LoadAction::Load => wgpu::LoadOp::Load,
        };
        self.fresh = false;
        op
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Clear colors bypass the shader, so convert from sRGB here.
fn clear_color(color: Color) -> wgpu::Color {
    let linear = |c: f32| f64::from(c.clamp(0.0, 1.0)).powf(2.2);
    wgpu::Color {
        r: linear(color.r),
        g: linear(color.g),
        b: linear(color.b),
        a: f64::from(color.a),
    }
}
