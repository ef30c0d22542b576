//! Font discovery and glyph atlases.
//!
//! Text is rasterized once per [`TextStyle`] into an `R8Unorm` atlas. The font
//! comes from an explicit path if one is configured, otherwise from a list of
//! common system locations. Without any usable font the app still runs, just
//! without text.

use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::FontError;
use crate::gpu::GpuContext;
use crate::ui::TextStyle;

/// Fonts probed when no explicit path is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Candidate font paths in probe order: the explicit one first, then system fonts.
pub fn font_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// Load and parse the first usable font among `candidates`.
pub fn load_font(candidates: &[PathBuf]) -> Result<(PathBuf, Font), FontError> {
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match parse_font(path) {
            Ok(font) => return Ok((path.clone(), font)),
            Err(err) => log::warn!("[assets] {err}"),
        }
    }
    Err(FontError::NotFound(candidates.len()))
}

fn parse_font(path: &Path) -> Result<Font, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Font::from_bytes(data, FontSettings::default()).map_err(|reason| FontError::Parse {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

/// Characters rasterized into every atlas: printable ASCII plus Latin-1.
pub fn atlas_charset() -> impl Iterator<Item = char> {
    (0x20u32..=0x7E)
        .chain(0xA0..=0xFF)
        .filter_map(char::from_u32)
}

/// Information about a single glyph in the font atlas.
#[derive(Clone, Copy, Debug)]
pub struct GlyphInfo {
    /// UV rectangle in the atlas (x, y, width, height) normalized to [0, 1].
    pub uv: [f32; 4],
    pub width: u32,
    pub height: u32,
    /// Offset from the cursor position to where the glyph should be drawn.
    pub offset_x: f32,
    pub offset_y: f32,
    /// How far to advance the cursor after this glyph.
    pub advance: f32,
}

/// A font rasterized at one size into a GPU texture.
pub struct FontAtlas {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    pub fn new(gpu: &GpuContext, font: &Font, size: f32) -> Self {
        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = atlas_charset()
            .map(|c| {
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        // Simple row packing; grow the smaller side until everything fits.
        let padding = 1u32;
        let mut atlas_width = 512u32;
        let mut atlas_height = 512u32;
        while !Self::fits(&rasterized, atlas_width, atlas_height, padding) {
            if atlas_width <= atlas_height {
                atlas_width *= 2;
            } else {
                atlas_height *= 2;
            }
        }

        let mut atlas_data = vec![0u8; (atlas_width * atlas_height) as usize];
        let mut glyphs = HashMap::new();
        let mut x = padding;
        let mut y = padding;
        let mut row_height = 0u32;

        for (c, metrics, bitmap) in &rasterized {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;

            if x + glyph_w + padding > atlas_width {
                x = padding;
                y += row_height + padding;
                row_height = 0;
            }

            for gy in 0..glyph_h {
                let src = (gy * glyph_w) as usize;
                let dst = ((y + gy) * atlas_width + x) as usize;
                atlas_data[dst..dst + glyph_w as usize]
                    .copy_from_slice(&bitmap[src..src + glyph_w as usize]);
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / atlas_width as f32,
                        y as f32 / atlas_height as f32,
                        glyph_w as f32 / atlas_width as f32,
                        glyph_h as f32 / atlas_height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );

            x += glyph_w + padding;
            row_height = row_height.max(glyph_h);
        }

        let extent = wgpu::Extent3d {
            width: atlas_width,
            height: atlas_height,
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas_width),
                rows_per_image: Some(atlas_height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Self {
            texture,
            view,
            sampler,
            glyphs,
            size,
            line_height,
        }
    }

    fn fits(
        rasterized: &[(char, fontdue::Metrics, Vec<u8>)],
        width: u32,
        height: u32,
        padding: u32,
    ) -> bool {
        let mut x = padding;
        let mut y = padding;
        let mut row_height = 0u32;
        for (_, metrics, _) in rasterized {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;
            if x + glyph_w + padding > width {
                x = padding;
                y += row_height + padding;
                row_height = 0;
            }
            if y + glyph_h + padding > height {
                return false;
            }
            x += glyph_w + padding;
            row_height = row_height.max(glyph_h);
        }
        true
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Advance width of a string. Missing glyphs count as half an em.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.glyphs.get(&c).map_or(self.size * 0.5, |g| g.advance))
            .sum()
    }
}

/// One atlas per text style.
pub struct Fonts {
    atlases: HashMap<TextStyle, FontAtlas>,
    source: PathBuf,
}

impl Fonts {
    /// Find a font and rasterize every style. Returns `None` (after logging
    /// why) when no font is usable; text is then skipped.
    pub fn discover(gpu: &GpuContext, explicit: Option<&Path>) -> Option<Self> {
        let candidates = font_candidates(explicit);
        match load_font(&candidates) {
            Ok((source, font)) => {
                log::info!("[assets] font {}", source.display());
                let atlases = TextStyle::ALL
                    .iter()
                    .map(|&style| (style, FontAtlas::new(gpu, &font, style.pixel_size())))
                    .collect();
                Some(Self { atlases, source })
            }
            Err(err) => {
                log::warn!("[assets] {err}; text will not be drawn");
                None
            }
        }
    }

    pub fn atlas(&self, style: TextStyle) -> Option<&FontAtlas> {
        self.atlases.get(&style)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}
