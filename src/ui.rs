//! Basic 2D value types shared by the canvas, the renderers, and the GPU batches.

use glam::Vec2;

/// A rectangle in screen-space pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle of the given size centered on `center`.
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// RGBA color with straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from 8-bit channels, the way CSS `rgba()` spells them.
    pub fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    /// Parse a `#RRGGBB` or `#RRGGBBAA` hex string.
    pub fn hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();

        match digits.len() {
            6 => Some(Self::rgba8(channel(0)?, channel(2)?, channel(4)?, 1.0)),
            8 => Some(Self::rgba8(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)? as f32 / 255.0,
            )),
            _ => None,
        }
    }

    /// Same color with a replaced alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Same color with its alpha multiplied by `factor`.
    pub fn fade(self, factor: f32) -> Self {
        Self {
            a: self.a * factor.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear interpolation between two colors, channel by channel.
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Translucent backdrop behind scene captions.
    pub const PANEL: Color = Color::rgba(0.0, 0.0, 0.0, 0.5);
}

/// Horizontal anchoring of a text run relative to its `x` coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// Font size class for a text run. Each class maps to one glyph atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextStyle {
    /// Scene titles.
    Title,
    /// Caption paragraphs.
    Body,
    /// Emphasized single lines (quotes, closing lines).
    Accent,
}

impl TextStyle {
    pub const ALL: [TextStyle; 3] = [TextStyle::Title, TextStyle::Body, TextStyle::Accent];

    /// Pixel size the atlas for this style is rasterized at.
    pub fn pixel_size(self) -> f32 {
        match self {
            TextStyle::Title => 52.0,
            TextStyle::Body => 22.0,
            TextStyle::Accent => 28.0,
        }
    }
}

/// A queued piece of text. Layout (wrapping, centering) happens at upload time,
/// when glyph metrics are available.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Anchor x (left edge or center, depending on `align`).
    pub x: f32,
    /// Top of the first line.
    pub y: f32,
    pub style: TextStyle,
    pub color: Color,
    pub align: Align,
    /// Wrap width in pixels. `None` keeps the run on a single line.
    pub max_width: Option<f32>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            style,
            color: Color::WHITE,
            align: Align::Left,
            max_width: None,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn wrap(mut self, max_width: f32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    /// Break the run into lines no wider than `max_width` (if set), measuring
    /// with `measure`. Words longer than a line get a line of their own.
    pub fn lines(&self, measure: impl Fn(&str) -> f32) -> Vec<String> {
        let Some(max_width) = self.max_width else {
            return vec![self.text.clone()];
        };
        let mut lines = Vec::new();
        for paragraph in self.text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                if line.is_empty() {
                    line.push_str(word);
                    continue;
                }
                let candidate = format!("{line} {word}");
                if measure(&candidate) <= max_width {
                    line = candidate;
                } else {
                    lines.push(std::mem::take(&mut line));
                    line.push_str(word);
                }
            }
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_palette_entries() {
        let c = Color::hex("#FF5E5E").unwrap();
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 94.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);

        let half = Color::hex("#5E8AFF80").unwrap();
        assert!((half.a - 128.0 / 255.0).abs() < 1e-6);

        assert!(Color::hex("#12345").is_none());
        assert!(Color::hex("#GGGGGG").is_none());
    }

    #[test]
    fn lerp_clamps_progress() {
        let c = Color::BLACK.lerp(Color::WHITE, 2.0);
        assert_eq!(c, Color::WHITE);
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rect_contains_edges() {
        let r = Rect::centered(Vec2::new(50.0, 50.0), 20.0, 10.0);
        assert!(r.contains(Vec2::new(40.0, 45.0)));
        assert!(r.contains(Vec2::new(60.0, 55.0)));
        assert!(!r.contains(Vec2::new(61.0, 50.0)));
        assert_eq!(r.center(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn text_wraps_on_word_boundaries() {
        let measure = |s: &str| s.chars().count() as f32 * 10.0;
        let run = TextRun::new("um dois tres quatro", 0.0, 0.0, TextStyle::Body).wrap(90.0);
        assert_eq!(run.lines(measure), vec!["um dois", "tres", "quatro"]);

        let single = TextRun::new("sem quebra de linha", 0.0, 0.0, TextStyle::Body);
        assert_eq!(single.lines(measure), vec!["sem quebra de linha"]);

        let long = TextRun::new("infinitamente", 0.0, 0.0, TextStyle::Body).wrap(30.0);
        assert_eq!(long.lines(measure), vec!["infinitamente"]);
    }
}
