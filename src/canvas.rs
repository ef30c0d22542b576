//! CPU-side immediate-mode 2D tessellation.
//!
//! Renderers never touch the GPU. They describe each frame by pushing shapes into a
//! [`Canvas`], which turns circles, gradients, lines and polygons into colored
//! triangles ([`Vertex2d`]) and queues text runs. The GPU batches in
//! [`draw2d`](crate::draw2d) upload the result once per frame.
//!
//! A canvas has two layers:
//! - **effects**: drawn into the scene's persistent render target. Whatever was drawn
//!   last frame stays there unless the renderer calls [`Canvas::clear`], which is how
//!   low-alpha [`Canvas::fade`] fills produce trails.
//! - **overlay**: drawn straight to the screen every frame (caption panels, buttons).

use glam::{Affine2, Vec2};
use std::f32::consts::TAU;

use crate::ui::{Color, Rect, TextRun};

/// Vertex for 2D colored and textured triangles.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    fn colored(position: Vec2, color: Color) -> Self {
        Self {
            position: position.to_array(),
            uv: [0.0, 0.0],
            color: color.to_array(),
        }
    }
}

/// A color stop along a gradient, `offset` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Sample a stop list at `t`, clamping outside the covered range.
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> Color {
    let Some(first) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    stops[stops.len() - 1].color
}

/// How the persistent scene target is prepared before the effects layer is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadAction {
    /// Keep last frame's pixels (trail effects).
    Load,
    /// Wipe to a solid color first.
    Clear(Color),
}

/// A list of tessellated triangles with a save/restore transform stack.
#[derive(Debug, Default)]
pub struct Layer {
    vertices: Vec<Vertex2d>,
    transform: Affine2,
    stack: Vec<Affine2>,
}

impl Layer {
    pub fn new() -> Self {
        Self {
            vertices: Vec::with_capacity(4096),
            transform: Affine2::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn vertices(&self) -> &[Vertex2d] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Drop all triangles and reset the transform stack.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.transform = Affine2::IDENTITY;
        self.stack.clear();
    }

    // ========================================================================
    // Transform stack
    // ========================================================================

    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    pub fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.transform = self.transform * Affine2::from_translation(offset);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.transform = self.transform * Affine2::from_angle(angle);
    }

    pub fn scale(&mut self, factor: f32) {
        self.transform = self.transform * Affine2::from_scale(Vec2::splat(factor));
    }

    fn point(&self, p: Vec2) -> Vec2 {
        self.transform.transform_point2(p)
    }

    /// Uniform scale of the current transform, used to pick circle resolution.
    fn scale_factor(&self) -> f32 {
        self.transform.matrix2.determinant().abs().sqrt()
    }

    fn segments_for(&self, radius: f32) -> usize {
        let screen_radius = radius * self.scale_factor();
        ((screen_radius.max(0.0).sqrt() * 4.0) as usize).clamp(6, 72)
    }

    fn triangle(&mut self, a: (Vec2, Color), b: (Vec2, Color), c: (Vec2, Color)) {
        self.vertices.extend_from_slice(&[
            Vertex2d::colored(self.point(a.0), a.1),
            Vertex2d::colored(self.point(b.0), b.1),
            Vertex2d::colored(self.point(c.0), c.1),
        ]);
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// Fill an arbitrary quad given in winding order.
    pub fn fill_quad(&mut self, corners: [Vec2; 4], color: Color) {
        let [a, b, c, d] = corners;
        self.triangle((a, color), (b, color), (c, color));
        self.triangle((a, color), (c, color), (d, color));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Rect {
            x,
            y,
            width,
            height,
        } = rect;
        self.fill_quad(
            [
                Vec2::new(x, y),
                Vec2::new(x + width, y),
                Vec2::new(x + width, y + height),
                Vec2::new(x, y + height),
            ],
            color,
        );
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.fill_ellipse(center, radius, radius, color);
    }

    pub fn fill_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, color: Color) {
        if rx <= 0.0 || ry <= 0.0 || color.a <= 0.0 {
            return;
        }
        let segments = self.segments_for(rx.max(ry));
        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * TAU;
            let a1 = (i + 1) as f32 / segments as f32 * TAU;
            self.triangle(
                (center, color),
                (center + Vec2::new(a0.cos() * rx, a0.sin() * ry), color),
                (center + Vec2::new(a1.cos() * rx, a1.sin() * ry), color),
            );
        }
    }

    /// Disc whose color fades from `inner` at the center to `outer` at the rim.
    pub fn glow(&mut self, center: Vec2, radius: f32, inner: Color, outer: Color) {
        self.radial_gradient(
            center,
            radius,
            &[GradientStop::new(0.0, inner), GradientStop::new(1.0, outer)],
        );
    }

    /// Disc shaded by concentric rings following `stops` from center (0) to rim (1).
    pub fn radial_gradient(&mut self, center: Vec2, radius: f32, stops: &[GradientStop]) {
        if radius <= 0.0 || stops.is_empty() {
            return;
        }
        let segments = self.segments_for(radius);
        let rings = (stops.len() * 2).clamp(2, 8);

        for ring in 0..rings {
            let t0 = ring as f32 / rings as f32;
            let t1 = (ring + 1) as f32 / rings as f32;
            let (c0, c1) = (sample_gradient(stops, t0), sample_gradient(stops, t1));
            let (r0, r1) = (radius * t0, radius * t1);

            for i in 0..segments {
                let a0 = i as f32 / segments as f32 * TAU;
                let a1 = (i + 1) as f32 / segments as f32 * TAU;
                let (d0, d1) = (Vec2::from_angle(a0), Vec2::from_angle(a1));

                if ring == 0 {
                    self.triangle((center, c0), (center + d0 * r1, c1), (center + d1 * r1, c1));
                } else {
                    self.triangle(
                        (center + d0 * r0, c0),
                        (center + d0 * r1, c1),
                        (center + d1 * r1, c1),
                    );
                    self.triangle(
                        (center + d0 * r0, c0),
                        (center + d1 * r1, c1),
                        (center + d1 * r0, c0),
                    );
                }
            }
        }
    }

    /// Fill `rect` with horizontal bands following `stops` from top (0) to bottom (1).
    pub fn vertical_gradient(&mut self, rect: Rect, stops: &[GradientStop]) {
        if stops.is_empty() {
            return;
        }
        let mut offsets: Vec<f32> = stops.iter().map(|s| s.offset.clamp(0.0, 1.0)).collect();
        if offsets.first() != Some(&0.0) {
            offsets.insert(0, 0.0);
        }
        if offsets.last() != Some(&1.0) {
            offsets.push(1.0);
        }

        for pair in offsets.windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            if t1 <= t0 {
                continue;
            }
            let (c0, c1) = (sample_gradient(stops, t0), sample_gradient(stops, t1));
            let y0 = rect.y + rect.height * t0;
            let y1 = rect.y + rect.height * t1;
            let (l, r) = (rect.x, rect.x + rect.width);
            self.triangle(
                (Vec2::new(l, y0), c0),
                (Vec2::new(r, y0), c0),
                (Vec2::new(r, y1), c1),
            );
            self.triangle(
                (Vec2::new(l, y0), c0),
                (Vec2::new(r, y1), c1),
                (Vec2::new(l, y1), c1),
            );
        }
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.line_gradient(from, to, width, color, color);
    }

    /// Line whose color shifts from `start` to `end`, used for streak tails.
    pub fn line_gradient(&mut self, from: Vec2, to: Vec2, width: f32, start: Color, end: Color) {
        let dir = to - from;
        if dir.length_squared() <= f32::EPSILON || width <= 0.0 {
            return;
        }
        let normal = dir.perp().normalize() * (width / 2.0);
        let (a, b) = (from + normal, from - normal);
        let (c, d) = (to - normal, to + normal);
        self.triangle((a, start), (b, start), (c, end));
        self.triangle((a, start), (c, end), (d, end));
    }

    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        self.stroke_ellipse(center, radius, radius, width, color);
    }

    /// Outline of an axis-aligned ellipse as a ring of quads.
    pub fn stroke_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, width: f32, color: Color) {
        if rx <= 0.0 || ry <= 0.0 || width <= 0.0 || color.a <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let segments = self.segments_for(rx.max(ry)).max(24);
        let ring = |a: f32, grow: f32| {
            center + Vec2::new(a.cos() * (rx + grow), a.sin() * (ry + grow))
        };
        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * TAU;
            let a1 = (i + 1) as f32 / segments as f32 * TAU;
            self.fill_quad(
                [ring(a0, -half), ring(a0, half), ring(a1, half), ring(a1, -half)],
                color,
            );
        }
    }

    /// Fill a convex polygon as a triangle fan around its first point.
    pub fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 {
            return;
        }
        for pair in points[1..].windows(2) {
            self.triangle((points[0], color), (pair[0], color), (pair[1], color));
        }
    }

    /// Heart outline from the classic parametric curve, `size` is roughly the width.
    pub fn fill_heart(&mut self, center: Vec2, size: f32, color: Color) {
        if size <= 0.0 || color.a <= 0.0 {
            return;
        }
        let segments = self.segments_for(size).max(16);
        let unit = size / 34.0;
        let point = |t: f32| {
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            center + Vec2::new(x, -y) * unit
        };
        for i in 0..segments {
            let t0 = i as f32 / segments as f32 * TAU;
            let t1 = (i + 1) as f32 / segments as f32 * TAU;
            self.triangle((center, color), (point(t0), color), (point(t1), color));
        }
    }
}

/// One frame's worth of drawing for the mounted scene.
#[derive(Debug)]
pub struct Canvas {
    width: f32,
    height: f32,
    load: LoadAction,
    effects: Layer,
    overlay: Layer,
    texts: Vec<TextRun>,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            load: LoadAction::Load,
            effects: Layer::new(),
            overlay: Layer::new(),
            texts: Vec::new(),
        }
    }

    /// Start a new frame at the given size, discarding everything queued.
    pub fn begin(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.load = LoadAction::Load;
        self.effects.reset();
        self.overlay.reset();
        self.texts.clear();
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Wipe the scene target to `color`. Anything already queued on the effects
    /// layer this frame is discarded, since it would be wiped too.
    pub fn clear(&mut self, color: Color) {
        self.load = LoadAction::Clear(color);
        self.effects.reset();
    }

    /// Paint a translucent full-screen rectangle over last frame's pixels.
    pub fn fade(&mut self, color: Color) {
        let bounds = self.bounds();
        self.effects.fill_rect(bounds, color);
    }

    pub fn load_action(&self) -> LoadAction {
        self.load
    }

    pub fn effects(&mut self) -> &mut Layer {
        &mut self.effects
    }

    pub fn overlay(&mut self) -> &mut Layer {
        &mut self.overlay
    }

    pub fn effects_layer(&self) -> &Layer {
        &self.effects
    }

    pub fn overlay_layer(&self) -> &Layer {
        &self.overlay
    }

    pub fn text(&mut self, run: TextRun) {
        if run.color.a > 0.0 && !run.text.is_empty() {
            self.texts.push(run);
        }
    }

    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::TextStyle;

    #[test]
    fn rect_is_two_triangles() {
        let mut layer = Layer::new();
        layer.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        assert_eq!(layer.vertex_count(), 6);
    }

    #[test]
    fn circle_vertex_count_is_multiple_of_three() {
        let mut layer = Layer::new();
        layer.fill_circle(Vec2::new(5.0, 5.0), 40.0, Color::WHITE);
        assert!(layer.vertex_count() >= 18);
        assert_eq!(layer.vertex_count() % 3, 0);
    }

    #[test]
    fn ring_has_at_least_twenty_four_quads() {
        let mut layer = Layer::new();
        layer.stroke_circle(Vec2::ZERO, 10.0, 1.0, Color::WHITE);
        assert!(layer.vertex_count() >= 24 * 6);
        assert_eq!(layer.vertex_count() % 6, 0);
    }

    #[test]
    fn invisible_shapes_emit_nothing() {
        let mut layer = Layer::new();
        layer.fill_circle(Vec2::ZERO, 0.0, Color::WHITE);
        layer.fill_circle(Vec2::ZERO, 5.0, Color::TRANSPARENT);
        layer.line(Vec2::ZERO, Vec2::ZERO, 2.0, Color::WHITE);
        assert!(layer.is_empty());
    }

    #[test]
    fn transform_stack_applies_and_restores() {
        let mut layer = Layer::new();
        layer.save();
        layer.translate(Vec2::new(100.0, 50.0));
        layer.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        layer.restore();
        layer.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);

        assert_eq!(layer.vertices()[0].position, [100.0, 50.0]);
        assert_eq!(layer.vertices()[6].position, [0.0, 0.0]);
    }

    #[test]
    fn gradient_sampling_interpolates_between_stops() {
        let stops = [
            GradientStop::new(0.0, Color::BLACK),
            GradientStop::new(1.0, Color::WHITE),
        ];
        assert_eq!(sample_gradient(&stops, -1.0), Color::BLACK);
        assert_eq!(sample_gradient(&stops, 2.0), Color::WHITE);
        assert!((sample_gradient(&stops, 0.25).r - 0.25).abs() < 1e-6);
        assert_eq!(sample_gradient(&[], 0.5), Color::TRANSPARENT);
    }

    #[test]
    fn vertical_gradient_covers_padded_range() {
        let mut layer = Layer::new();
        let stops = [
            GradientStop::new(0.3, Color::BLACK),
            GradientStop::new(0.6, Color::WHITE),
        ];
        layer.vertical_gradient(Rect::new(0.0, 0.0, 10.0, 100.0), &stops);
        // 0..0.3, 0.3..0.6, 0.6..1.0
        assert_eq!(layer.vertex_count(), 18);
    }

    #[test]
    fn clear_switches_load_action_and_drops_effects() {
        let mut canvas = Canvas::new(100.0, 100.0);
        assert_eq!(canvas.load_action(), LoadAction::Load);

        canvas.fade(Color::BLACK.with_alpha(0.05));
        assert_eq!(canvas.effects_layer().vertex_count(), 6);

        canvas.clear(Color::BLACK);
        assert_eq!(canvas.load_action(), LoadAction::Clear(Color::BLACK));
        assert!(canvas.effects_layer().is_empty());

        canvas.begin(200.0, 100.0);
        assert_eq!(canvas.load_action(), LoadAction::Load);
        assert_eq!(canvas.width(), 200.0);
    }

    #[test]
    fn transparent_text_is_skipped() {
        let mut canvas = Canvas::new(10.0, 10.0);
        canvas.text(TextRun::new("hidden", 0.0, 0.0, TextStyle::Body).color(Color::TRANSPARENT));
        canvas.text(TextRun::new("shown", 0.0, 0.0, TextStyle::Body));
        assert_eq!(canvas.texts().len(), 1);
    }
}
