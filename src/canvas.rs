use crate::color::Rgb;
use crate::surface::{LinearGradient, Path, Surface};
use crate::text::OpacityMask;
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Rect, Stroke, Transform,
};

#[derive(Clone, Copy)]
struct DrawState {
    transform: Transform,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self { transform: Transform::identity(), alpha: 1.0 }
    }
}

// Opaque RGBA pixmap; a zero-sized terminal leaves it empty and drawing becomes a no-op.
pub struct Canvas {
    width: usize,
    height: usize,
    pixmap: Option<Pixmap>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let mut canvas = Self {
            width,
            height,
            pixmap: Pixmap::new(width as u32, height as u32),
            state: DrawState::default(),
            stack: Vec::new(),
        };
        canvas.clear(Rgb::BLACK);
        canvas
    }

    pub fn columns(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Canvas::new(width, height);
    }

    pub fn clear(&mut self, color: Rgb) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::from_rgba8(color.0, color.1, color.2, 255));
        }
    }

    // Out-of-bounds reads are black.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let Some(pixmap) = &self.pixmap else {
            return Rgb::BLACK;
        };
        if x >= self.width || y >= self.height {
            return Rgb::BLACK;
        }
        match pixmap.pixel(x as u32, y as u32) {
            Some(p) => {
                let c = p.demultiply();
                Rgb(c.red(), c.green(), c.blue())
            }
            None => Rgb::BLACK,
        }
    }

    // Solid paint with the global alpha folded in; None when nothing would show.
    fn paint(&self, color: Rgb, alpha: f32) -> Option<Paint<'static>> {
        let alpha = alpha * self.state.alpha;
        if !(alpha > 0.0) {
            return None;
        }
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.0, color.1, color.2, (alpha.min(1.0) * 255.0).round() as u8);
        paint.anti_alias = true;
        Some(paint)
    }

    fn fill(&mut self, path: &tiny_skia::Path, paint: &Paint<'_>) {
        let transform = self.state.transform;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(path, paint, FillRule::Winding, transform, None);
        }
    }
}

impl Surface for Canvas {
    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.pre_translate(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.pre_rotate(radians.to_degrees());
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, alpha: f32) {
        let (Some(rect), Some(paint)) = (Rect::from_xywh(x, y, w, h), self.paint(color, alpha)) else {
            return;
        };
        let transform = self.state.transform;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_rect(rect, &paint, transform, None);
        }
    }

    fn fill_rect_gradient(&mut self, x: f32, y: f32, w: f32, h: f32, gradient: &LinearGradient) {
        let (Some(rect), Some(shader)) = (Rect::from_xywh(x, y, w, h), gradient.shader(self.state.alpha)) else {
            return;
        };
        let paint = Paint { shader, anti_alias: true, ..Paint::default() };
        let transform = self.state.transform;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_rect(rect, &paint, transform, None);
        }
    }

    fn fill_path(&mut self, path: &Path, color: Rgb, alpha: f32) {
        if let (Some(path), Some(paint)) = (path.finish(), self.paint(color, alpha)) {
            self.fill(&path, &paint);
        }
    }

    fn stroke_path(&mut self, path: &Path, color: Rgb, alpha: f32, line_width: f32) {
        let (Some(path), Some(paint)) = (path.finish(), self.paint(color, alpha)) else {
            return;
        };
        let stroke = Stroke {
            width: line_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let transform = self.state.transform;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        if let (Some(circle), Some(paint)) = (PathBuilder::from_circle(cx, cy, radius), self.paint(color, alpha)) {
            self.fill(&circle, &paint);
        }
    }

    fn fill_mask(&mut self, mask: &OpacityMask, x: f32, y: f32, color: Rgb, alpha: f32) {
        let opacity = alpha * self.state.alpha;
        if !(opacity > 0.0) {
            return;
        }
        let Some(mut tinted) = Pixmap::new(mask.width as u32, mask.height as u32) else {
            return;
        };
        for (dst, &value) in tinted.pixels_mut().iter_mut().zip(&mask.data) {
            *dst = ColorU8::from_rgba(color.0, color.1, color.2, value).premultiply();
        }

        let paint = PixmapPaint {
            opacity: opacity.min(1.0),
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Nearest,
        };
        let transform = self.state.transform;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.draw_pixmap(x.round() as i32, y.round() as i32, tinted.as_ref(), &paint, transform, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn near(actual: Rgb, expected: Rgb) -> bool {
        let close = |a: u8, b: u8| a.abs_diff(b) <= 1;
        close(actual.0, expected.0) && close(actual.1, expected.1) && close(actual.2, expected.2)
    }

    #[test]
    fn fill_rect_covers_pixel_centres() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect(2.0, 3.0, 4.0, 2.0, Rgb(200, 100, 50), 1.0);
        assert!(near(canvas.pixel(2, 3), Rgb(200, 100, 50)));
        assert!(near(canvas.pixel(5, 4), Rgb(200, 100, 50)));
        assert_eq!(canvas.pixel(6, 4), Rgb::BLACK);
        assert_eq!(canvas.pixel(2, 5), Rgb::BLACK);
        assert_eq!(canvas.pixel(1, 3), Rgb::BLACK);
    }

    #[test]
    fn translucent_overlay_fades_towards_overlay_colour() {
        let mut canvas = Canvas::new(4, 4);
        canvas.clear(Rgb(200, 200, 200));
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::BLACK, 0.25);
        assert!(near(canvas.pixel(1, 1), Rgb(150, 150, 150)), "{:?}", canvas.pixel(1, 1));
    }

    #[test]
    fn global_alpha_is_restored() {
        let mut canvas = Canvas::new(4, 1);
        canvas.save();
        canvas.set_global_alpha(0.5);
        canvas.fill_rect(0.0, 0.0, 2.0, 1.0, Rgb(100, 100, 100), 1.0);
        canvas.restore();
        canvas.fill_rect(2.0, 0.0, 2.0, 1.0, Rgb(100, 100, 100), 1.0);
        assert!(near(canvas.pixel(0, 0), Rgb(50, 50, 50)), "{:?}", canvas.pixel(0, 0));
        assert!(near(canvas.pixel(3, 0), Rgb(100, 100, 100)));
    }

    #[test]
    fn rotation_moves_shapes() {
        let mut canvas = Canvas::new(20, 20);
        canvas.save();
        canvas.translate(10.0, 10.0);
        canvas.rotate(FRAC_PI_2);
        // a bar along +x becomes a bar along +y
        canvas.fill_rect(0.0, -1.0, 6.0, 2.0, Rgb::WHITE, 1.0);
        canvas.restore();
        assert!(canvas.pixel(9, 14).0 > 240);
        assert_eq!(canvas.pixel(14, 9), Rgb::BLACK);
    }

    #[test]
    fn tiny_circle_still_leaves_a_mark_and_clips_offscreen() {
        let mut canvas = Canvas::new(8, 8);
        canvas.fill_circle(3.5, 3.5, 0.4, Rgb::WHITE, 1.0);
        assert_ne!(canvas.pixel(3, 3), Rgb::BLACK);
        canvas.fill_circle(-50.0, 400.0, 3.0, Rgb::WHITE, 1.0);
        canvas.fill_circle(f32::NAN, 2.0, 3.0, Rgb::WHITE, 1.0);
    }

    #[test]
    fn stroke_draws_along_segments() {
        let mut canvas = Canvas::new(12, 6);
        let path = Path::polyline([(1.0, 3.0), (10.0, 3.0)]);
        canvas.stroke_path(&path, Rgb(0, 255, 0), 1.0, 2.0);
        assert!(near(canvas.pixel(5, 2), Rgb(0, 255, 0)));
        assert_eq!(canvas.pixel(5, 0), Rgb::BLACK);
    }

    #[test]
    fn gradient_rect_follows_stops() {
        let mut canvas = Canvas::new(1, 10);
        let mut g = LinearGradient::new(0.0, 0.0, 0.0, 10.0);
        g.add_stop(0.0, Rgb(255, 0, 0), 1.0).add_stop(1.0, Rgb(0, 0, 255), 1.0);
        canvas.fill_rect_gradient(0.0, 0.0, 1.0, 10.0, &g);
        assert!(canvas.pixel(0, 0).0 > 200);
        assert!(canvas.pixel(0, 9).2 > 200);
    }

    #[test]
    fn mask_is_blended_by_opacity() {
        let mut canvas = Canvas::new(4, 4);
        let mut mask = OpacityMask::new(2, 1);
        mask.data = vec![255, 0];
        canvas.fill_mask(&mask, 1.0, 1.0, Rgb(10, 20, 30), 1.0);
        assert!(near(canvas.pixel(1, 1), Rgb(10, 20, 30)));
        assert_eq!(canvas.pixel(2, 1), Rgb::BLACK);

        canvas.fill_mask(&mask, 0.0, 3.0, Rgb(200, 200, 200), 0.5);
        assert!(near(canvas.pixel(0, 3), Rgb(100, 100, 100)), "{:?}", canvas.pixel(0, 3));
    }

    #[test]
    fn empty_canvas_ignores_drawing() {
        let mut canvas = Canvas::new(0, 0);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::WHITE, 1.0);
        canvas.fill_circle(1.0, 1.0, 2.0, Rgb::WHITE, 1.0);
        assert_eq!(canvas.pixel(0, 0), Rgb::BLACK);
        canvas.resize(3, 2);
        canvas.fill_rect(0.0, 0.0, 3.0, 2.0, Rgb::WHITE, 1.0);
        assert!(near(canvas.pixel(2, 1), Rgb::WHITE));
    }
}
