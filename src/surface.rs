use crate::color::Rgb;
use crate::text::OpacityMask;
use tiny_skia::{Color, GradientStop, PathBuilder, Point, Rect, Shader, SpreadMode, Transform};

// Canvas-2D style drawing context. Rotations are in radians.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn set_global_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, alpha: f32);
    fn fill_rect_gradient(&mut self, x: f32, y: f32, w: f32, h: f32, gradient: &LinearGradient);
    fn fill_path(&mut self, path: &Path, color: Rgb, alpha: f32);
    fn stroke_path(&mut self, path: &Path, color: Rgb, alpha: f32, line_width: f32);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32);
    fn fill_mask(&mut self, mask: &OpacityMask, x: f32, y: f32, color: Rgb, alpha: f32);
}

#[derive(Clone, Debug, Default)]
pub struct Path {
    builder: PathBuilder,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.builder.move_to(x, y);
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.builder.line_to(x, y);
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        self.builder.quad_to(cx, cy, x, y);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.builder.close();
        self
    }

    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        self.builder.push_circle(cx, cy, radius);
        self
    }

    // Closed ellipse turned by `rotation` radians about its centre.
    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32) -> &mut Self {
        let oval = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)
            .and_then(PathBuilder::from_oval)
            .and_then(|oval| oval.transform(Transform::from_rotate_at(rotation.to_degrees(), cx, cy)));
        if let Some(oval) = oval {
            self.builder.push_path(&oval);
        }
        self
    }

    pub fn polyline(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut path = Path::new();
        let mut points = points.into_iter();
        if let Some((x, y)) = points.next() {
            path.move_to(x, y);
            for (x, y) in points {
                path.line_to(x, y);
            }
        }
        path
    }

    // None for paths with nothing to draw (empty, a lone point, non-finite bounds).
    pub fn finish(&self) -> Option<tiny_skia::Path> {
        self.builder.clone().finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ColorStop {
    offset: f32,
    color: Rgb,
    alpha: f32,
}

// Stops are kept sorted by offset; endpoints are in user space.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    start: (f32, f32),
    end: (f32, f32),
    stops: Vec<ColorStop>,
}

impl LinearGradient {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { start: (x0, y0), end: (x1, y1), stops: Vec::new() }
    }

    pub fn add_stop(&mut self, offset: f32, color: Rgb, alpha: f32) -> &mut Self {
        let stop = ColorStop { offset: offset.clamp(0.0, 1.0), color, alpha };
        let pos = self.stops.partition_point(|s| s.offset <= stop.offset);
        self.stops.insert(pos, stop);
        self
    }

    pub fn shader(&self, opacity: f32) -> Option<Shader<'static>> {
        let stops = self
            .stops
            .iter()
            .map(|s| {
                let alpha = (s.alpha * opacity).clamp(0.0, 1.0);
                let Rgb(r, g, b) = s.color;
                GradientStop::new(s.offset, Color::from_rgba8(r, g, b, (alpha * 255.0).round() as u8))
            })
            .collect();
        tiny_skia::LinearGradient::new(
            Point::from_xy(self.start.0, self.start.1),
            Point::from_xy(self.end.0, self.end.1),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        )
    }
}
