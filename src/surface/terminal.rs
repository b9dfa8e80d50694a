use super::{Glow, Surface};
use crate::color::Hsla;
use crate::geometry::{Point, Rect, Viewport};
use std::io::{self, Write};

/// Software raster behind a true-color terminal. Each cell holds two
/// vertically stacked pixels drawn with the lower half-block glyph.
pub struct TerminalSurface {
    width: usize,
    height: usize,
    scale: f32,
    background: (u8, u8, u8),
    frame: Vec<(f32, f32, f32)>,
    output_buf: Vec<u8>,
}

impl TerminalSurface {
    pub fn new(cols: u16, rows: u16, scale: f32, background: (u8, u8, u8)) -> Self {
        let width = cols as usize;
        let height = rows as usize * 2;
        let bg = (background.0 as f32, background.1 as f32, background.2 as f32);
        Self {
            width,
            height,
            scale,
            background,
            frame: vec![bg; width * height],
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.width = cols as usize;
        self.height = rows as usize * 2;
        let bg = self.bg();
        self.frame = vec![bg; self.width * self.height];
        self.output_buf = Vec::with_capacity(self.width * self.height * 25);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32 * self.scale, self.height as f32 * self.scale)
    }

    /// Logical position of the centre of a terminal cell's upper pixel.
    pub fn cell_to_logical(&self, column: u16, row: u16) -> Point {
        Point::new(
            (column as f32 + 0.5) * self.scale,
            (row as f32 * 2.0 + 0.5) * self.scale,
        )
    }

    fn bg(&self) -> (f32, f32, f32) {
        (
            self.background.0 as f32,
            self.background.1 as f32,
            self.background.2 as f32,
        )
    }

    fn to_raster(&self, p: Point) -> (f32, f32) {
        (p.x / self.scale, p.y / self.scale)
    }

    fn pixel_index(&self, x: f32, y: f32) -> Option<usize> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (px, py) = (x as usize, y as usize);
        if px < self.width && py < self.height {
            Some(py * self.width + px)
        } else {
            None
        }
    }

    fn blend(&mut self, idx: usize, color: (u8, u8, u8), alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        let px = &mut self.frame[idx];
        px.0 += (color.0 as f32 - px.0) * a;
        px.1 += (color.1 as f32 - px.1) * a;
        px.2 += (color.2 as f32 - px.2) * a;
    }

    fn add_glow(&mut self, x: f32, y: f32, radius: f32, intensity: f32, color: (u8, u8, u8)) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let radius = radius.max(1.0);
        let x_min = (x - radius).max(0.0) as usize;
        let x_max = (x + radius).min(self.width as f32 - 1.0);
        let y_min = (y - radius).max(0.0) as usize;
        let y_max = (y + radius).min(self.height as f32 - 1.0);
        if x_max < 0.0 || y_max < 0.0 {
            return;
        }

        for py in y_min..=y_max as usize {
            for px in x_min..=x_max as usize {
                let dx = px as f32 + 0.5 - x;
                let dy = py as f32 + 0.5 - y;
                let dist = (dx * dx + dy * dy).sqrt();

                if dist < radius {
                    let falloff = (1.0 - (dist / radius)).powf(2.0);
                    let contribution = intensity * falloff;

                    if contribution > 0.02 {
                        let p = &mut self.frame[py * self.width + px];
                        p.0 = (p.0 + color.0 as f32 * contribution).min(255.0);
                        p.1 = (p.1 + color.1 as f32 * contribution).min(255.0);
                        p.2 = (p.2 + color.2 as f32 * contribution).min(255.0);
                    }
                }
            }
        }
    }

    /// Pixel color at raster coordinates, rounded the way it is presented.
    pub fn pixel(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let p = self.frame[y * self.width + x];
        Some((
            p.0.round().clamp(0.0, 255.0) as u8,
            p.1.round().clamp(0.0, 255.0) as u8,
            p.2.round().clamp(0.0, 255.0) as u8,
        ))
    }

    pub fn present(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top: (u8, u8, u8) = (255, 255, 255);
        let mut prev_bot: (u8, u8, u8) = (255, 255, 255);
        let mut first = true;

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top = self.pixel(x, y).unwrap_or(self.background);
                let bot = self.pixel(x, y + 1).unwrap_or(top);

                if first || top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if first || bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                first = false;

                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            first = true;
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()
    }
}

impl Surface for TerminalSurface {
    fn clear(&mut self, region: Rect) {
        let (x0, y0) = self.to_raster(Point::new(region.x, region.y));
        let (x1, y1) = self.to_raster(Point::new(region.x + region.width, region.y + region.height));
        let x0 = (x0.max(0.0) as usize).min(self.width);
        let y0 = (y0.max(0.0) as usize).min(self.height);
        let x1 = (x1.ceil().max(0.0) as usize).min(self.width);
        let y1 = (y1.ceil().max(0.0) as usize).min(self.height);

        let bg = self.bg();
        for y in y0..y1 {
            let row = y * self.width;
            self.frame[row + x0..row + x1.max(x0)].fill(bg);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Hsla, glow: Option<Glow>) {
        let (cx, cy) = self.to_raster(center);
        let r = (radius / self.scale).max(0.0);

        if let Some(glow) = glow {
            let g = glow.color;
            self.add_glow(cx, cy, r + glow.blur / self.scale, g.a, g.to_rgb());
        }

        let rgb = color.to_rgb();
        let reach = r + 0.5;
        let x_min = (cx - reach).floor() as i64;
        let x_max = (cx + reach).ceil() as i64;
        let y_min = (cy - reach).floor() as i64;
        let y_max = (cy + reach).ceil() as i64;

        for py in y_min..=y_max {
            for px in x_min..=x_max {
                let sx = px as f32 + 0.5;
                let sy = py as f32 + 0.5;
                let Some(idx) = self.pixel_index(sx, sy) else {
                    continue;
                };
                let dist = ((sx - cx).powi(2) + (sy - cy).powi(2)).sqrt();
                let coverage = (reach - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(idx, rgb, color.a * coverage);
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Hsla, glow: Option<Glow>) {
        if points.len() < 2 {
            return;
        }
        let rgb = color.to_rgb();
        let coverage = (width / self.scale).clamp(0.5, 1.0);
        let glow = glow.map(|g| (g.blur / self.scale, g.color.a * 0.25, g.color.to_rgb()));
        let mut last_idx = None;

        for pair in points.windows(2) {
            let (x0, y0) = self.to_raster(pair[0]);
            let (x1, y1) = self.to_raster(pair[1]);
            let steps = ((x1 - x0).abs().max((y1 - y0).abs()) * 2.0).ceil().max(1.0) as usize;

            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let x = x0 + (x1 - x0) * t;
                let y = y0 + (y1 - y0) * t;
                let Some(idx) = self.pixel_index(x, y) else {
                    continue;
                };
                if last_idx == Some(idx) {
                    continue;
                }
                last_idx = Some(idx);

                if let Some((radius, intensity, glow_rgb)) = glow {
                    self.add_glow(x, y, radius, intensity, glow_rgb);
                }
                self.blend(idx, rgb, color.a * coverage);
            }
        }
    }
}
