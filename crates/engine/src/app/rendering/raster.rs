//! Clipped RGBA8 writes into a row-major frame buffer.

pub(crate) struct FrameBuffer<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameBuffer<'a> {
    /// Returns `None` when the slice is too short for the stated size.
    pub(crate) fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        let needed = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if pixels.len() < needed {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let at = self.offset(x, y)?;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[at..at + 4]);
        Some(out)
    }

    pub(crate) fn write_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(at) = self.offset(x, y) {
            self.pixels[at..at + 4].copy_from_slice(&color);
        }
    }

    /// Source-over blend of `color` at `alpha` in `0..=1`.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 3], alpha: f32) {
        let Some(at) = self.offset(x, y) else {
            return;
        };
        let alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            return;
        };
        for (channel, src) in self.pixels[at..at + 3].iter_mut().zip(color) {
            let dst = *channel as f32;
            *channel = (dst + (src as f32 - dst) * alpha).round() as u8;
        }
        self.pixels[at + 3] = 255;
    }

    /// Fills the half-open rectangle `[x0, x1) x [y0, y1)`, clipped to the frame.
    pub(crate) fn blend_rect(
        &mut self,
        (x0, y0): (i32, i32),
        (x1, y1): (i32, i32),
        color: [u8; 3],
        alpha: f32,
    ) {
        let x_start = x0.max(0);
        let y_start = y0.max(0);
        let x_end = x1.min(self.width as i32);
        let y_end = y1.min(self.height as i32);
        for y in y_start..y_end {
            for x in x_start..x_end {
                self.blend_pixel(x, y, color, alpha);
            }
        }
    }

    /// Bresenham segment, clipped to the frame first so far off-screen
    /// endpoints cost nothing. Returns false when nothing was on screen.
    pub(crate) fn line(&mut self, from: (i32, i32), to: (i32, i32), color: [u8; 4]) -> bool {
        let Some((from, to)) = clip_segment(from, to, self.width, self.height) else {
            return false;
        };
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        let max_steps = (dx - dy) as usize + 1;
        for _ in 0..max_steps {
            self.write_pixel(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
        true
    }

    pub(crate) fn square(&mut self, cx: i32, cy: i32, half_size: i32, color: [u8; 4]) {
        for y in (cy - half_size)..=(cy + half_size) {
            for x in (cx - half_size)..=(cx + half_size) {
                self.write_pixel(x, y, color);
            }
        }
    }

    pub(crate) fn square_outline(&mut self, cx: i32, cy: i32, half_size: i32, color: [u8; 4]) {
        let (left, right) = (cx - half_size, cx + half_size);
        let (top, bottom) = (cy - half_size, cy + half_size);
        for x in left..=right {
            self.write_pixel(x, top, color);
            self.write_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            self.write_pixel(left, y, color);
            self.write_pixel(right, y, color);
        }
    }
}

/// Liang-Barsky clip against the frame rectangle grown by one pixel.
fn clip_segment(
    from: (i32, i32),
    to: (i32, i32),
    width: u32,
    height: u32,
) -> Option<((i32, i32), (i32, i32))> {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (dx, dy) = (to.0 as f64 - x0, to.1 as f64 - y0);
    let (min_x, max_x) = (-1.0, width as f64);
    let (min_y, max_y) = (-1.0, height as f64);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, x0 - min_x),
        (dx, max_x - x0),
        (-dy, y0 - min_y),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| ((x0 + dx * t).round() as i32, (y0 + dy * t).round() as i32);
    Some((at(t0), at(t1)))
}
