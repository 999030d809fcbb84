// ABOUTME: RGBA compositing canvas with the GIF disposal state machine
// ABOUTME: Holds the live canvas plus the snapshot used by restore-to-previous

/// How a frame leaves the canvas for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Unspecified or "do not dispose": keep the composited pixels.
    Keep,
    /// Clear the frame rectangle to the background colour.
    Background,
    /// Restore the canvas as it was before this frame was drawn.
    Previous,
}

impl From<gif::DisposalMethod> for Disposal {
    fn from(method: gif::DisposalMethod) -> Self {
        match method {
            gif::DisposalMethod::Background => Disposal::Background,
            gif::DisposalMethod::Previous => Disposal::Previous,
            gif::DisposalMethod::Any | gif::DisposalMethod::Keep => Disposal::Keep,
        }
    }
}

/// A frame's sub-rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    previous: Vec<u8>,
    background: [u8; 4],
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: [u8; 4]) -> Self {
        let len = width as usize * height as usize * 4;
        Self {
            width,
            height,
            pixels: vec![0; len],
            previous: vec![0; len],
            background,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Snapshot if the frame about to be drawn restores to previous.
    pub fn begin_frame(&mut self, disposal: Disposal) {
        if disposal == Disposal::Previous {
            self.previous.copy_from_slice(&self.pixels);
        }
    }

    /// Source-over composite of an RGBA sub-image, clipped to the canvas.
    pub fn draw_over(&mut self, rect: Rect, rgba: &[u8]) {
        for row in 0..rect.height {
            let y = rect.top + row;
            if y >= self.height {
                break;
            }
            for col in 0..rect.width {
                let x = rect.left + col;
                if x >= self.width {
                    break;
                }
                let s = ((row * rect.width + col) * 4) as usize;
                let Some(src) = rgba.get(s..s + 4) else {
                    return;
                };
                let d = ((y * self.width + x) * 4) as usize;
                blend_over(&mut self.pixels[d..d + 4], src);
            }
        }
    }

    /// Applies the frame's disposal so the canvas is ready for the next frame.
    pub fn end_frame(&mut self, rect: Rect, disposal: Disposal) {
        match disposal {
            Disposal::Keep => {}
            Disposal::Background => {
                for y in rect.top..(rect.top + rect.height).min(self.height) {
                    for x in rect.left..(rect.left + rect.width).min(self.width) {
                        let d = ((y * self.width + x) * 4) as usize;
                        self.pixels[d..d + 4].copy_from_slice(&self.background);
                    }
                }
            }
            Disposal::Previous => self.pixels.copy_from_slice(&self.previous),
        }
    }
}

fn blend_over(dst: &mut [u8], src: &[u8]) {
    let sa = src[3] as u32;
    match sa {
        0 => {}
        255 => dst.copy_from_slice(src),
        _ => {
            let da = dst[3] as u32;
            let out_a = sa + da * (255 - sa) / 255;
            if out_a == 0 {
                dst.copy_from_slice(&[0, 0, 0, 0]);
                return;
            }
            for c in 0..3 {
                let sc = src[c] as u32 * sa;
                let dc = dst[c] as u32 * da * (255 - sa) / 255;
                dst[c] = ((sc + dc) / out_a) as u8;
            }
            dst[3] = out_a as u8;
        }
    }
}
