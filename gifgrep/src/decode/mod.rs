// ABOUTME: GIF decoding into fully composited, independently drawable PNG frames
// ABOUTME: Enforces byte, pixel and frame caps and falls back to still images when allowed

pub mod canvas;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::io::{Cursor, Read};
use std::time::{Duration, Instant};
use thiserror::Error;

use self::canvas::{Canvas, Disposal, Rect};
use crate::constants::decode as limits;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("gif has no frames")]
    NoFrames,

    #[error("gif has an invalid size")]
    InvalidSize,

    #[error("image too large: more than {limit} bytes")]
    TooManyBytes { limit: u64 },

    #[error("image too large: pixels={pixels} limit={limit}")]
    TooManyPixels { pixels: u64, limit: u64 },

    #[error("decode failed: {0}")]
    Codec(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn is_too_large(&self) -> bool {
        matches!(
            self,
            DecodeError::TooManyBytes { .. } | DecodeError::TooManyPixels { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum input length in bytes; 0 means unbounded.
    pub max_bytes: u64,
    /// Maximum canvas width × height; 0 means unbounded.
    pub max_pixels: u64,
    /// Maximum frames to composite; 0 means all.
    pub max_frames: usize,
    pub default_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Refuse the still-image fallback when GIF parsing fails.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_bytes: 0,
            max_pixels: 0,
            max_frames: 0,
            default_delay: limits::DEFAULT_DELAY,
            min_delay: limits::MIN_DELAY,
            max_delay: limits::MAX_DELAY,
            strict: false,
        }
    }
}

impl DecodeOptions {
    pub fn clamp_delay(&self, delay: Duration) -> Duration {
        delay.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    /// Converts GIF delay units (1/100 s) into a clamped display duration.
    pub fn frame_delay(&self, units: u16) -> Duration {
        let delay = Duration::from_millis(units as u64 * 10);
        if delay.is_zero() {
            self.clamp_delay(self.default_delay)
        } else {
            self.clamp_delay(delay)
        }
    }

    fn check_pixels(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        let pixels = width as u64 * height as u64;
        if self.max_pixels > 0 && pixels > self.max_pixels {
            return Err(DecodeError::TooManyPixels {
                pixels,
                limit: self.max_pixels,
            });
        }
        Ok(())
    }
}

/// One composited frame, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub png: Vec<u8>,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub frames: Vec<DecodedFrame>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

pub fn decode(bytes: &[u8], opts: &DecodeOptions) -> Result<DecodedImage, DecodeError> {
    decode_reader(Cursor::new(bytes), opts)
}

pub fn decode_reader<R: Read>(reader: R, opts: &DecodeOptions) -> Result<DecodedImage, DecodeError> {
    let data = read_limited(reader, opts.max_bytes)?;
    let started = Instant::now();

    let result = match decode_gif(&data, opts) {
        Ok(image) => Ok(image),
        Err(GifFailure::Parse(err)) if !opts.strict => decode_still(&data, opts).map_err(|still_err| {
            log::debug!("still fallback failed: {}", still_err);
            DecodeError::Codec(err)
        }),
        Err(GifFailure::Parse(err)) => Err(DecodeError::Codec(err)),
        Err(GifFailure::Decode(err)) => Err(err),
    };

    if let Ok(image) = &result {
        log::debug!(
            "decoded {}x{} with {} frame(s) in {:?}",
            image.width,
            image.height,
            image.frames.len(),
            started.elapsed()
        );
    }
    result
}

fn read_limited<R: Read>(reader: R, max_bytes: u64) -> Result<Vec<u8>, DecodeError> {
    let mut data = Vec::new();
    if max_bytes == 0 {
        let mut reader = reader;
        reader.read_to_end(&mut data)?;
        return Ok(data);
    }
    reader.take(max_bytes + 1).read_to_end(&mut data)?;
    if data.len() as u64 > max_bytes {
        return Err(DecodeError::TooManyBytes { limit: max_bytes });
    }
    Ok(data)
}

enum GifFailure {
    /// The stream is not a readable GIF; eligible for the still fallback.
    Parse(String),
    /// The GIF parsed but violates a structural rule or cap.
    Decode(DecodeError),
}

impl From<DecodeError> for GifFailure {
    fn from(err: DecodeError) -> Self {
        GifFailure::Decode(err)
    }
}

fn background_color(palette: Option<&[u8]>, index: Option<usize>) -> [u8; 4] {
    match (palette, index) {
        (Some(palette), Some(index)) if index * 3 + 2 < palette.len() => [
            palette[index * 3],
            palette[index * 3 + 1],
            palette[index * 3 + 2],
            255,
        ],
        _ => [0, 0, 0, 0],
    }
}

/// Composites frames as they are read, so the pixel cap is checked before any
/// frame data is decoded and reading stops at the frame cap.
fn decode_gif(data: &[u8], opts: &DecodeOptions) -> Result<DecodedImage, GifFailure> {
    let parse = |e: gif::DecodingError| GifFailure::Parse(e.to_string());

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(Cursor::new(data)).map_err(parse)?;

    let background = background_color(decoder.global_palette(), decoder.bg_color());
    let screen = (decoder.width() as u32, decoder.height() as u32);
    if screen.0 > 0 && screen.1 > 0 {
        opts.check_pixels(screen.0, screen.1)?;
    }

    let mut canvas: Option<Canvas> = None;
    let (mut width, mut height) = screen;
    let mut frames = Vec::new();

    while opts.max_frames == 0 || frames.len() < opts.max_frames {
        let Some(frame) = decoder.read_next_frame().map_err(parse)? else {
            break;
        };
        let rect = Rect {
            left: frame.left as u32,
            top: frame.top as u32,
            width: frame.width as u32,
            height: frame.height as u32,
        };
        let disposal = Disposal::from(frame.dispose);

        if canvas.is_none() {
            // A zero logical screen takes its size from the first frame.
            if width == 0 || height == 0 {
                width = rect.width;
                height = rect.height;
                if width == 0 || height == 0 {
                    return Err(DecodeError::InvalidSize.into());
                }
                opts.check_pixels(width, height)?;
            }
            canvas = Some(Canvas::new(width, height, background));
        }
        let Some(canvas) = canvas.as_mut() else {
            break;
        };

        canvas.begin_frame(disposal);
        canvas.draw_over(rect, &frame.buffer);
        frames.push(DecodedFrame {
            png: encode_png(canvas.pixels(), width, height)?,
            delay: opts.frame_delay(frame.delay),
        });
        canvas.end_frame(rect, disposal);
    }

    if frames.is_empty() {
        return Err(DecodeError::NoFrames.into());
    }
    Ok(DecodedImage {
        frames,
        width,
        height,
    })
}

fn decode_still(data: &[u8], opts: &DecodeOptions) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory(data).map_err(|e| DecodeError::Codec(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidSize);
    }
    opts.check_pixels(width, height)?;

    Ok(DecodedImage {
        frames: vec![DecodedFrame {
            png: encode_png(rgba.as_raw(), width, height)?,
            delay: opts.clamp_delay(opts.default_delay),
        }],
        width,
        height,
    })
}

fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::Adaptive)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| DecodeError::Codec(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    const PALETTE: [u8; 9] = [255, 255, 255, 255, 0, 0, 0, 0, 255];

    fn gif_bytes(width: u16, height: u16, frames: &[(u16, u16, u16, u16, Vec<u8>, u16, gif::DisposalMethod)]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut out, width, height, &PALETTE).unwrap();
            for (left, top, w, h, indices, delay, dispose) in frames {
                let frame = gif::Frame {
                    left: *left,
                    top: *top,
                    width: *w,
                    height: *h,
                    delay: *delay,
                    dispose: *dispose,
                    buffer: Cow::Owned(indices.clone()),
                    ..gif::Frame::default()
                };
                encoder.write_frame(&frame).unwrap();
            }
        }
        out
    }

    fn first_pixel_rgba(png: &[u8], x: u32, y: u32) -> [u8; 4] {
        let img = image::load_from_memory(png).unwrap().to_rgba8();
        img.get_pixel(x, y).0
    }

    fn two_frame_disposal_gif() -> Vec<u8> {
        gif_bytes(
            2,
            2,
            &[
                (0, 0, 2, 2, vec![0, 0, 0, 0], 10, gif::DisposalMethod::Keep),
                (0, 0, 1, 1, vec![1], 10, gif::DisposalMethod::Background),
                (1, 1, 1, 1, vec![2], 10, gif::DisposalMethod::Keep),
            ],
        )
    }

    #[test]
    fn test_composite_then_dispose_ordering() {
        let image = decode(&two_frame_disposal_gif(), &DecodeOptions::default()).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.frames.len(), 3);

        // Frame 2 shows its own red pixel before disposal applies.
        assert_eq!(first_pixel_rgba(&image.frames[1].png, 0, 0), [255, 0, 0, 255]);

        // Frame 3: red cleared by background disposal, blue drawn and persisting.
        let third = &image.frames[2].png;
        assert_ne!(first_pixel_rgba(third, 0, 0), [255, 0, 0, 255]);
        assert_eq!(first_pixel_rgba(third, 1, 1), [0, 0, 255, 255]);
    }

    /// Three frames where the middle one is cleared to the background.
    fn background_disposal_frames(local_palette: bool) -> Vec<gif::Frame<'static>> {
        let palette = local_palette.then(|| PALETTE.to_vec());
        [
            (0, 0, 2, 2, vec![0, 0, 0, 0], gif::DisposalMethod::Keep),
            (0, 0, 1, 1, vec![1], gif::DisposalMethod::Background),
            (1, 1, 1, 1, vec![0], gif::DisposalMethod::Keep),
        ]
        .into_iter()
        .map(|(left, top, width, height, indices, dispose)| gif::Frame {
            left,
            top,
            width,
            height,
            delay: 10,
            dispose,
            palette: palette.clone(),
            buffer: Cow::Owned(indices),
            ..gif::Frame::default()
        })
        .collect()
    }

    fn encode(global_palette: &[u8], frames: &[gif::Frame<'static>]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut out, 2, 2, global_palette).unwrap();
            for frame in frames {
                encoder.write_frame(frame).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_background_disposal_uses_global_palette_color() {
        let mut bytes = encode(&PALETTE, &background_disposal_frames(false));
        // Logical screen descriptor: background color index follows the packed flags.
        bytes[11] = 2;

        let image = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(first_pixel_rgba(&image.frames[1].png, 0, 0), [255, 0, 0, 255]);
        assert_eq!(first_pixel_rgba(&image.frames[2].png, 0, 0), [0, 0, 255, 255]);
        assert_eq!(first_pixel_rgba(&image.frames[2].png, 1, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_background_disposal_without_global_palette_is_transparent() {
        let bytes = encode(&[], &background_disposal_frames(true));

        let image = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(first_pixel_rgba(&image.frames[1].png, 0, 0), [255, 0, 0, 255]);
        assert_eq!(first_pixel_rgba(&image.frames[2].png, 0, 0), [0, 0, 0, 0]);
        assert_eq!(first_pixel_rgba(&image.frames[2].png, 1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_frame_cap_stops_reading() {
        let mut bytes = gif_bytes(1, 1, &[(0, 0, 1, 1, vec![1], 5, gif::DisposalMethod::Keep)]);
        // Replace the trailer with a block type no decoder accepts.
        assert_eq!(bytes.pop(), Some(0x3B));
        bytes.push(0x99);

        let strict = DecodeOptions {
            strict: true,
            ..Default::default()
        };
        assert!(matches!(decode(&bytes, &strict), Err(DecodeError::Codec(_))));

        let thumbnail = DecodeOptions {
            max_frames: 1,
            ..strict
        };
        let image = decode(&bytes, &thumbnail).unwrap();
        assert_eq!(image.frames.len(), 1);
        assert_eq!(first_pixel_rgba(&image.frames[0].png, 0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = two_frame_disposal_gif();
        let a = decode(&bytes, &DecodeOptions::default()).unwrap();
        let b = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frame_delay_defaults_and_clamps() {
        let opts = DecodeOptions {
            max_delay: Duration::from_millis(1000),
            ..Default::default()
        };
        assert_eq!(opts.frame_delay(0), Duration::from_millis(100));
        assert_eq!(opts.frame_delay(250), Duration::from_millis(1000));
        assert_eq!(opts.frame_delay(1), Duration::from_millis(20));
        assert_eq!(opts.frame_delay(5), Duration::from_millis(50));
    }

    #[test]
    fn test_delays_flow_into_frames() {
        let bytes = gif_bytes(
            1,
            1,
            &[
                (0, 0, 1, 1, vec![1], 0, gif::DisposalMethod::Keep),
                (0, 0, 1, 1, vec![2], 250, gif::DisposalMethod::Keep),
            ],
        );
        let opts = DecodeOptions {
            max_delay: Duration::from_millis(1000),
            ..Default::default()
        };
        let image = decode(&bytes, &opts).unwrap();
        assert_eq!(image.frames[0].delay, Duration::from_millis(100));
        assert_eq!(image.frames[1].delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_byte_cap_rejects_before_parsing() {
        let opts = DecodeOptions {
            max_bytes: 4,
            ..Default::default()
        };
        let err = decode(b"12345", &opts).unwrap_err();
        assert!(matches!(err, DecodeError::TooManyBytes { limit: 4 }));
        assert!(err.is_too_large());

        // Exactly at the cap is read in full and fails later as a codec error.
        let err = decode(b"1234", &opts).unwrap_err();
        assert!(matches!(err, DecodeError::Codec(_)));
    }

    #[test]
    fn test_pixel_cap() {
        let bytes = gif_bytes(4, 4, &[(0, 0, 4, 4, vec![0; 16], 0, gif::DisposalMethod::Keep)]);
        let opts = DecodeOptions {
            max_pixels: 15,
            ..Default::default()
        };
        let err = decode(&bytes, &opts).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TooManyPixels {
                pixels: 16,
                limit: 15
            }
        ));
    }

    #[test]
    fn test_frame_cap() {
        let opts = DecodeOptions {
            max_frames: 1,
            ..Default::default()
        };
        let image = decode(&two_frame_disposal_gif(), &opts).unwrap();
        assert_eq!(image.frames.len(), 1);
        assert!(!image.is_animated());
    }

    #[test]
    fn test_no_frames() {
        let bytes = gif_bytes(2, 2, &[]);
        let err = decode(&bytes, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::NoFrames));
    }

    #[test]
    fn test_png_still_fallback() {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&[10, 20, 30, 255], 1, 1, ExtendedColorType::Rgba8)
            .unwrap();

        let image = decode(&png, &DecodeOptions::default()).unwrap();
        assert_eq!(image.frames.len(), 1);
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.frames[0].delay, Duration::from_millis(100));

        let strict = DecodeOptions {
            strict: true,
            ..Default::default()
        };
        assert!(matches!(decode(&png, &strict), Err(DecodeError::Codec(_))));
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = decode(b"definitely not an image", &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::Codec(_)));
    }
}
