// ABOUTME: Kitty terminal graphics protocol implementation
// ABOUTME: Handles base64 chunking, frame-based animation, placement and deletion by image id

use super::{InlineProtocol, InlineRenderer};
use crate::decode::DecodedFrame;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::io::{self, Write};

/// Payload chunk size; a multiple of 4 so every chunk is valid base64.
const CHUNK_SIZE: usize = 4096;

/// Fixed placement id so re-placing replaces instead of stacking.
const PLACEMENT_ID: u32 = 1;

pub struct KittyRenderer;

/// Writes `control` followed by the base64 payload split into `m=1/0` chunks.
fn write_chunked(out: &mut dyn Write, control: &str, data: &[u8]) -> io::Result<()> {
    let encoded = STANDARD.encode(data);
    let bytes = encoded.as_bytes();
    if bytes.is_empty() {
        return write!(out, "\x1b_G{},m=0;\x1b\\", control);
    }

    let total = bytes.len().div_ceil(CHUNK_SIZE);
    for (i, chunk) in bytes.chunks(CHUNK_SIZE).enumerate() {
        let more = if i + 1 < total { 1 } else { 0 };
        if i == 0 {
            write!(out, "\x1b_G{},m={};", control, more)?;
        } else {
            write!(out, "\x1b_Gm={};", more)?;
        }
        out.write_all(chunk)?;
        out.write_all(b"\x1b\\")?;
    }
    Ok(())
}

impl InlineRenderer for KittyRenderer {
    fn protocol(&self) -> InlineProtocol {
        InlineProtocol::Kitty
    }

    fn supports_native_animation(&self) -> bool {
        true
    }

    fn send_frame(
        &self,
        out: &mut dyn Write,
        image_id: u32,
        frame: &DecodedFrame,
        cols: u16,
        rows: u16,
    ) -> io::Result<()> {
        let control = format!(
            "a=T,f=100,i={},p={},c={},r={},C=1,q=2",
            image_id, PLACEMENT_ID, cols, rows
        );
        write_chunked(out, &control, &frame.png)
    }

    fn send_animation(
        &self,
        out: &mut dyn Write,
        image_id: u32,
        frames: &[DecodedFrame],
        cols: u16,
        rows: u16,
    ) -> io::Result<()> {
        let Some((first, rest)) = frames.split_first() else {
            return Ok(());
        };
        self.send_frame(out, image_id, first, cols, rows)?;
        write!(
            out,
            "\x1b_Ga=a,i={},r=1,z={},q=2\x1b\\",
            image_id,
            first.delay.as_millis()
        )?;
        for frame in rest {
            let control = format!(
                "a=f,i={},f=100,z={},q=2",
                image_id,
                frame.delay.as_millis()
            );
            write_chunked(out, &control, &frame.png)?;
        }
        // s=3 runs the animation, v=1 loops forever.
        write!(out, "\x1b_Ga=a,i={},s=3,v=1,q=2\x1b\\", image_id)
    }

    fn place(&self, out: &mut dyn Write, image_id: u32, cols: u16, rows: u16) -> io::Result<()> {
        write!(
            out,
            "\x1b_Ga=p,i={},p={},c={},r={},C=1,q=2\x1b\\",
            image_id, PLACEMENT_ID, cols, rows
        )
    }

    fn delete(&self, out: &mut dyn Write, image_id: u32) -> io::Result<()> {
        write!(out, "\x1b_Ga=d,d=I,i={},q=2\x1b\\", image_id)
    }

    fn clear_all(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"\x1b_Ga=d\x1b\\")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame(png: Vec<u8>, ms: u64) -> DecodedFrame {
        DecodedFrame {
            png,
            delay: Duration::from_millis(ms),
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_single_chunk_frame() {
        let out = render(|o| KittyRenderer.send_frame(o, 5, &frame(vec![1, 2, 3], 100), 20, 10));
        assert_eq!(
            out,
            format!(
                "\x1b_Ga=T,f=100,i=5,p=1,c=20,r=10,C=1,q=2,m=0;{}\x1b\\",
                STANDARD.encode([1, 2, 3])
            )
        );
    }

    #[test]
    fn test_large_payload_is_chunked() {
        // 3 * 2000 bytes encode to 8000 base64 chars: two chunks.
        let out = render(|o| KittyRenderer.send_frame(o, 1, &frame(vec![7; 6000], 100), 4, 4));
        assert_eq!(out.matches("\x1b_G").count(), 2);
        assert!(out.contains("q=2,m=1;"));
        assert!(out.contains("\x1b_Gm=0;"));
        for chunk in out.split("\x1b\\").filter(|s| !s.is_empty()) {
            let payload = chunk.split(';').nth(1).unwrap_or_default();
            assert!(payload.len() <= CHUNK_SIZE);
        }
    }

    #[test]
    fn test_animation_sequence() {
        let frames = vec![frame(vec![1], 80), frame(vec![2], 120), frame(vec![3], 40)];
        let out = render(|o| KittyRenderer.send_animation(o, 9, &frames, 10, 5));

        let transmit = out.find("a=T,f=100,i=9").unwrap();
        let gap = out.find("\x1b_Ga=a,i=9,r=1,z=80,q=2").unwrap();
        let second = out.find("a=f,i=9,f=100,z=120").unwrap();
        let third = out.find("a=f,i=9,f=100,z=40").unwrap();
        let start = out.find("\x1b_Ga=a,i=9,s=3,v=1,q=2").unwrap();
        assert!(transmit < gap && gap < second && second < third && third < start);
    }

    #[test]
    fn test_empty_animation_writes_nothing() {
        assert_eq!(render(|o| KittyRenderer.send_animation(o, 1, &[], 1, 1)), "");
    }

    #[test]
    fn test_place_delete_clear() {
        assert_eq!(
            render(|o| KittyRenderer.place(o, 3, 30, 12)),
            "\x1b_Ga=p,i=3,p=1,c=30,r=12,C=1,q=2\x1b\\"
        );
        assert_eq!(
            render(|o| KittyRenderer.delete(o, 3)),
            "\x1b_Ga=d,d=I,i=3,q=2\x1b\\"
        );
        assert_eq!(render(|o| KittyRenderer.clear_all(o)), "\x1b_Ga=d\x1b\\");
    }
}
