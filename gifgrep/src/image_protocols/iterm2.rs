// ABOUTME: iTerm2 terminal inline image protocol implementation
// ABOUTME: Sends whole files via OSC 1337; iTerm animates GIF payloads itself

use super::{InlineProtocol, InlineRenderer};
use crate::decode::DecodedFrame;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::io::{self, Write};

pub struct ItermRenderer;

impl InlineRenderer for ItermRenderer {
    fn protocol(&self) -> InlineProtocol {
        InlineProtocol::Iterm
    }

    // Only raw GIF files animate; decoded frames cannot be looped by the terminal.
    fn supports_native_animation(&self) -> bool {
        false
    }

    fn send_frame(
        &self,
        out: &mut dyn Write,
        _image_id: u32,
        frame: &DecodedFrame,
        cols: u16,
        rows: u16,
    ) -> io::Result<()> {
        self.send_inline_file(out, "gifgrep.png", &frame.png, cols, rows)
    }

    fn send_animation(
        &self,
        out: &mut dyn Write,
        image_id: u32,
        frames: &[DecodedFrame],
        cols: u16,
        rows: u16,
    ) -> io::Result<()> {
        match frames.first() {
            Some(first) => self.send_frame(out, image_id, first, cols, rows),
            None => Ok(()),
        }
    }

    // Inline files live in the text grid; there is nothing to re-place or delete.
    fn place(&self, _out: &mut dyn Write, _image_id: u32, _cols: u16, _rows: u16) -> io::Result<()> {
        Ok(())
    }

    fn delete(&self, _out: &mut dyn Write, _image_id: u32) -> io::Result<()> {
        Ok(())
    }

    fn send_inline_file(
        &self,
        out: &mut dyn Write,
        name: &str,
        bytes: &[u8],
        cols: u16,
        rows: u16,
    ) -> io::Result<()> {
        write!(
            out,
            "\x1b]1337;File=name={};size={};width={};height={};preserveAspectRatio=1;inline=1:{}\x07",
            STANDARD.encode(name.as_bytes()),
            bytes.len(),
            cols,
            rows,
            STANDARD.encode(bytes)
        )
    }

    fn clear_all(&self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}
