// ABOUTME: Inline image protocol detection and rendering for terminal previews
// ABOUTME: Defines the renderer interface the session drives for kitty and iTerm terminals

use std::io::{self, Write};

use crate::decode::DecodedFrame;

pub mod detection;
pub mod iterm2;
pub mod kitty;
pub mod probe;

pub use detection::{InlineProtocol, UnknownProbePolicy, detect, detect_robust};
pub use iterm2::ItermRenderer;
pub use kitty::KittyRenderer;
pub use probe::ProbeOutcome;

/// Escape-sequence encoder for one inline image protocol. Callers position
/// the cursor first; every method writes at the current cursor.
pub trait InlineRenderer {
    fn protocol(&self) -> InlineProtocol;

    /// Whether the terminal can loop a multi-frame upload on its own.
    fn supports_native_animation(&self) -> bool;

    fn send_frame(
        &self,
        out: &mut dyn Write,
        image_id: u32,
        frame: &DecodedFrame,
        cols: u16,
        rows: u16,
    ) -> io::Result<()>;

    fn send_animation(
        &self,
        out: &mut dyn Write,
        image_id: u32,
        frames: &[DecodedFrame],
        cols: u16,
        rows: u16,
    ) -> io::Result<()>;

    /// Shows an already uploaded image at a new size without resending pixels.
    fn place(&self, out: &mut dyn Write, image_id: u32, cols: u16, rows: u16) -> io::Result<()>;

    fn delete(&self, out: &mut dyn Write, image_id: u32) -> io::Result<()>;

    fn send_inline_file(
        &self,
        _out: &mut dyn Write,
        _name: &str,
        _bytes: &[u8],
        _cols: u16,
        _rows: u16,
    ) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{} cannot display inline files", self.protocol()),
        ))
    }

    fn clear_all(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Renderer for a detected protocol; `None` has no renderer.
pub fn renderer_for(protocol: InlineProtocol) -> Option<Box<dyn InlineRenderer + Send>> {
    match protocol {
        InlineProtocol::Kitty => Some(Box::new(KittyRenderer)),
        InlineProtocol::Iterm => Some(Box::new(ItermRenderer)),
        InlineProtocol::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_for_protocol() {
        assert_eq!(
            renderer_for(InlineProtocol::Kitty).map(|r| r.protocol()),
            Some(InlineProtocol::Kitty)
        );
        assert_eq!(
            renderer_for(InlineProtocol::Iterm).map(|r| r.protocol()),
            Some(InlineProtocol::Iterm)
        );
        assert!(renderer_for(InlineProtocol::None).is_none());
    }

    #[test]
    fn test_kitty_does_not_send_inline_files() {
        let mut out = Vec::new();
        let err = KittyRenderer
            .send_inline_file(&mut out, "x.gif", b"GIF89a", 1, 1)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
