// ABOUTME: Keeps the selected preview on screen: uploads, re-placements and manual playback
// ABOUTME: Decides between native terminal animation and timed per-frame pushes

use std::io::{self, Write};
use std::time::Instant;

use crossterm::{QueueableCommand, cursor, style::Print};

use crate::constants::ui::ITERM_FILE_NAME;
use crate::image_protocols::{InlineProtocol, InlineRenderer};
use crate::preview::CachedPreview;

/// Cell rectangle of a drawn preview. Row and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: u16,
    pub col: u16,
    pub cols: u16,
    pub rows: u16,
}

impl Placement {
    fn covers(&self, other: &Placement) -> bool {
        self.row == other.row
            && self.col == other.col
            && self.cols >= other.cols
            && self.rows >= other.rows
    }
}

/// The preview bound to the current selection.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    pub image_id: u32,
    pub preview: CachedPreview,
}

#[derive(Debug, Clone, Copy)]
struct ManualPlayback {
    frame: usize,
    next_due: Instant,
}

#[derive(Debug)]
pub struct Scheduler {
    handle: Option<AnimationHandle>,
    next_image_id: u32,
    /// Id currently uploaded to the terminal; 0 when none.
    active_image_id: u32,
    needs_send: bool,
    dirty: bool,
    last: Option<Placement>,
    manual: Option<ManualPlayback>,
    force_software: bool,
    animate: bool,
}

impl Scheduler {
    /// `force_software` drives frames manually even when the terminal could
    /// loop them; `animate = false` only ever shows the first frame.
    pub fn new(force_software: bool, animate: bool) -> Self {
        Self {
            handle: None,
            next_image_id: 1,
            active_image_id: 0,
            needs_send: false,
            dirty: false,
            last: None,
            manual: None,
            force_software,
            animate,
        }
    }

    pub fn handle(&self) -> Option<&AnimationHandle> {
        self.handle.as_ref()
    }

    pub fn needs_send(&self) -> bool {
        self.needs_send
    }

    pub fn is_software(&self) -> bool {
        self.force_software
    }

    pub fn is_manual(&self) -> bool {
        self.manual.is_some()
    }

    pub fn current_frame(&self) -> Option<usize> {
        self.manual.map(|m| m.frame)
    }

    /// Binds a freshly loaded preview, or clears the preview with `None`.
    pub fn set_preview(&mut self, preview: Option<CachedPreview>) {
        self.manual = None;
        match preview {
            Some(preview) => {
                let image_id = self.next_image_id;
                self.next_image_id = self.next_image_id.wrapping_add(1).max(1);
                self.handle = Some(AnimationHandle { image_id, preview });
                self.needs_send = true;
            }
            None => {
                self.handle = None;
                self.needs_send = false;
            }
        }
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Removes whatever is on screen once the preview has been cleared.
    pub fn release_if_cleared(
        &mut self,
        out: &mut dyn Write,
        renderer: &dyn InlineRenderer,
    ) -> io::Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        if self.active_image_id != 0 {
            renderer.delete(out, self.active_image_id)?;
            self.active_image_id = 0;
        }
        if let Some(last) = self.last.take() {
            if renderer.protocol() == InlineProtocol::Iterm {
                clear_rect(out, &last)?;
            }
        }
        Ok(())
    }

    /// Puts the current preview at `at`, uploading only what changed.
    pub fn draw(
        &mut self,
        out: &mut dyn Write,
        renderer: &dyn InlineRenderer,
        at: Placement,
        now: Instant,
    ) -> io::Result<()> {
        let Some(handle) = self.handle.clone() else {
            return Ok(());
        };
        if at.cols == 0 || at.rows == 0 {
            return Ok(());
        }
        let moved = self.last != Some(at);
        if !self.needs_send && !self.dirty && !moved {
            return Ok(());
        }

        if renderer.protocol() == InlineProtocol::Iterm {
            self.draw_in_grid(out, renderer, &handle, at)?;
        } else if self.uses_manual_playback(renderer, &handle) {
            self.draw_manual(out, renderer, &handle, at, now)?;
        } else {
            self.draw_native(out, renderer, &handle, at)?;
        }

        self.needs_send = false;
        self.dirty = false;
        self.last = Some(at);
        Ok(())
    }

    fn uses_manual_playback(&self, renderer: &dyn InlineRenderer, handle: &AnimationHandle) -> bool {
        self.animate
            && handle.preview.image.is_animated()
            && (self.force_software || !renderer.supports_native_animation())
    }

    /// Images that live in the text grid: clear the old cells and resend.
    fn draw_in_grid(
        &mut self,
        out: &mut dyn Write,
        renderer: &dyn InlineRenderer,
        handle: &AnimationHandle,
        at: Placement,
    ) -> io::Result<()> {
        if let Some(last) = self.last {
            clear_rect(out, &last)?;
            if !last.covers(&at) {
                clear_rect(out, &at)?;
            }
        }

        let raw = &handle.preview.raw;
        let animate = self.animate;
        at_cursor(out, at, |out| {
            if animate && !raw.is_empty() {
                renderer.send_inline_file(out, ITERM_FILE_NAME, raw, at.cols, at.rows)
            } else if let Some(first) = handle.preview.image.frames.first() {
                renderer.send_frame(out, handle.image_id, first, at.cols, at.rows)
            } else {
                Ok(())
            }
        })?;
        self.active_image_id = handle.image_id;
        Ok(())
    }

    fn draw_manual(
        &mut self,
        out: &mut dyn Write,
        renderer: &dyn InlineRenderer,
        handle: &AnimationHandle,
        at: Placement,
        now: Instant,
    ) -> io::Result<()> {
        if self.active_image_id != 0 && self.active_image_id != handle.image_id {
            renderer.delete(out, self.active_image_id)?;
        }
        self.active_image_id = handle.image_id;

        let frames = &handle.preview.image.frames;
        let index = match (self.needs_send, self.manual) {
            (false, Some(playback)) => playback.frame,
            _ => {
                let first_delay = frames.first().map(|f| f.delay).unwrap_or_default();
                self.manual = Some(ManualPlayback {
                    frame: 0,
                    next_due: now + first_delay,
                });
                0
            }
        };
        if let Some(frame) = frames.get(index) {
            at_cursor(out, at, |out| {
                renderer.send_frame(out, handle.image_id, frame, at.cols, at.rows)
            })?;
        }
        Ok(())
    }

    fn draw_native(
        &mut self,
        out: &mut dyn Write,
        renderer: &dyn InlineRenderer,
        handle: &AnimationHandle,
        at: Placement,
    ) -> io::Result<()> {
        if !self.needs_send && self.active_image_id == handle.image_id {
            return at_cursor(out, at, |out| {
                renderer.place(out, handle.image_id, at.cols, at.rows)
            });
        }

        if self.active_image_id != 0 {
            renderer.delete(out, self.active_image_id)?;
        }
        let frames = &handle.preview.image.frames;
        let animate = self.animate;
        at_cursor(out, at, |out| {
            if animate && frames.len() > 1 {
                renderer.send_animation(out, handle.image_id, frames, at.cols, at.rows)
            } else if let Some(first) = frames.first() {
                renderer.send_frame(out, handle.image_id, first, at.cols, at.rows)
            } else {
                Ok(())
            }
        })?;
        self.active_image_id = handle.image_id;
        Ok(())
    }

    /// Pushes the next frame when manual playback is due. Returns whether
    /// anything was written.
    pub fn tick(
        &mut self,
        out: &mut dyn Write,
        renderer: &dyn InlineRenderer,
        now: Instant,
    ) -> io::Result<bool> {
        let (Some(handle), Some(playback), Some(at)) = (&self.handle, self.manual, self.last) else {
            return Ok(false);
        };
        let frames = &handle.preview.image.frames;
        if frames.len() < 2 || now < playback.next_due {
            return Ok(false);
        }

        let frame = (playback.frame + 1) % frames.len();
        at_cursor(out, at, |out| {
            renderer.send_frame(out, handle.image_id, &frames[frame], at.cols, at.rows)
        })?;

        self.manual = Some(ManualPlayback {
            frame,
            next_due: now + frames[frame].delay,
        });
        Ok(true)
    }
}

/// Runs `draw` with the cursor parked at the placement, restoring it after.
fn at_cursor(
    out: &mut dyn Write,
    at: Placement,
    draw: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> io::Result<()> {
    out.queue(cursor::SavePosition)?
        .queue(cursor::MoveTo(at.col.saturating_sub(1), at.row.saturating_sub(1)))?;
    draw(out)?;
    out.queue(cursor::RestorePosition)?;
    Ok(())
}

/// Overwrites a cell rectangle with spaces.
pub fn clear_rect(out: &mut dyn Write, rect: &Placement) -> io::Result<()> {
    if rect.cols == 0 || rect.rows == 0 {
        return Ok(());
    }
    let blank = " ".repeat(usize::from(rect.cols));
    for row in rect.row..rect.row.saturating_add(rect.rows) {
        out.queue(cursor::MoveTo(rect.col.saturating_sub(1), row.saturating_sub(1)))?
            .queue(Print(&blank))?;
    }
    Ok(())
}
