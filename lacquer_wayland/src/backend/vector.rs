// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A `tiny-skia` canvas presented through a shared buffer.
//!
//! The canvas is premultiplied RGBA; the shared buffer is premultiplied
//! ARGB in little-endian byte order, so presenting swaps red and blue.

use lacquer_core::buffer::{self, BufferLayout, BufferSlot};
use lacquer_core::error::{Error, ErrorKind};
use lacquer_core::geometry::Extent;
use tiny_skia::Pixmap;

use super::{BackendCtx, buffer_layout, raw};
use crate::shm::SharedBuffer;

pub(crate) struct Canvas {
    slot: BufferSlot<SharedBuffer>,
    pixmap: Pixmap,
}

impl Canvas {
    pub(super) fn new(ctx: &BackendCtx<'_>, extent: Extent) -> Result<Self, Error> {
        let slot = raw::create(ctx, extent)?;
        let pixmap = pixmap_for(buffer_layout(extent))?;
        Ok(Self { slot, pixmap })
    }

    pub(super) fn layout(&self) -> Option<BufferLayout> {
        self.slot.layout()
    }

    pub(super) fn resize(&mut self, ctx: &BackendCtx<'_>, extent: Extent) -> Result<(), Error> {
        let layout = buffer_layout(extent);
        if (self.pixmap.width(), self.pixmap.height()) != (layout.width, layout.height) {
            self.pixmap = pixmap_for(layout)?;
        }
        raw::resize(ctx, &mut self.slot, extent).map(drop)
    }

    pub(super) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// The shared buffer as last presented.
    pub(super) fn buffer(&self) -> Option<&SharedBuffer> {
        self.slot.get()
    }

    /// Copies the canvas into the shared buffer.
    pub(super) fn flush(&mut self) -> Option<&SharedBuffer> {
        let buffer = self.slot.get_mut()?;
        if buffer.data().len() != self.pixmap.data().len() {
            tracing::debug!("canvas and buffer sizes disagree, skipping present");
            return None;
        }
        buffer::swap_red_blue(self.pixmap.data(), buffer.data_mut());
        Some(buffer)
    }
}

fn pixmap_for(layout: BufferLayout) -> Result<Pixmap, Error> {
    Pixmap::new(layout.width, layout.height).ok_or_else(|| {
        tracing::warn!(?layout, "canvas allocation failed");
        Error::from(ErrorKind::BUFFER_ALLOCATION)
    })
}

#[cfg(test)]
mod tests {
    use super::pixmap_for;
    use crate::backend::buffer_layout;
    use lacquer_core::buffer::swap_red_blue;
    use lacquer_core::geometry::Extent;
    use tiny_skia::Color;

    #[test]
    fn canvas_matches_buffer_byte_length() {
        let layout = buffer_layout(Extent {
            width: 37,
            height: 5,
        });
        let pixmap = pixmap_for(layout).unwrap();
        assert_eq!(pixmap.data().len() as u64, layout.byte_len());
    }

    #[test]
    fn presented_pixels_are_in_argb_byte_order() {
        let mut pixmap = pixmap_for(buffer_layout(Extent {
            width: 1,
            height: 1,
        }))
        .unwrap();
        pixmap.fill(Color::from_rgba8(255, 0, 0, 255));
        let mut out = [0_u8; 4];
        swap_red_blue(pixmap.data(), &mut out);
        // Little-endian ARGB stores blue, green, red, alpha.
        assert_eq!(out, [0, 0, 255, 255]);
    }
}
