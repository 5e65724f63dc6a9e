// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-memory pixel buffers.
//!
//! A [`SharedBuffer`] is an anonymous memory file, its mapping, and the
//! compositor-side `wl_buffer` created from it. The pool used to create the
//! buffer is destroyed immediately; the buffer keeps the memory alive on the
//! compositor side. Teardown unmaps, closes the descriptor, then destroys
//! the `wl_buffer`.

use std::fs::File;
use std::os::fd::AsFd;

use lacquer_core::buffer::{self, BufferLayout, PixelFormat};
use lacquer_core::error::{Error, ErrorKind};
use memmap2::MmapMut;
use rustix::fs::{MemfdFlags, ftruncate, memfd_create};
use wayland_client::QueueHandle;
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_shm::{self, WlShm};

use crate::context::State;

/// A pixel buffer shared with the compositor.
///
/// The buffer must not be written between attaching it to a surface and the
/// compositor releasing it.
#[derive(Debug)]
pub struct SharedBuffer {
    mmap: Option<MmapMut>,
    file: Option<File>,
    buffer: WlBuffer,
    layout: BufferLayout,
}

impl SharedBuffer {
    pub(crate) fn new(
        shm: &WlShm,
        qh: &QueueHandle<State>,
        layout: BufferLayout,
    ) -> Result<Self, Error> {
        let format = shm_format(layout.format).ok_or(ErrorKind::BUFFER_ALLOCATION)?;
        let len = layout.byte_len();
        let (Ok(pool_len), Ok(width), Ok(height), Ok(stride)) = (
            i32::try_from(len),
            i32::try_from(layout.width),
            i32::try_from(layout.height),
            i32::try_from(layout.stride()),
        ) else {
            tracing::warn!(?layout, "shared buffer too large");
            return Err(ErrorKind::BUFFER_ALLOCATION.into());
        };

        let fd = memfd_create("lacquer-shm", MemfdFlags::CLOEXEC).map_err(|err| {
            tracing::warn!(%err, "memfd_create failed");
            Error::from(ErrorKind::BUFFER_ALLOCATION)
        })?;
        ftruncate(&fd, len).map_err(|err| {
            tracing::warn!(%err, len, "ftruncate failed");
            Error::from(ErrorKind::BUFFER_ALLOCATION)
        })?;
        let file = File::from(fd);

        #[expect(unsafe_code, reason = "mapping a memfd this process created and sized")]
        // SAFETY: the file is private to this buffer until shared with the
        // compositor, which only reads it, and it is never truncated again.
        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|err| {
            tracing::warn!(%err, len, "mmap failed");
            Error::from(ErrorKind::BUFFER_ALLOCATION)
        })?;

        let pool = shm.create_pool(file.as_fd(), pool_len, qh, ());
        let buffer = pool.create_buffer(0, width, height, stride, format, qh, ());
        pool.destroy();

        tracing::debug!(width, height, ?layout.format, "shared buffer created");
        Ok(Self {
            mmap: Some(mmap),
            file: Some(file),
            buffer,
            layout,
        })
    }

    /// Dimensions and format.
    #[must_use]
    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Bytes per row.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.layout.stride()
    }

    /// Pixel format.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    /// Pixel bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or_default()
    }

    /// Pixel bytes, row-major, writable.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.mmap.as_deref_mut().unwrap_or_default()
    }

    /// The compositor-side buffer.
    #[must_use]
    pub fn wl_buffer(&self) -> &WlBuffer {
        &self.buffer
    }

    /// Copies `src` into this buffer.
    ///
    /// Identical formats are copied verbatim; RGB-ordered sources are
    /// converted into BGR-ordered destinations and vice versa. Returns
    /// `false` and leaves this buffer untouched when the sizes differ or no
    /// conversion exists.
    pub fn copy_from(&mut self, src: &Self) -> bool {
        if (src.width(), src.height()) != (self.width(), self.height()) {
            return false;
        }
        let dst_format = self.format();
        buffer::convert(src.format(), src.data(), dst_format, self.data_mut())
    }
}

impl Drop for SharedBuffer {
    fn drop(&mut self) {
        drop(self.mmap.take());
        drop(self.file.take());
        self.buffer.destroy();
    }
}

fn shm_format(format: PixelFormat) -> Option<wl_shm::Format> {
    match format {
        PixelFormat::Argb8888 => Some(wl_shm::Format::Argb8888),
        PixelFormat::Xrgb8888 => Some(wl_shm::Format::Xrgb8888),
        PixelFormat::Abgr8888 => Some(wl_shm::Format::Abgr8888),
        PixelFormat::Xbgr8888 => Some(wl_shm::Format::Xbgr8888),
        PixelFormat::Other(code) => wl_shm::Format::try_from(code).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::shm_format;
    use lacquer_core::buffer::PixelFormat;
    use wayland_client::protocol::wl_shm;

    #[test]
    fn core_format_codes_match_protocol_codes() {
        for format in [
            PixelFormat::Argb8888,
            PixelFormat::Xrgb8888,
            PixelFormat::Abgr8888,
            PixelFormat::Xbgr8888,
        ] {
            let wl = shm_format(format).map(u32::from);
            assert_eq!(wl, Some(format.code()), "{format:?}");
        }
    }

    #[test]
    fn other_formats_pass_through_when_known() {
        let rgb565 = u32::from(wl_shm::Format::Rgb565);
        assert_eq!(shm_format(PixelFormat::Other(rgb565)), Some(wl_shm::Format::Rgb565));
        assert_eq!(shm_format(PixelFormat::Other(0xdead_beef)), None);
    }
}
