// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared buffer sizing and pixel conversion.
//!
//! Every buffer-backed render target uses the same wire layout: 32 bits per
//! pixel, row-major, `stride = width * 4`. Surfaces may be configured with a
//! zero dimension during negotiation, in which case a 1×1 placeholder is
//! allocated instead of failing. [`BufferSlot`] only reallocates when the
//! requested size actually changes.

/// Bytes per pixel of every shared buffer.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Channel layout of a 32-bit pixel, named after the compositor's format
/// codes (little-endian words).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// `B G R A` in memory.
    Argb8888,
    /// `B G R X` in memory.
    Xrgb8888,
    /// `R G B A` in memory.
    Abgr8888,
    /// `R G B X` in memory.
    Xbgr8888,
    /// Any other compositor format code.
    Other(u32),
}

const ABGR8888_CODE: u32 = 0x3432_4241;
const XBGR8888_CODE: u32 = 0x3432_4258;

impl PixelFormat {
    /// Format written by the raw and vector backends.
    pub const NATIVE: Self = Self::Argb8888;

    /// Maps a compositor format code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Argb8888,
            1 => Self::Xrgb8888,
            ABGR8888_CODE => Self::Abgr8888,
            XBGR8888_CODE => Self::Xbgr8888,
            other => Self::Other(other),
        }
    }

    /// The compositor format code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Argb8888 => 0,
            Self::Xrgb8888 => 1,
            Self::Abgr8888 => ABGR8888_CODE,
            Self::Xbgr8888 => XBGR8888_CODE,
            Self::Other(code) => code,
        }
    }

    const fn is_rgb_order(self) -> bool {
        matches!(self, Self::Abgr8888 | Self::Xbgr8888)
    }

    const fn is_bgr_order(self) -> bool {
        matches!(self, Self::Argb8888 | Self::Xrgb8888)
    }
}

/// Dimensions and format of a shared buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferLayout {
    /// Width in pixels, never zero.
    pub width: u32,
    /// Height in pixels, never zero.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
}

impl BufferLayout {
    /// A layout for the given size, degrading zero dimensions to one.
    #[must_use]
    pub const fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
            format,
        }
    }

    /// Bytes per row.
    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.width.saturating_mul(BYTES_PER_PIXEL)
    }

    /// Total size in bytes.
    #[must_use]
    pub const fn byte_len(&self) -> u64 {
        self.stride() as u64 * self.height as u64
    }
}

/// Holds at most one buffer together with the layout it was allocated for.
#[derive(Debug)]
pub struct BufferSlot<B> {
    current: Option<(BufferLayout, B)>,
}

impl<B> Default for BufferSlot<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> BufferSlot<B> {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Layout of the held buffer.
    #[must_use]
    pub fn layout(&self) -> Option<BufferLayout> {
        self.current.as_ref().map(|(layout, _)| *layout)
    }

    /// The held buffer.
    #[must_use]
    pub fn get(&self) -> Option<&B> {
        self.current.as_ref().map(|(_, buffer)| buffer)
    }

    /// The held buffer, mutably.
    pub fn get_mut(&mut self) -> Option<&mut B> {
        self.current.as_mut().map(|(_, buffer)| buffer)
    }

    /// Releases the held buffer to the caller.
    pub fn take(&mut self) -> Option<B> {
        self.current.take().map(|(_, buffer)| buffer)
    }

    /// Makes sure the slot holds a buffer of `requested` layout.
    ///
    /// Calls `alloc` only when the slot is empty or the layout differs.
    /// The previous buffer is dropped after the replacement is allocated;
    /// on failure the slot keeps it. Returns whether an allocation happened.
    pub fn ensure<E>(
        &mut self,
        requested: BufferLayout,
        alloc: impl FnOnce(BufferLayout) -> Result<B, E>,
    ) -> Result<bool, E> {
        if self.layout() == Some(requested) {
            return Ok(false);
        }
        let buffer = alloc(requested)?;
        self.current = Some((requested, buffer));
        Ok(true)
    }
}

/// Copies `src` into `dst`, converting between channel orders if needed.
///
/// Same-format copies are verbatim. RGB-ordered sources convert into
/// BGR-ordered destinations by swapping the red and blue bytes. Returns
/// `false` without touching `dst` when the lengths differ or the formats
/// have no conversion.
pub fn convert(src_format: PixelFormat, src: &[u8], dst_format: PixelFormat, dst: &mut [u8]) -> bool {
    if src.len() != dst.len() {
        return false;
    }
    if src_format == dst_format {
        dst.copy_from_slice(src);
        return true;
    }
    if (src_format.is_rgb_order() && dst_format.is_bgr_order())
        || (src_format.is_bgr_order() && dst_format.is_rgb_order())
    {
        swap_red_blue(src, dst);
        return true;
    }
    false
}

/// Swaps bytes 0 and 2 of every pixel, keeping green and alpha.
pub fn swap_red_blue(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
        d[3] = s[3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_degrade_to_placeholder() {
        let layout = BufferLayout::new(0, 0, PixelFormat::NATIVE);
        assert_eq!((layout.width, layout.height), (1, 1));
        assert_eq!(layout.byte_len(), 4);

        let layout = BufferLayout::new(1920, 0, PixelFormat::NATIVE);
        assert_eq!(layout.height, 1);
        assert_eq!(layout.stride(), 7680);
    }

    #[test]
    fn identical_reconfigure_allocates_once() {
        let mut slot: BufferSlot<u32> = BufferSlot::new();
        let mut allocations = 0_u32;
        let layout = BufferLayout::new(640, 480, PixelFormat::NATIVE);

        for _ in 0..2 {
            let _ = slot.ensure(layout, |_| {
                allocations += 1;
                Ok::<_, ()>(allocations)
            });
        }
        assert_eq!(allocations, 1);

        let bigger = BufferLayout::new(800, 600, PixelFormat::NATIVE);
        assert_eq!(slot.ensure(bigger, |_| Ok::<_, ()>(99)), Ok(true));
        assert_eq!(slot.get(), Some(&99));
        assert_eq!(slot.layout(), Some(bigger));
    }

    #[test]
    fn failed_reallocation_keeps_previous_buffer() {
        let mut slot: BufferSlot<u32> = BufferSlot::new();
        let small = BufferLayout::new(1, 1, PixelFormat::NATIVE);
        assert_eq!(slot.ensure(small, |_| Ok::<_, ()>(1)), Ok(true));
        let big = BufferLayout::new(2, 2, PixelFormat::NATIVE);
        assert_eq!(slot.ensure(big, |_| Err("out of memory")), Err("out of memory"));
        assert_eq!(slot.get(), Some(&1));
        assert_eq!(slot.take(), Some(1));
        assert_eq!(slot.layout(), None);
    }

    #[test]
    fn format_codes_round_trip_known_values() {
        assert_eq!(PixelFormat::from_code(0), PixelFormat::Argb8888);
        assert_eq!(PixelFormat::from_code(0x3432_4258), PixelFormat::Xbgr8888);
        assert_eq!(PixelFormat::from_code(42), PixelFormat::Other(42));
        assert_eq!(PixelFormat::Abgr8888.code(), 0x3432_4241);
    }

    #[test]
    fn xbgr_source_is_swizzled_into_argb() {
        let src = [1_u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0_u8; 8];
        assert!(convert(PixelFormat::Xbgr8888, &src, PixelFormat::Argb8888, &mut dst));
        assert_eq!(dst, [3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn same_format_is_copied_verbatim() {
        let src = [9_u8; 8];
        let mut dst = [0_u8; 8];
        assert!(convert(PixelFormat::Xrgb8888, &src, PixelFormat::Xrgb8888, &mut dst));
        assert_eq!(dst, src);
    }

    #[test]
    fn mismatched_sizes_or_formats_are_ignored() {
        let src = [1_u8; 8];
        let mut short = [0_u8; 4];
        assert!(!convert(PixelFormat::Argb8888, &src, PixelFormat::Argb8888, &mut short));
        assert_eq!(short, [0; 4]);

        let mut dst = [0_u8; 8];
        assert!(!convert(PixelFormat::Other(7), &src, PixelFormat::Argb8888, &mut dst));
        assert_eq!(dst, [0; 8]);
    }
}
