// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw pixel access to a shared buffer.

use lacquer_core::buffer::BufferSlot;
use lacquer_core::error::Error;
use lacquer_core::geometry::Extent;

use super::{BackendCtx, RenderView, buffer_layout};
use crate::shm::SharedBuffer;

pub(super) fn create(ctx: &BackendCtx<'_>, extent: Extent) -> Result<BufferSlot<SharedBuffer>, Error> {
    let mut slot = BufferSlot::new();
    resize(ctx, &mut slot, extent)?;
    Ok(slot)
}

/// Reallocates the slot's buffer if `extent` changed. Returns whether an
/// allocation happened.
pub(super) fn resize(
    ctx: &BackendCtx<'_>,
    slot: &mut BufferSlot<SharedBuffer>,
    extent: Extent,
) -> Result<bool, Error> {
    slot.ensure(buffer_layout(extent), |layout| {
        SharedBuffer::new(ctx.shm, ctx.qh, layout)
    })
}

pub(super) fn view(buffer: &mut SharedBuffer) -> RenderView<'_> {
    let layout = buffer.layout();
    RenderView::Pixels {
        width: layout.width,
        height: layout.height,
        stride: layout.stride(),
        format: layout.format,
        data: buffer.data_mut(),
    }
}
