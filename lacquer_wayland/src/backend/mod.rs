// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render backends.
//!
//! A [`Backend`] is chosen once when the context is created and never
//! changes. The run loop only talks to it through a fixed set of calls:
//!
//! - `associate` creates a surface's render target and presents an initial
//!   frame,
//! - `on_configure` resizes the target after the compositor negotiated a new
//!   size,
//! - `render` brackets one paint: it opens a [`RenderView`], hands it to the
//!   application, and presents the result,
//! - `unassociate` releases the target.
//!
//! The raw and vector variants paint into a [`SharedBuffer`] of fixed 32-bit
//! format. The GPU variant renders into a `wgpu` surface created from the
//! raw Wayland handles.

mod raw;
#[cfg(feature = "vector")]
mod vector;
#[cfg(feature = "gpu")]
mod gpu;

use lacquer_core::buffer::{BufferLayout, BufferSlot, PixelFormat};
use lacquer_core::error::{Error, ErrorKind};
use lacquer_core::geometry::{Extent, Rect};
use lacquer_core::id::{OutputId, SurfaceId};
use lacquer_core::render::FramePacer;
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Proxy, QueueHandle};
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;

use crate::config::BackendKind;
use crate::context::State;
use crate::shm::SharedBuffer;
use crate::surface::LayerSurface;
use crate::timer::now;

/// Everything the application may paint with for one surface.
#[derive(Debug)]
#[non_exhaustive]
pub enum RenderView<'a> {
    /// No backend is active.
    None,
    /// Raw pixels of a shared buffer.
    Pixels {
        /// Row-major pixel bytes.
        data: &'a mut [u8],
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Bytes per row.
        stride: u32,
        /// Channel order.
        format: PixelFormat,
    },
    /// A premultiplied RGBA canvas presented after the callback returns.
    #[cfg(feature = "vector")]
    Canvas(&'a mut tiny_skia::Pixmap),
    /// The surface's current swapchain texture.
    #[cfg(feature = "gpu")]
    Gpu {
        /// Device the texture belongs to.
        device: &'a wgpu::Device,
        /// Queue to submit work on.
        queue: &'a wgpu::Queue,
        /// View of the texture to render into.
        view: &'a wgpu::TextureView,
        /// Texture format.
        format: wgpu::TextureFormat,
    },
}

/// One paint of one layer surface.
#[derive(Debug)]
pub struct RenderFrame<'a> {
    /// The surface being painted.
    pub surface: SurfaceId,
    /// Output the surface belongs to.
    pub output: Option<OutputId>,
    /// The output's logical rectangle, or the surface's own extent at the
    /// origin when it has no output.
    pub output_rect: Rect,
    /// Logical size of the surface.
    pub size: Extent,
    /// Fractional scale of the surface.
    pub scale: f64,
    /// Smoothed frame duration in seconds.
    pub delta_time: f64,
    /// Smoothed frames per second.
    pub fps: u32,
    /// What to paint into.
    pub view: RenderView<'a>,
}

/// Per-surface data owned by a [`Backend`].
pub(crate) enum RenderTarget {
    Buffer(BufferSlot<SharedBuffer>),
    #[cfg(feature = "vector")]
    Canvas(vector::Canvas),
    #[cfg(feature = "gpu")]
    Gpu(gpu::GpuTarget),
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer(slot) => f.debug_tuple("Buffer").field(&slot.layout()).finish(),
            #[cfg(feature = "vector")]
            Self::Canvas(canvas) => f.debug_tuple("Canvas").field(&canvas.layout()).finish(),
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => f.write_str("Gpu"),
        }
    }
}

/// Connection resources the backend calls need.
pub(crate) struct BackendCtx<'a> {
    pub(crate) conn: &'a Connection,
    pub(crate) shm: &'a WlShm,
    pub(crate) qh: &'a QueueHandle<State>,
    pub(crate) frame_callbacks: bool,
}

/// Surface-independent inputs of one paint.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameInfo {
    pub(crate) output_rect: Rect,
    pub(crate) delta_time: f64,
    pub(crate) fps: u32,
}

impl FrameInfo {
    fn frame<'a>(
        self,
        surface: SurfaceId,
        output: Option<OutputId>,
        size: Extent,
        scale: f64,
        view: RenderView<'a>,
    ) -> RenderFrame<'a> {
        RenderFrame {
            surface,
            output,
            output_rect: self.output_rect,
            size,
            scale,
            delta_time: self.delta_time,
            fps: self.fps,
            view,
        }
    }
}

/// The active render backend.
pub(crate) enum Backend {
    Raw,
    #[cfg(feature = "vector")]
    Vector,
    #[cfg(feature = "gpu")]
    Gpu(gpu::GpuBackend),
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Raw => "Backend::Raw",
            #[cfg(feature = "vector")]
            Self::Vector => "Backend::Vector",
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => "Backend::Gpu",
        })
    }
}

impl Backend {
    /// Instantiates the configured backend, or none.
    pub(crate) fn new(kind: BackendKind) -> Result<Option<Self>, Error> {
        let backend = match kind {
            BackendKind::None => return Ok(None),
            BackendKind::Raw => Self::Raw,
            #[cfg(feature = "vector")]
            BackendKind::Vector => Self::Vector,
            #[cfg(feature = "gpu")]
            BackendKind::Gpu => Self::Gpu(gpu::GpuBackend::new()),
            #[cfg(not(feature = "vector"))]
            BackendKind::Vector => return Err(unavailable(kind)),
            #[cfg(not(feature = "gpu"))]
            BackendKind::Gpu => return Err(unavailable(kind)),
        };
        tracing::debug!(?backend, "backend initialised");
        Ok(Some(backend))
    }

    /// Creates the render target of a freshly configured surface and
    /// presents an initial frame.
    pub(crate) fn associate(
        &mut self,
        ctx: &BackendCtx<'_>,
        id: SurfaceId,
        surface: &mut LayerSurface,
    ) -> Result<(), Error> {
        let extent = surface.buffer_extent();
        let target = match self {
            Self::Raw => raw::create(ctx, extent).map(RenderTarget::Buffer),
            #[cfg(feature = "vector")]
            Self::Vector => vector::Canvas::new(ctx, extent).map(RenderTarget::Canvas),
            #[cfg(feature = "gpu")]
            Self::Gpu(gpu) => gpu.associate(ctx.conn, &surface.wl, extent).map(RenderTarget::Gpu),
        }
        .map_err(|err| err.with(ErrorKind::BACKEND_ASSOCIATION))?;
        surface.target = Some(target);

        let logical = surface.size();
        let LayerSurface {
            wl,
            viewport,
            pacer,
            target,
            ..
        } = surface;
        let presented = Presented {
            wl,
            viewport: viewport.as_ref(),
            logical,
        };
        match target {
            Some(RenderTarget::Buffer(slot)) => {
                if let Some(buffer) = slot.get() {
                    presented.commit_buffer(ctx, id, pacer, buffer, false);
                }
            }
            #[cfg(feature = "vector")]
            Some(RenderTarget::Canvas(canvas)) => {
                if let Some(buffer) = canvas.buffer() {
                    presented.commit_buffer(ctx, id, pacer, buffer, false);
                }
            }
            #[cfg(feature = "gpu")]
            Some(RenderTarget::Gpu(_)) => wl.commit(),
            None => {}
        }
        Ok(())
    }

    /// Resizes a surface's render target after a configure event.
    ///
    /// Identical sizes are a no-op. Failures keep the previous target and
    /// are only logged.
    pub(crate) fn on_configure(&mut self, ctx: &BackendCtx<'_>, id: SurfaceId, surface: &mut LayerSurface) {
        let extent = surface.buffer_extent();
        let result = match (&mut *self, surface.target.as_mut()) {
            (_, None) => Ok(()),
            (_, Some(RenderTarget::Buffer(slot))) => raw::resize(ctx, slot, extent).map(drop),
            #[cfg(feature = "vector")]
            (_, Some(RenderTarget::Canvas(canvas))) => canvas.resize(ctx, extent),
            #[cfg(feature = "gpu")]
            (Self::Gpu(gpu), Some(RenderTarget::Gpu(target))) => {
                gpu.resize(target, extent);
                Ok(())
            }
            #[cfg(feature = "gpu")]
            (_, Some(RenderTarget::Gpu(_))) => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(?id, ?extent, %err, "render target resize failed");
        }
    }

    /// Paints one surface: opens a view, lets `paint` draw, and presents.
    pub(crate) fn render(
        &mut self,
        ctx: &BackendCtx<'_>,
        id: SurfaceId,
        surface: &mut LayerSurface,
        info: FrameInfo,
        paint: impl FnOnce(&mut RenderFrame<'_>),
    ) {
        let output = surface.output();
        let size = surface.size();
        let scale = surface.scale();
        surface.last_frame = Some(now());
        let LayerSurface {
            wl,
            viewport,
            pacer,
            target,
            ..
        } = surface;
        let presented = Presented {
            wl,
            viewport: viewport.as_ref(),
            logical: size,
        };

        match (&mut *self, target.as_mut()) {
            (_, None) => {}
            (_, Some(RenderTarget::Buffer(slot))) => {
                let Some(buffer) = slot.get_mut() else {
                    return;
                };
                paint(&mut info.frame(id, output, size, scale, raw::view(buffer)));
                presented.commit_buffer(ctx, id, pacer, buffer, ctx.frame_callbacks);
            }
            #[cfg(feature = "vector")]
            (_, Some(RenderTarget::Canvas(canvas))) => {
                let view = RenderView::Canvas(canvas.pixmap_mut());
                paint(&mut info.frame(id, output, size, scale, view));
                if let Some(buffer) = canvas.flush() {
                    presented.commit_buffer(ctx, id, pacer, buffer, ctx.frame_callbacks);
                }
            }
            #[cfg(feature = "gpu")]
            (Self::Gpu(gpu), Some(RenderTarget::Gpu(target))) => {
                gpu.render(target, &presented, ctx, id, pacer, |view| {
                    paint(&mut info.frame(id, output, size, scale, view));
                });
            }
            #[cfg(feature = "gpu")]
            (_, Some(RenderTarget::Gpu(_))) => {}
        }
    }

    /// Releases a surface's render target.
    pub(crate) fn unassociate(surface: &mut LayerSurface) {
        drop(surface.target.take());
    }
}

#[cfg(any(not(feature = "vector"), not(feature = "gpu")))]
fn unavailable(kind: BackendKind) -> Error {
    tracing::error!(?kind, "backend not compiled in");
    ErrorKind::BACKEND_UNAVAILABLE.into()
}

/// The parts of a surface touched when presenting.
struct Presented<'a> {
    wl: &'a WlSurface,
    viewport: Option<&'a WpViewport>,
    logical: Extent,
}

impl Presented<'_> {
    /// Attaches `buffer`, damages all of it, and commits.
    fn commit_buffer(
        &self,
        ctx: &BackendCtx<'_>,
        id: SurfaceId,
        pacer: &mut FramePacer,
        buffer: &SharedBuffer,
        request_frame: bool,
    ) {
        self.wl.attach(Some(buffer.wl_buffer()), 0, 0);
        if self.wl.version() >= 4 {
            self.wl.damage_buffer(0, 0, i32::MAX, i32::MAX);
        } else {
            self.wl.damage(0, 0, i32::MAX, i32::MAX);
        }
        self.finish(ctx, id, pacer, request_frame);
    }

    /// Applies the viewport, optionally requests a frame callback, and
    /// commits.
    fn finish(&self, ctx: &BackendCtx<'_>, id: SurfaceId, pacer: &mut FramePacer, request_frame: bool) {
        self.prepare(ctx, id, pacer, request_frame);
        self.wl.commit();
    }

    /// Sets the state the next commit applies, without committing.
    fn prepare(&self, ctx: &BackendCtx<'_>, id: SurfaceId, pacer: &mut FramePacer, request_frame: bool) {
        if let Some(viewport) = self.viewport
            && let (Ok(width @ 1..), Ok(height @ 1..)) = (
                i32::try_from(self.logical.width),
                i32::try_from(self.logical.height),
            )
        {
            viewport.set_destination(width, height);
        }
        if request_frame {
            self.wl.frame(ctx.qh, id);
            pacer.frame_requested();
        }
    }
}

/// Layout of a buffer backing `extent`, degrading empty sizes to 1×1.
fn buffer_layout(extent: Extent) -> BufferLayout {
    BufferLayout::new(extent.width, extent.height, PixelFormat::NATIVE)
}

#[cfg(test)]
mod tests {
    use super::buffer_layout;
    use lacquer_core::buffer::PixelFormat;
    use lacquer_core::geometry::Extent;

    #[test]
    fn zero_sized_surfaces_get_a_placeholder_buffer() {
        let layout = buffer_layout(Extent { width: 0, height: 0 });
        assert_eq!((layout.width, layout.height), (1, 1));
        assert_eq!(layout.byte_len(), 4);
        assert_eq!(layout.format, PixelFormat::NATIVE);
    }

    #[test]
    fn layouts_use_four_bytes_per_pixel() {
        let layout = buffer_layout(Extent {
            width: 1920,
            height: 1080,
        });
        assert_eq!(layout.stride(), 1920 * 4);
        assert_eq!(layout.byte_len(), 1920 * 1080 * 4);
    }
}
