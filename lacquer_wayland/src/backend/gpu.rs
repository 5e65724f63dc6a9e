// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `wgpu` surfaces over layer surfaces.
//!
//! The adapter and device are requested lazily with the first surface so
//! that the adapter is compatible with it. Each layer surface gets its own
//! `wgpu::Surface` built from the raw `wl_display` and `wl_surface`
//! pointers; presenting commits the Wayland surface, so the frame callback
//! and viewport destination are set up just before `present`.

use std::ptr::NonNull;

use lacquer_core::error::{Error, ErrorKind};
use lacquer_core::geometry::Extent;
use lacquer_core::id::SurfaceId;
use lacquer_core::render::FramePacer;
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle,
};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Proxy};

use super::{BackendCtx, Presented, RenderView, buffer_layout};

struct GpuDevice {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

pub(crate) struct GpuBackend {
    instance: wgpu::Instance,
    device: Option<GpuDevice>,
}

pub(crate) struct GpuTarget {
    surface: wgpu::Surface<'static>,
    config: Option<wgpu::SurfaceConfiguration>,
}

impl GpuBackend {
    pub(super) fn new() -> Self {
        Self {
            instance: wgpu::Instance::default(),
            device: None,
        }
    }

    pub(super) fn associate(
        &mut self,
        conn: &Connection,
        wl: &WlSurface,
        extent: Extent,
    ) -> Result<GpuTarget, Error> {
        let display = NonNull::new(conn.backend().display_ptr().cast())
            .ok_or(ErrorKind::BACKEND_INIT)?;
        let window = NonNull::new(wl.id().as_ptr().cast()).ok_or(ErrorKind::SURFACE_INIT)?;
        let target = wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle: RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display)),
            raw_window_handle: RawWindowHandle::Wayland(WaylandWindowHandle::new(window)),
        };

        #[expect(unsafe_code, reason = "wgpu needs raw Wayland handles")]
        // SAFETY: the connection outlives the context, and the layer surface
        // drops this target before destroying its `wl_surface`.
        let surface = unsafe { self.instance.create_surface_unsafe(target) }.map_err(|err| {
            tracing::warn!(%err, "wgpu surface creation failed");
            Error::from(ErrorKind::BACKEND_INIT)
        })?;

        if self.device.is_none() {
            self.device = Some(request_device(&self.instance, &surface)?);
        }
        let mut target = GpuTarget {
            surface,
            config: None,
        };
        self.resize(&mut target, extent);
        Ok(target)
    }

    pub(super) fn resize(&self, target: &mut GpuTarget, extent: Extent) {
        let Some(gpu) = &self.device else {
            return;
        };
        let layout = buffer_layout(extent);
        if target
            .config
            .as_ref()
            .is_some_and(|c| (c.width, c.height) == (layout.width, layout.height))
        {
            return;
        }
        let Some(mut config) = target
            .surface
            .get_default_config(&gpu.adapter, layout.width, layout.height)
        else {
            tracing::warn!("wgpu surface not supported by the adapter");
            return;
        };
        let caps = target.surface.get_capabilities(&gpu.adapter);
        if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            config.alpha_mode = wgpu::CompositeAlphaMode::PreMultiplied;
        }
        target.surface.configure(&gpu.device, &config);
        target.config = Some(config);
    }

    pub(super) fn render(
        &self,
        target: &mut GpuTarget,
        presented: &Presented<'_>,
        ctx: &BackendCtx<'_>,
        id: SurfaceId,
        pacer: &mut FramePacer,
        paint: impl FnOnce(RenderView<'_>),
    ) {
        let (Some(gpu), Some(config)) = (&self.device, &target.config) else {
            return;
        };
        let frame = match target.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                target.surface.configure(&gpu.device, config);
                return;
            }
            Err(err) => {
                tracing::warn!(?id, %err, "failed to acquire GPU frame");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        paint(RenderView::Gpu {
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
            format: config.format,
        });
        presented.prepare(ctx, id, pacer, ctx.frame_callbacks);
        frame.present();
    }
}

fn request_device(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<GpuDevice, Error> {
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        compatible_surface: Some(surface),
        ..wgpu::RequestAdapterOptions::default()
    }))
    .ok_or_else(|| {
        tracing::error!("no suitable GPU adapter found");
        Error::from(ErrorKind::BACKEND_INIT)
    })?;

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("lacquer"),
            ..wgpu::DeviceDescriptor::default()
        },
        None,
    ))
    .map_err(|err| {
        tracing::error!(%err, "failed to create device");
        Error::from(ErrorKind::BACKEND_INIT)
    })?;
    tracing::debug!(adapter = ?adapter.get_info().name, "GPU device ready");
    Ok(GpuDevice {
        adapter,
        device,
        queue,
    })
}
