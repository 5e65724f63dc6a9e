// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor services bound from the registry.

use lacquer_core::error::{Error, ErrorKind, Services};
use wayland_client::Proxy;
use wayland_client::QueueHandle;
use wayland_client::globals::{BindError, GlobalList};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_shm::WlShm;
use wayland_protocols::wp::cursor_shape::v1::client::wp_cursor_shape_manager_v1::WpCursorShapeManagerV1;
use wayland_protocols::wp::fractional_scale::v1::client::wp_fractional_scale_manager_v1::WpFractionalScaleManagerV1;
use wayland_protocols::wp::viewporter::client::wp_viewporter::WpViewporter;
use wayland_protocols::xdg::xdg_output::zv1::client::zxdg_output_manager_v1::ZxdgOutputManagerV1;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::ZwlrLayerShellV1;
use wayland_protocols_wlr::screencopy::v1::client::zwlr_screencopy_manager_v1::ZwlrScreencopyManagerV1;

use crate::context::State;

/// Bound service handles. Mandatory services are always present.
#[derive(Debug)]
pub(crate) struct Globals {
    pub(crate) shm: WlShm,
    pub(crate) compositor: WlCompositor,
    pub(crate) layer_shell: ZwlrLayerShellV1,
    pub(crate) output_manager: ZxdgOutputManagerV1,
    pub(crate) cursor_shape: Option<WpCursorShapeManagerV1>,
    pub(crate) screencopy: Option<ZwlrScreencopyManagerV1>,
    pub(crate) fractional_scale: Option<WpFractionalScaleManagerV1>,
    pub(crate) viewporter: Option<WpViewporter>,
}

impl Globals {
    /// Binds every known service, failing with one kind per missing
    /// mandatory service.
    pub(crate) fn bind(globals: &GlobalList, qh: &QueueHandle<State>) -> Result<Self, Error> {
        let mut too_old = false;
        let shm: Option<WlShm> = accept(globals.bind(qh, 1..=1, ()), &mut too_old);
        let compositor: Option<WlCompositor> = accept(globals.bind(qh, 1..=4, ()), &mut too_old);
        let layer_shell: Option<ZwlrLayerShellV1> =
            accept(globals.bind(qh, 1..=4, ()), &mut too_old);
        let output_manager: Option<ZxdgOutputManagerV1> =
            accept(globals.bind(qh, 2..=3, ()), &mut too_old);

        let cursor_shape = globals.bind::<WpCursorShapeManagerV1, _, _>(qh, 1..=1, ()).ok();
        let screencopy = globals.bind::<ZwlrScreencopyManagerV1, _, _>(qh, 1..=3, ()).ok();
        let fractional_scale = globals
            .bind::<WpFractionalScaleManagerV1, _, _>(qh, 1..=1, ())
            .ok();
        let viewporter = globals.bind::<WpViewporter, _, _>(qh, 1..=1, ()).ok();

        let mut available = Services::empty();
        available.set(Services::SHM, shm.is_some());
        available.set(Services::COMPOSITOR, compositor.is_some());
        available.set(Services::LAYER_SHELL, layer_shell.is_some());
        available.set(Services::OUTPUT_MANAGER, output_manager.is_some());
        available.set(Services::CURSOR_SHAPE, cursor_shape.is_some());
        available.set(Services::SCREENCOPY, screencopy.is_some());
        available.set(Services::FRACTIONAL_SCALE, fractional_scale.is_some());
        available.set(Services::VIEWPORTER, viewporter.is_some());
        tracing::debug!(?available, "registry services bound");

        if let Err(err) = available.check_mandatory() {
            release_optional(cursor_shape, screencopy, fractional_scale, viewporter);
            if let Some(layer_shell) = layer_shell.filter(|l| l.version() >= 3) {
                layer_shell.destroy();
            }
            if let Some(output_manager) = output_manager {
                output_manager.destroy();
            }
            let err = if too_old {
                err.with(ErrorKind::PROTOCOL_VERSION)
            } else {
                err
            };
            tracing::error!(%err, "mandatory compositor services missing");
            return Err(err);
        }

        match (shm, compositor, layer_shell, output_manager) {
            (Some(shm), Some(compositor), Some(layer_shell), Some(output_manager)) => Ok(Self {
                shm,
                compositor,
                layer_shell,
                output_manager,
                cursor_shape,
                screencopy,
                fractional_scale,
                viewporter,
            }),
            _ => Err(ErrorKind::CONNECTION.into()),
        }
    }
}

fn accept<I>(result: Result<I, BindError>, too_old: &mut bool) -> Option<I> {
    match result {
        Ok(proxy) => Some(proxy),
        Err(BindError::UnsupportedVersion) => {
            *too_old = true;
            None
        }
        Err(BindError::NotPresent) => None,
    }
}

fn release_optional(
    cursor_shape: Option<WpCursorShapeManagerV1>,
    screencopy: Option<ZwlrScreencopyManagerV1>,
    fractional_scale: Option<WpFractionalScaleManagerV1>,
    viewporter: Option<WpViewporter>,
) {
    if let Some(manager) = cursor_shape {
        manager.destroy();
    }
    if let Some(manager) = screencopy {
        manager.destroy();
    }
    if let Some(manager) = fractional_scale {
        manager.destroy();
    }
    if let Some(viewporter) = viewporter {
        viewporter.destroy();
    }
}

impl Drop for Globals {
    fn drop(&mut self) {
        release_optional(
            self.cursor_shape.take(),
            self.screencopy.take(),
            self.fractional_scale.take(),
            self.viewporter.take(),
        );
        self.output_manager.destroy();
        if self.layer_shell.version() >= 3 {
            self.layer_shell.destroy();
        }
    }
}
