// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer-shell overlay surfaces.
//!
//! A surface is unconfigured until the compositor's first configure event
//! arrives; no buffer may be attached before that. Creation therefore ends
//! with a round-trip performed by the context. Configure events are acked
//! here and queued as [`Event::LayerSurfaceConfigure`] so the run loop can
//! resize the backend's render target.

use lacquer_core::error::{Error, ErrorKind};
use lacquer_core::event::Event;
use lacquer_core::geometry::{Extent, Rect};
use lacquer_core::id::{OutputId, SurfaceId};
use lacquer_core::render::FramePacer;
use wayland_client::protocol::wl_callback::{self, WlCallback};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};
use wayland_protocols::wp::fractional_scale::v1::client::wp_fractional_scale_v1::{
    self, WpFractionalScaleV1,
};
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_surface_v1::{
    self, KeyboardInteractivity, ZwlrLayerSurfaceV1,
};

use crate::backend::RenderTarget;
use crate::config::{Layer, SurfaceOptions};
use crate::context::State;
use crate::timer::Instant;

/// Denominator of the fractional-scale protocol's preferred scale.
const FRACTIONAL_DENOMINATOR: f64 = 120.0;

/// An overlay surface pinned to a shell layer.
#[derive(Debug)]
pub struct LayerSurface {
    pub(crate) wl: WlSurface,
    shell: ZwlrLayerSurfaceV1,
    layer: Layer,
    output: Option<OutputId>,
    pub(crate) viewport: Option<WpViewport>,
    fractional: Option<WpFractionalScaleV1>,
    size: Extent,
    scale: f64,
    configured: bool,
    closed: bool,
    pointer_interaction: bool,
    pub(crate) pacer: FramePacer,
    pub(crate) last_frame: Option<Instant>,
    pub(crate) target: Option<RenderTarget>,
}

impl LayerSurface {
    /// Output the surface was created for, if any.
    #[must_use]
    pub fn output(&self) -> Option<OutputId> {
        self.output
    }

    /// Shell layer.
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Negotiated size in logical units.
    #[must_use]
    pub fn size(&self) -> Extent {
        self.size
    }

    /// Preferred fractional scale, `1.0` unless negotiated.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Size of the backing buffer in pixels.
    ///
    /// With a viewport the buffer is rendered at the fractional scale and
    /// sampled back to the logical size; without one it is the logical size.
    #[must_use]
    pub fn buffer_extent(&self) -> Extent {
        if self.viewport.is_none() {
            return self.size;
        }
        Extent {
            width: scaled(self.size.width, self.scale),
            height: scaled(self.size.height, self.scale),
        }
    }

    /// Whether the first configure event was received.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Whether the compositor closed the surface.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether no frame callback is outstanding.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pacer.is_ready()
    }

    /// Whether input reaches this surface.
    #[must_use]
    pub fn pointer_interaction(&self) -> bool {
        self.pointer_interaction
    }

    /// Routes pointer input to the surface, or lets it pass through.
    pub(crate) fn set_pointer_interaction(
        &mut self,
        enable: bool,
        compositor: &WlCompositor,
        qh: &QueueHandle<State>,
    ) {
        self.pointer_interaction = enable;
        if enable {
            self.wl.set_input_region(None);
        } else {
            self.set_input_rects(&[], compositor, qh);
        }
        self.wl.commit();
    }

    /// Installs `rects` (surface-local) as the input region.
    pub(crate) fn set_input_rects(
        &mut self,
        rects: &[Rect],
        compositor: &WlCompositor,
        qh: &QueueHandle<State>,
    ) {
        let region = compositor.create_region(qh, ());
        for rect in rects {
            region.add(rect.x, rect.y, rect.w, rect.h);
        }
        self.wl.set_input_region(Some(&region));
        region.destroy();
    }

    pub(crate) fn set_keyboard_interaction(&self, enable: bool) {
        self.shell.set_keyboard_interactivity(if enable {
            KeyboardInteractivity::Exclusive
        } else {
            KeyboardInteractivity::None
        });
        self.wl.commit();
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "scaled surface sizes stay far below u32::MAX"
)]
fn scaled(length: u32, scale: f64) -> u32 {
    (f64::from(length) * scale).round().max(1.0) as u32
}

impl Drop for LayerSurface {
    fn drop(&mut self) {
        drop(self.target.take());
        self.shell.destroy();
        if let Some(viewport) = self.viewport.take() {
            viewport.destroy();
        }
        if let Some(fractional) = self.fractional.take() {
            fractional.destroy();
        }
        self.wl.destroy();
    }
}

/// Creates a layer surface and commits its initial state.
///
/// The caller must round-trip before attaching a buffer. The surface is
/// removed again, releasing everything created so far, if any protocol
/// object could not be created.
pub(crate) fn create(
    state: &mut State,
    output: Option<OutputId>,
    options: &SurfaceOptions,
    qh: &QueueHandle<State>,
) -> Result<SurfaceId, Error> {
    let wl_output = match output {
        Some(id) => Some(
            state
                .outputs
                .get(id)
                .ok_or(ErrorKind::INVALID_HANDLE)?
                .wl
                .clone(),
        ),
        None => None,
    };
    let fractional_manager = match (options.fractional_scale, &state.globals.fractional_scale) {
        (false, _) => None,
        (true, Some(manager)) => Some(manager.clone()),
        (true, None) => return Err(ErrorKind::NO_FRACTIONAL_SCALE.into()),
    };
    let viewporter = match (options.viewport, &state.globals.viewporter) {
        (false, _) => None,
        (true, Some(viewporter)) => Some(viewporter.clone()),
        (true, None) => return Err(ErrorKind::NO_VIEWPORTER.into()),
    };

    let compositor = state.globals.compositor.clone();
    let layer_shell = state.globals.layer_shell.clone();
    let id = state.surfaces.insert_with(|id| {
        let wl = compositor.create_surface(qh, id);
        let shell = layer_shell.get_layer_surface(
            &wl,
            wl_output.as_ref(),
            options.layer.to_protocol(),
            options.namespace.clone(),
            qh,
            id,
        );
        shell.set_anchor(options.anchor.to_protocol());
        shell.set_size(options.width, options.height);
        shell.set_exclusive_zone(options.exclusive_zone);
        let fractional = fractional_manager.map(|m| m.get_fractional_scale(&wl, qh, id));
        let viewport = viewporter.map(|v| v.get_viewport(&wl, qh, ()));
        LayerSurface {
            wl,
            shell,
            layer: options.layer,
            output,
            viewport,
            fractional,
            size: Extent::default(),
            scale: 1.0,
            configured: false,
            closed: false,
            pointer_interaction: true,
            pacer: FramePacer::new(),
            last_frame: None,
            target: None,
        }
    });

    let failure = state.surfaces.get_mut(id).and_then(|surface| {
        surface.shell.set_keyboard_interactivity(if options.keyboard_interaction {
            KeyboardInteractivity::Exclusive
        } else {
            KeyboardInteractivity::None
        });
        if !options.pointer_interaction {
            surface.pointer_interaction = false;
            surface.set_input_rects(&[], &compositor, qh);
        }
        surface.wl.commit();

        if !surface.wl.is_alive() {
            Some(ErrorKind::SURFACE_INIT)
        } else if !surface.shell.is_alive() {
            Some(ErrorKind::LAYER_SURFACE_INIT)
        } else if surface.fractional.as_ref().is_some_and(|f| !f.is_alive()) {
            Some(ErrorKind::FRACTIONAL_SCALE_INIT)
        } else if surface.viewport.as_ref().is_some_and(|v| !v.is_alive()) {
            Some(ErrorKind::VIEWPORT_INIT)
        } else {
            None
        }
    });
    if let Some(kind) = failure {
        state.surfaces.remove(id);
        tracing::warn!(?output, err = %Error::from(kind), "layer surface creation failed");
        return Err(kind.into());
    }
    tracing::debug!(?id, ?output, layer = ?options.layer, "layer surface created");
    Ok(id)
}

impl Dispatch<ZwlrLayerSurfaceV1, SurfaceId> for State {
    fn event(
        state: &mut Self,
        proxy: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(surface) = state.surfaces.get_mut(*id) else {
            return;
        };
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                proxy.ack_configure(serial);
                surface.size = Extent { width, height };
                surface.configured = true;
                state.events.push(Event::LayerSurfaceConfigure {
                    output: surface.output,
                    surface: *id,
                    width,
                    height,
                });
            }
            zwlr_layer_surface_v1::Event::Closed => {
                tracing::warn!(?id, "layer surface closed by the compositor");
                surface.closed = true;
            }
            _ => {}
        }
    }
}

impl Dispatch<WpFractionalScaleV1, SurfaceId> for State {
    fn event(
        state: &mut Self,
        _proxy: &WpFractionalScaleV1,
        event: wp_fractional_scale_v1::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let wp_fractional_scale_v1::Event::PreferredScale { scale } = event else {
            return;
        };
        let Some(surface) = state.surfaces.get_mut(*id) else {
            return;
        };
        surface.scale = f64::from(scale) / FRACTIONAL_DENOMINATOR;
        tracing::debug!(?id, scale = surface.scale, "preferred scale");
        if surface.configured {
            state.events.push(Event::LayerSurfaceConfigure {
                output: surface.output,
                surface: *id,
                width: surface.size.width,
                height: surface.size.height,
            });
        }
    }
}

impl Dispatch<WlCallback, SurfaceId> for State {
    fn event(
        state: &mut Self,
        _proxy: &WlCallback,
        event: wl_callback::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let wl_callback::Event::Done { .. } = event else {
            return;
        };
        if let Some(surface) = state.surfaces.get_mut(*id)
            && surface.pacer.frame_done()
        {
            state.deferred.push(*id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FRACTIONAL_DENOMINATOR, scaled};

    #[test]
    fn scaled_lengths_round_and_never_vanish() {
        assert_eq!(scaled(1920, 1.0), 1920);
        assert_eq!(scaled(1920, 180.0 / FRACTIONAL_DENOMINATOR), 2880);
        assert_eq!(scaled(1001, 1.25), 1251);
        assert_eq!(scaled(0, 2.0), 1);
    }
}
