// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connected outputs and their geometry.
//!
//! Each `wl_output` global becomes an [`Output`] in the context's arena, with
//! an xdg-output object attached for DPI-adjusted geometry. Geometry events
//! arrive asynchronously and are only complete after a round-trip.

use lacquer_core::geometry::Rect;
use lacquer_core::id::OutputId;
use lacquer_core::output::OutputGeometry;
use wayland_client::protocol::wl_output::{self, Transform, WlOutput};
use wayland_client::protocol::wl_registry::WlRegistry;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};
use wayland_protocols::xdg::xdg_output::zv1::client::zxdg_output_v1::{self, ZxdgOutputV1};

use crate::context::State;

const OUTPUT_VERSION: u32 = 3;

/// One monitor as advertised by the compositor.
#[derive(Debug)]
pub struct Output {
    pub(crate) wl: WlOutput,
    xdg: Option<ZxdgOutputV1>,
    global_name: u32,
    geometry: OutputGeometry,
    name: Option<String>,
    description: Option<String>,
}

impl Output {
    /// Logical rectangle in the global compositor space.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.geometry.rect()
    }

    /// Connector name such as `DP-1`, once reported.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Human-readable description, once reported.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Integer buffer scale.
    #[must_use]
    pub fn scale(&self) -> i32 {
        self.geometry.scale()
    }

    /// Whether the rectangle comes from the DPI-adjusted geometry service.
    #[must_use]
    pub fn has_logical_geometry(&self) -> bool {
        self.geometry.is_logical()
    }

    pub(crate) fn global_name(&self) -> u32 {
        self.global_name
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Some(xdg) = self.xdg.take() {
            xdg.destroy();
        }
        if self.wl.version() >= 3 {
            self.wl.release();
        }
    }
}

/// Binds a `wl_output` global and requests its logical geometry.
pub(crate) fn bind(
    state: &mut State,
    registry: &WlRegistry,
    global_name: u32,
    version: u32,
    qh: &QueueHandle<State>,
) -> OutputId {
    let manager = state.globals.output_manager.clone();
    let id = state.outputs.insert_with(|id| {
        let wl = registry.bind::<WlOutput, _, _>(global_name, version.min(OUTPUT_VERSION), qh, id);
        let xdg = Some(manager.get_xdg_output(&wl, qh, id));
        Output {
            wl,
            xdg,
            global_name,
            geometry: OutputGeometry::new(),
            name: None,
            description: None,
        }
    });
    tracing::debug!(?id, global_name, "output bound");
    id
}

fn is_quarter_turn(transform: WEnum<Transform>) -> bool {
    matches!(
        transform,
        WEnum::Value(
            Transform::_90 | Transform::_270 | Transform::Flipped90 | Transform::Flipped270
        )
    )
}

impl Dispatch<WlOutput, OutputId> for State {
    fn event(
        state: &mut Self,
        _proxy: &WlOutput,
        event: wl_output::Event,
        id: &OutputId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(output) = state.outputs.get_mut(*id) else {
            return;
        };
        match event {
            wl_output::Event::Geometry { x, y, transform, .. } => {
                output.geometry.set_position(x, y, is_quarter_turn(transform));
            }
            wl_output::Event::Mode {
                flags,
                width,
                height,
                ..
            } => {
                let current = matches!(flags, WEnum::Value(f) if f.contains(wl_output::Mode::Current));
                if current {
                    output.geometry.set_mode_size(width, height);
                }
            }
            wl_output::Event::Scale { factor } => output.geometry.set_scale(factor),
            wl_output::Event::Name { name } => output.name = Some(name),
            wl_output::Event::Description { description } => {
                output.description = Some(description);
            }
            _ => {}
        }
    }
}

impl Dispatch<ZxdgOutputV1, OutputId> for State {
    fn event(
        state: &mut Self,
        _proxy: &ZxdgOutputV1,
        event: zxdg_output_v1::Event,
        id: &OutputId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(output) = state.outputs.get_mut(*id) else {
            return;
        };
        match event {
            zxdg_output_v1::Event::LogicalPosition { x, y } => {
                output.geometry.set_logical_position(x, y);
            }
            zxdg_output_v1::Event::LogicalSize { width, height } => {
                output.geometry.set_logical_size(width, height);
            }
            zxdg_output_v1::Event::Name { name } => {
                if output.name.is_none() {
                    output.name = Some(name);
                }
            }
            zxdg_output_v1::Event::Description { description } => {
                if output.description.is_none() {
                    output.description = Some(description);
                }
            }
            zxdg_output_v1::Event::Done => {
                tracing::debug!(?id, rect = ?output.rect(), name = ?output.name, "output geometry");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_quarter_turn;
    use wayland_client::WEnum;
    use wayland_client::protocol::wl_output::Transform;

    #[test]
    fn quarter_turns_swap_axes() {
        assert!(is_quarter_turn(WEnum::Value(Transform::_90)));
        assert!(is_quarter_turn(WEnum::Value(Transform::Flipped270)));
        assert!(!is_quarter_turn(WEnum::Value(Transform::_180)));
        assert!(!is_quarter_turn(WEnum::Value(Transform::Normal)));
        assert!(!is_quarter_turn(WEnum::Unknown(99)));
    }
}
