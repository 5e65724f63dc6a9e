// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context and surface configuration records.

use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};

/// Which render backend a context drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// No render targets; the application only receives input.
    #[default]
    None,
    /// A shared-memory pixel buffer handed to the application as bytes.
    Raw,
    /// A `tiny-skia` canvas presented through a shared-memory buffer.
    Vector,
    /// A `wgpu` surface per layer surface.
    Gpu,
}

/// Stacking layer of a layer surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Below everything, typically wallpapers.
    Background,
    /// Below windows.
    Bottom,
    /// Above windows, below full-screen clients.
    Top,
    /// Above everything.
    #[default]
    Overlay,
}

impl Layer {
    pub(crate) const fn to_protocol(self) -> zwlr_layer_shell_v1::Layer {
        match self {
            Self::Background => zwlr_layer_shell_v1::Layer::Background,
            Self::Bottom => zwlr_layer_shell_v1::Layer::Bottom,
            Self::Top => zwlr_layer_shell_v1::Layer::Top,
            Self::Overlay => zwlr_layer_shell_v1::Layer::Overlay,
        }
    }
}

bitflags::bitflags! {
    /// Output edges a layer surface is anchored to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Edges: u32 {
        /// Top edge.
        const TOP = 1;
        /// Bottom edge.
        const BOTTOM = 2;
        /// Left edge.
        const LEFT = 4;
        /// Right edge.
        const RIGHT = 8;
    }
}

impl Edges {
    pub(crate) fn to_protocol(self) -> zwlr_layer_surface_v1::Anchor {
        zwlr_layer_surface_v1::Anchor::from_bits_truncate(self.bits())
    }
}

/// How a layer surface is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceOptions {
    /// Stacking layer.
    pub layer: Layer,
    /// Anchored edges. All four edges stretch the surface over the output.
    pub anchor: Edges,
    /// Requested size; zero along an axis anchored on both sides stretches.
    pub width: u32,
    /// Requested size; zero along an axis anchored on both sides stretches.
    pub height: u32,
    /// Exclusive zone; `-1` ignores other surfaces' zones and reserves none.
    pub exclusive_zone: i32,
    /// Receive pointer and touch input instead of passing it through.
    pub pointer_interaction: bool,
    /// Take exclusive keyboard focus.
    pub keyboard_interaction: bool,
    /// Negotiate a fractional scale with the compositor.
    pub fractional_scale: bool,
    /// Scale the buffer into the surface through a viewport.
    pub viewport: bool,
    /// Namespace reported to the compositor.
    pub namespace: String,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            layer: Layer::Overlay,
            anchor: Edges::all(),
            width: 0,
            height: 0,
            exclusive_zone: -1,
            pointer_interaction: false,
            keyboard_interaction: false,
            fractional_scale: false,
            viewport: false,
            namespace: String::from(DEFAULT_NAMESPACE),
        }
    }
}

const DEFAULT_NAMESPACE: &str = "lacquer";

/// Options for [`Context::new`](crate::Context::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Render backend.
    pub backend: BackendKind,
    /// Route pointer input to the overlay instead of the windows beneath.
    pub pointer_interaction: bool,
    /// Take keyboard focus.
    pub keyboard_interaction: bool,
    /// Route touch input to the overlay.
    pub touch_interaction: bool,
    /// Frame rate cap; zero disables limiting.
    pub max_fps: u32,
    /// Create one full-output overlay surface per output.
    pub auto_create_surfaces: bool,
    /// Pace rendering with frame callbacks. Disable for backends whose
    /// present already blocks on the compositor.
    pub request_frame_callbacks: bool,
    /// Negotiate fractional scaling on auto-created surfaces.
    pub fractional_scale: bool,
    /// Use viewports on auto-created surfaces.
    pub viewport: bool,
    /// Namespace of auto-created surfaces.
    pub namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::None,
            pointer_interaction: false,
            keyboard_interaction: false,
            touch_interaction: false,
            max_fps: 60,
            auto_create_surfaces: true,
            request_frame_callbacks: true,
            fractional_scale: false,
            viewport: false,
            namespace: String::from(DEFAULT_NAMESPACE),
        }
    }
}

impl Config {
    /// Options used for auto-created surfaces.
    #[must_use]
    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            pointer_interaction: self.pointer_interaction || self.touch_interaction,
            keyboard_interaction: self.keyboard_interaction,
            fractional_scale: self.fractional_scale,
            viewport: self.viewport,
            namespace: self.namespace.clone(),
            ..SurfaceOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, Config, Edges, Layer};
    use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1::Anchor};

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.backend, BackendKind::None);
        assert_eq!(config.max_fps, 60);
        assert!(config.auto_create_surfaces);
        assert!(config.request_frame_callbacks);
        assert!(!config.pointer_interaction);
    }

    #[test]
    fn auto_surfaces_fill_the_output_on_the_overlay_layer() {
        let options = Config::default().surface_options();
        assert_eq!(options.layer, Layer::Overlay);
        assert_eq!(options.anchor, Edges::all());
        assert_eq!(options.exclusive_zone, -1);
        assert_eq!((options.width, options.height), (0, 0));
    }

    #[test]
    fn touch_interaction_keeps_input_region() {
        let config = Config {
            touch_interaction: true,
            ..Config::default()
        };
        assert!(config.surface_options().pointer_interaction);
    }

    #[test]
    fn edges_map_to_protocol_anchor() {
        assert_eq!(
            Edges::all().to_protocol(),
            Anchor::Top | Anchor::Bottom | Anchor::Left | Anchor::Right
        );
        assert_eq!(Edges::LEFT.to_protocol(), Anchor::Left);
        assert_eq!(Layer::Bottom.to_protocol(), zwlr_layer_shell_v1::Layer::Bottom);
    }
}
