// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer cursor appearance.
//!
//! When the compositor offers the cursor-shape protocol the shape is simply
//! named to it. Otherwise the cursor is drawn client-side: images come from
//! the XCursor theme named by `XCURSOR_THEME` at `XCURSOR_SIZE`, and each seat
//! gets its own cursor surface. Compositors reset the cursor whenever the
//! pointer enters a surface, so the current shape is re-applied on every
//! enter. Animated themed cursors are advanced once per loop iteration.

use lacquer_core::cursor::CursorShape;
use lacquer_core::error::{Error, ErrorKind};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_pointer::WlPointer;
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, QueueHandle};
use wayland_cursor::CursorTheme;
use wayland_protocols::wp::cursor_shape::v1::client::wp_cursor_shape_device_v1::Shape;
use wayland_protocols::wp::cursor_shape::v1::client::wp_cursor_shape_manager_v1::WpCursorShapeManagerV1;

use crate::context::State;
use crate::timer::{Instant, now};

/// Cursor size used when `XCURSOR_SIZE` is absent, unparsable, or zero.
pub const DEFAULT_CURSOR_SIZE: u32 = 24;

/// Resolves the cursor theme name and size from environment values.
fn theme_settings(
    xcursor_theme: Option<String>,
    gtk_theme: Option<String>,
    xcursor_size: Option<String>,
) -> (Option<String>, u32) {
    let theme = xcursor_theme
        .filter(|t| !t.is_empty())
        .or_else(|| gtk_theme.filter(|t| !t.is_empty()));
    let size = xcursor_size
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&s| s > 0)
        .unwrap_or(DEFAULT_CURSOR_SIZE);
    (theme, size)
}

/// Per-seat cursor state.
#[derive(Debug)]
pub(crate) struct SeatCursor {
    shape: CursorShape,
    surface: Option<WlSurface>,
    serial: Option<u32>,
    started: Instant,
    frame: usize,
}

impl Default for SeatCursor {
    fn default() -> Self {
        Self {
            shape: CursorShape::Default,
            surface: None,
            serial: None,
            started: now(),
            frame: 0,
        }
    }
}

impl Drop for SeatCursor {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
    }
}

/// How cursor shapes are applied.
pub(crate) enum CursorEngine {
    /// The compositor draws named shapes.
    Shape(WpCursorShapeManagerV1),
    /// Shapes are drawn from a client-side theme.
    Themed(CursorTheme),
    /// No theme could be loaded.
    Disabled,
}

impl std::fmt::Debug for CursorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Shape(_) => "CursorEngine::Shape",
            Self::Themed(_) => "CursorEngine::Themed",
            Self::Disabled => "CursorEngine::Disabled",
        })
    }
}

impl CursorEngine {
    /// Picks the shape protocol if bound, else loads the environment theme.
    pub(crate) fn new(
        conn: &Connection,
        shm: &WlShm,
        shape_manager: Option<&WpCursorShapeManagerV1>,
    ) -> Self {
        if let Some(manager) = shape_manager {
            return Self::Shape(manager.clone());
        }
        let (theme, size) = theme_settings(
            std::env::var("XCURSOR_THEME").ok(),
            std::env::var("GTK_THEME").ok(),
            std::env::var("XCURSOR_SIZE").ok(),
        );
        let loaded = match theme.as_deref() {
            Some(name) => CursorTheme::load_from_name(conn, shm.clone(), name, size),
            None => CursorTheme::load(conn, shm.clone(), size),
        };
        match loaded {
            Ok(theme) => Self::Themed(theme),
            Err(err) => {
                tracing::warn!(%err, ?theme, size, "cursor theme unavailable");
                Self::Disabled
            }
        }
    }

    /// Changes the seat's shape and applies it if the pointer is over one of
    /// our surfaces.
    pub(crate) fn set_shape(
        &mut self,
        cursor: &mut SeatCursor,
        pointer: &WlPointer,
        shape: CursorShape,
        compositor: &WlCompositor,
        qh: &QueueHandle<State>,
    ) -> Result<(), Error> {
        if matches!(self, Self::Disabled) {
            return Err(ErrorKind::CURSOR_THEME.into());
        }
        if cursor.shape != shape {
            cursor.started = now();
            cursor.frame = 0;
        }
        cursor.shape = shape;
        match cursor.serial {
            Some(serial) => self.apply(cursor, pointer, serial, compositor, qh),
            None => Ok(()),
        }
    }

    /// Re-applies the seat's shape after a pointer enter.
    pub(crate) fn on_enter(
        &mut self,
        cursor: &mut SeatCursor,
        pointer: &WlPointer,
        serial: u32,
        compositor: &WlCompositor,
        qh: &QueueHandle<State>,
    ) {
        cursor.serial = Some(serial);
        if let Err(err) = self.apply(cursor, pointer, serial, compositor, qh) {
            tracing::debug!(%err, "cursor not applied");
        }
    }

    /// Forgets the enter serial once the pointer leaves our surfaces.
    pub(crate) fn on_leave(cursor: &mut SeatCursor) {
        cursor.serial = None;
    }

    fn apply(
        &mut self,
        cursor: &mut SeatCursor,
        pointer: &WlPointer,
        serial: u32,
        compositor: &WlCompositor,
        qh: &QueueHandle<State>,
    ) -> Result<(), Error> {
        match self {
            Self::Shape(manager) => {
                let device = manager.get_pointer(pointer, qh, ());
                match Shape::try_from(cursor.shape.protocol_index()) {
                    Ok(shape) => device.set_shape(serial, shape),
                    Err(()) => tracing::warn!(shape = ?cursor.shape, "shape unknown to compositor"),
                }
                device.destroy();
                Ok(())
            }
            Self::Themed(theme) => {
                let surface = cursor
                    .surface
                    .get_or_insert_with(|| compositor.create_surface(qh, ()))
                    .clone();
                let elapsed = now().seconds_since(cursor.started);
                let frame = attach_theme_frame(theme, cursor.shape, &surface, elapsed)?;
                cursor.frame = frame.index;
                pointer.set_cursor(serial, Some(&surface), frame.hotspot.0, frame.hotspot.1);
                Ok(())
            }
            Self::Disabled => Err(ErrorKind::CURSOR_THEME.into()),
        }
    }

    /// Advances animated themed cursors.
    pub(crate) fn animate(&mut self, cursor: &mut SeatCursor) {
        let Self::Themed(theme) = self else {
            return;
        };
        let (Some(surface), Some(_)) = (cursor.surface.as_ref(), cursor.serial) else {
            return;
        };
        let elapsed = now().seconds_since(cursor.started);
        let Some(index) = theme_frame_index(theme, cursor.shape, elapsed) else {
            return;
        };
        if index == cursor.frame {
            return;
        }
        if let Ok(frame) = attach_theme_frame(theme, cursor.shape, surface, elapsed) {
            cursor.frame = frame.index;
        }
    }
}

struct ThemeFrame {
    index: usize,
    hotspot: (i32, i32),
}

fn lookup<'a>(theme: &'a mut CursorTheme, shape: CursorShape) -> Option<&'a wayland_cursor::Cursor> {
    // Older themes only ship the underscore spelling.
    let legacy = shape.name().replace('-', "_");
    for name in [shape.name(), legacy.as_str(), CursorShape::Default.name(), "left_ptr"] {
        if theme.get_cursor(name).is_some() {
            return theme.get_cursor(name);
        }
    }
    None
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "animation clocks wrap after 49 days"
)]
fn theme_frame_index(theme: &mut CursorTheme, shape: CursorShape, elapsed: f64) -> Option<usize> {
    let cursor = lookup(theme, shape)?;
    Some(cursor.frame_and_duration((elapsed * 1000.0) as u32).frame_index)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "animation clocks wrap after 49 days"
)]
fn attach_theme_frame(
    theme: &mut CursorTheme,
    shape: CursorShape,
    surface: &WlSurface,
    elapsed: f64,
) -> Result<ThemeFrame, Error> {
    let cursor = lookup(theme, shape).ok_or(ErrorKind::CURSOR_THEME)?;
    let index = cursor.frame_and_duration((elapsed * 1000.0) as u32).frame_index;
    let image = &cursor[index];
    let (width, height) = image.dimensions();
    let (hx, hy) = image.hotspot();
    surface.attach(Some(&**image), 0, 0);
    surface.damage(
        0,
        0,
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    );
    surface.commit();
    Ok(ThemeFrame {
        index,
        hotspot: (
            i32::try_from(hx).unwrap_or(0),
            i32::try_from(hy).unwrap_or(0),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_CURSOR_SIZE, theme_settings};

    fn s(v: &str) -> Option<String> {
        Some(v.to_owned())
    }

    #[test]
    fn size_defaults_when_absent_zero_or_garbage() {
        assert_eq!(theme_settings(None, None, None).1, DEFAULT_CURSOR_SIZE);
        assert_eq!(theme_settings(None, None, s("0")).1, DEFAULT_CURSOR_SIZE);
        assert_eq!(theme_settings(None, None, s("big")).1, DEFAULT_CURSOR_SIZE);
        assert_eq!(theme_settings(None, None, s(" 48 ")).1, 48);
    }

    #[test]
    fn xcursor_theme_wins_over_gtk_theme() {
        assert_eq!(
            theme_settings(s("Adwaita"), s("Breeze"), None).0.as_deref(),
            Some("Adwaita")
        );
        assert_eq!(
            theme_settings(s(""), s("Breeze"), None).0.as_deref(),
            Some("Breeze")
        );
        assert_eq!(theme_settings(None, None, None).0, None);
    }
}
