// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot output capture via wlr-screencopy.
//!
//! The calling thread blocks, servicing the connection, first until the
//! compositor advertises the buffer it wants and again until the copy into
//! that buffer completes or fails.

use lacquer_core::buffer::{BufferLayout, PixelFormat};
use lacquer_core::capture::{CaptureMachine, CaptureState};
use lacquer_core::error::{Error, ErrorKind};
use lacquer_core::id::OutputId;
use wayland_client::{Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum};
use wayland_protocols_wlr::screencopy::v1::client::zwlr_screencopy_frame_v1::{
    self, ZwlrScreencopyFrameV1,
};

use crate::context::State;
use crate::shm::SharedBuffer;

/// Progress of the capture in flight.
#[derive(Debug, Default)]
pub(crate) struct CaptureSession {
    machine: CaptureMachine,
    layout: Option<BufferLayout>,
    y_invert: bool,
}

/// Captures `output` into a freshly allocated shared buffer.
pub(crate) fn capture_output(
    queue: &mut EventQueue<State>,
    state: &mut State,
    output: OutputId,
) -> Result<SharedBuffer, Error> {
    let manager = state
        .globals
        .screencopy
        .clone()
        .ok_or(ErrorKind::NO_SCREENCOPY)?;
    let wl_output = state
        .outputs
        .get(output)
        .ok_or(ErrorKind::INVALID_HANDLE)?
        .wl
        .clone();

    let qh = queue.handle();
    state.capture = Some(CaptureSession::default());
    let frame = manager.capture_output(0, &wl_output, &qh, ());
    let result = run(queue, state, &frame);
    frame.destroy();
    state.capture = None;

    match &result {
        Ok(buffer) => tracing::debug!(?output, layout = ?buffer.layout(), "output captured"),
        Err(err) => tracing::warn!(?output, %err, "output capture failed"),
    }
    result
}

fn run(
    queue: &mut EventQueue<State>,
    state: &mut State,
    frame: &ZwlrScreencopyFrameV1,
) -> Result<SharedBuffer, Error> {
    if wait(queue, state)? != CaptureState::Ready {
        return Err(ErrorKind::CAPTURE_FAILED.into());
    }
    let layout = state
        .capture
        .as_ref()
        .and_then(|session| session.layout)
        .ok_or(ErrorKind::CAPTURE_INIT)?;
    let mut buffer = SharedBuffer::new(&state.globals.shm, &queue.handle(), layout)
        .map_err(|err| err.with(ErrorKind::CAPTURE_INIT))?;

    let requested = state
        .capture
        .as_mut()
        .is_some_and(|session| session.machine.copy_requested());
    if !requested {
        return Err(ErrorKind::CAPTURE_INIT.into());
    }
    frame.copy(buffer.wl_buffer());

    // A failed copy drops the buffer on return.
    if wait(queue, state)? != CaptureState::Done {
        return Err(ErrorKind::CAPTURE_FAILED.into());
    }
    if state.capture.as_ref().is_some_and(|session| session.y_invert) {
        flip_rows(buffer.data_mut(), layout.stride() as usize);
    }
    Ok(buffer)
}

/// Blocks until the machine leaves `Pending`.
fn wait(queue: &mut EventQueue<State>, state: &mut State) -> Result<CaptureState, Error> {
    loop {
        let Some(session) = &state.capture else {
            return Err(ErrorKind::CAPTURE_FAILED.into());
        };
        if !session.machine.is_pending() {
            return Ok(session.machine.state());
        }
        queue.blocking_dispatch(state).map_err(|err| {
            tracing::error!(%err, "dispatch failed during capture");
            Error::from(ErrorKind::CONNECTION)
        })?;
    }
}

/// Reverses the row order of a bottom-up image.
fn flip_rows(data: &mut [u8], stride: usize) {
    if stride == 0 {
        return;
    }
    let rows = data.len() / stride;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = data.split_at_mut(bottom * stride);
        head[top * stride..(top + 1) * stride].swap_with_slice(&mut tail[..stride]);
    }
}

impl Dispatch<ZwlrScreencopyFrameV1, ()> for State {
    fn event(
        state: &mut Self,
        proxy: &ZwlrScreencopyFrameV1,
        event: zwlr_screencopy_frame_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(session) = state.capture.as_mut() else {
            return;
        };
        match event {
            zwlr_screencopy_frame_v1::Event::Buffer {
                format,
                width,
                height,
                ..
            } => {
                let code = match format {
                    WEnum::Value(format) => u32::from(format),
                    WEnum::Unknown(code) => code,
                };
                session.layout = Some(BufferLayout::new(width, height, PixelFormat::from_code(code)));
                // Version 3 announces the end of the list with buffer_done.
                if proxy.version() < 3 {
                    session.machine.buffer_advertised();
                }
            }
            zwlr_screencopy_frame_v1::Event::BufferDone => session.machine.buffer_advertised(),
            zwlr_screencopy_frame_v1::Event::Flags { flags } => {
                session.y_invert = matches!(
                    flags,
                    WEnum::Value(f) if f.contains(zwlr_screencopy_frame_v1::Flags::YInvert)
                );
            }
            zwlr_screencopy_frame_v1::Event::Ready { .. } => session.machine.copied(),
            zwlr_screencopy_frame_v1::Event::Failed => session.machine.failed(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::flip_rows;

    #[test]
    fn flipping_reverses_rows_and_keeps_them_intact() {
        let mut data = [1, 1, 2, 2, 3, 3];
        flip_rows(&mut data, 2);
        assert_eq!(data, [3, 3, 2, 2, 1, 1]);

        let mut even = [1, 2, 3, 4];
        flip_rows(&mut even, 2);
        assert_eq!(even, [3, 4, 1, 2]);
    }

    #[test]
    fn single_row_is_unchanged() {
        let mut data = [9, 8, 7, 6];
        flip_rows(&mut data, 4);
        assert_eq!(data, [9, 8, 7, 6]);
    }
}
