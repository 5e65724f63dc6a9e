// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error kinds and the service availability check.
//!
//! Errors are a flat set of named kinds so that one failed construction can
//! report every missing prerequisite at once. [`Error`] formats the set for
//! humans; callers that need to branch test individual kinds with
//! [`Error::contains`].

use core::fmt;

bitflags::bitflags! {
    /// Named failure kinds. Several may be set at once.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ErrorKind: u32 {
        /// The display server connection could not be opened.
        const CONNECTION = 1 << 0;
        /// A blocking round-trip or dispatch failed.
        const ROUNDTRIP = 1 << 1;
        /// No shared-memory allocator was advertised.
        const NO_SHM = 1 << 2;
        /// No surface compositor was advertised.
        const NO_COMPOSITOR = 1 << 3;
        /// No layer-shell service was advertised.
        const NO_LAYER_SHELL = 1 << 4;
        /// No output-geometry service was advertised.
        const NO_OUTPUT_MANAGER = 1 << 5;
        /// A capture was requested but no screencopy service exists.
        const NO_SCREENCOPY = 1 << 6;
        /// Fractional scaling was requested but is not supported.
        const NO_FRACTIONAL_SCALE = 1 << 7;
        /// A viewport was requested but is not supported.
        const NO_VIEWPORTER = 1 << 8;
        /// A service was advertised below the minimum usable version.
        const PROTOCOL_VERSION = 1 << 9;
        /// Shared memory could not be created, sized, or mapped.
        const BUFFER_ALLOCATION = 1 << 10;
        /// A surface could not be created.
        const SURFACE_INIT = 1 << 11;
        /// A layer-shell role could not be assigned.
        const LAYER_SURFACE_INIT = 1 << 12;
        /// Fractional-scale negotiation could not be started.
        const FRACTIONAL_SCALE_INIT = 1 << 13;
        /// A viewport could not be created.
        const VIEWPORT_INIT = 1 << 14;
        /// The backend could not attach a render target to a surface.
        const BACKEND_ASSOCIATION = 1 << 15;
        /// The backend failed to initialize.
        const BACKEND_INIT = 1 << 16;
        /// The selected backend was not compiled in.
        const BACKEND_UNAVAILABLE = 1 << 17;
        /// A capture frame could not be requested.
        const CAPTURE_INIT = 1 << 18;
        /// The compositor reported a failed capture.
        const CAPTURE_FAILED = 1 << 19;
        /// No usable cursor theme could be loaded.
        const CURSOR_THEME = 1 << 20;
        /// A handle referred to an object that no longer exists.
        const INVALID_HANDLE = 1 << 21;
    }
}

const DESCRIPTIONS: [(ErrorKind, &str); 22] = [
    (ErrorKind::CONNECTION, "failed to connect to the display server"),
    (ErrorKind::ROUNDTRIP, "protocol round-trip failed"),
    (ErrorKind::NO_SHM, "shared memory is not supported"),
    (ErrorKind::NO_COMPOSITOR, "compositor is not supported"),
    (ErrorKind::NO_LAYER_SHELL, "layer shell is not supported"),
    (ErrorKind::NO_OUTPUT_MANAGER, "output manager is not supported"),
    (ErrorKind::NO_SCREENCOPY, "screencopy is not supported"),
    (ErrorKind::NO_FRACTIONAL_SCALE, "fractional scaling is not supported"),
    (ErrorKind::NO_VIEWPORTER, "viewporter is not supported"),
    (ErrorKind::PROTOCOL_VERSION, "protocol version is too low"),
    (ErrorKind::BUFFER_ALLOCATION, "failed to allocate shared buffer"),
    (ErrorKind::SURFACE_INIT, "failed to create surface"),
    (ErrorKind::LAYER_SURFACE_INIT, "failed to create layer surface"),
    (ErrorKind::FRACTIONAL_SCALE_INIT, "failed to set up fractional scale"),
    (ErrorKind::VIEWPORT_INIT, "failed to create viewport"),
    (ErrorKind::BACKEND_ASSOCIATION, "failed to associate surface with backend"),
    (ErrorKind::BACKEND_INIT, "failed to initialize backend"),
    (ErrorKind::BACKEND_UNAVAILABLE, "backend is not compiled in"),
    (ErrorKind::CAPTURE_INIT, "failed to request capture frame"),
    (ErrorKind::CAPTURE_FAILED, "capture failed"),
    (ErrorKind::CURSOR_THEME, "failed to load cursor theme"),
    (ErrorKind::INVALID_HANDLE, "handle is no longer valid"),
];

impl ErrorKind {
    /// Human description of a single kind.
    ///
    /// Returns `None` for empty or multi-kind values.
    #[must_use]
    pub fn describe(self) -> Option<&'static str> {
        DESCRIPTIONS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, text)| *text)
    }
}

/// A non-empty set of [`ErrorKind`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Error {
    kinds: ErrorKind,
}

impl Error {
    /// Creates an error from a set of kinds.
    #[inline]
    #[must_use]
    pub const fn new(kinds: ErrorKind) -> Self {
        Self { kinds }
    }

    /// All kinds carried by this error.
    #[inline]
    #[must_use]
    pub const fn kinds(self) -> ErrorKind {
        self.kinds
    }

    /// Whether `kind` is part of this error.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ErrorKind) -> bool {
        self.kinds.contains(kind)
    }

    /// Adds further kinds.
    #[inline]
    #[must_use]
    pub const fn with(self, kinds: ErrorKind) -> Self {
        Self::new(self.kinds.union(kinds))
    }
}

impl From<ErrorKind> for Error {
    fn from(kinds: ErrorKind) -> Self {
        Self::new(kinds)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error({:#x}: {self})", self.kinds.bits())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kinds.is_empty() {
            return f.write_str("unknown error");
        }
        for (i, kind) in self.kinds.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(kind.describe().unwrap_or("unnamed error"))?;
        }
        Ok(())
    }
}

impl core::error::Error for Error {}

bitflags::bitflags! {
    /// Compositor services discovered through the registry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Services: u32 {
        /// Shared-memory allocator.
        const SHM = 1 << 0;
        /// Surface compositor.
        const COMPOSITOR = 1 << 1;
        /// Layer-shell surfaces.
        const LAYER_SHELL = 1 << 2;
        /// DPI-adjusted output geometry.
        const OUTPUT_MANAGER = 1 << 3;
        /// Compositor-side cursor shapes.
        const CURSOR_SHAPE = 1 << 4;
        /// Output pixel capture.
        const SCREENCOPY = 1 << 5;
        /// Fractional scale negotiation.
        const FRACTIONAL_SCALE = 1 << 6;
        /// Surface viewport scaling.
        const VIEWPORTER = 1 << 7;
    }
}

const MISSING_KIND: [(Services, ErrorKind); 4] = [
    (Services::SHM, ErrorKind::NO_SHM),
    (Services::COMPOSITOR, ErrorKind::NO_COMPOSITOR),
    (Services::LAYER_SHELL, ErrorKind::NO_LAYER_SHELL),
    (Services::OUTPUT_MANAGER, ErrorKind::NO_OUTPUT_MANAGER),
];

impl Services {
    /// Services without which no overlay can be created.
    pub const MANDATORY: Self = Self::SHM
        .union(Self::COMPOSITOR)
        .union(Self::LAYER_SHELL)
        .union(Self::OUTPUT_MANAGER);

    /// Fails with one kind per absent mandatory service.
    pub fn check_mandatory(self) -> Result<(), Error> {
        let mut missing = ErrorKind::empty();
        for (service, kind) in MISSING_KIND {
            if !self.contains(service) {
                missing |= kind;
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::new(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, Services};
    use alloc::string::ToString;

    #[test]
    fn check_fails_iff_a_mandatory_service_is_missing() {
        for bits in 0..=Services::all().bits() {
            let available = Services::from_bits_truncate(bits);
            let result = available.check_mandatory();
            assert_eq!(
                result.is_err(),
                !available.contains(Services::MANDATORY),
                "availability {available:?}"
            );
            if let Err(err) = result {
                let mut expected = ErrorKind::empty();
                expected.set(ErrorKind::NO_SHM, !available.contains(Services::SHM));
                expected.set(
                    ErrorKind::NO_COMPOSITOR,
                    !available.contains(Services::COMPOSITOR),
                );
                expected.set(
                    ErrorKind::NO_LAYER_SHELL,
                    !available.contains(Services::LAYER_SHELL),
                );
                expected.set(
                    ErrorKind::NO_OUTPUT_MANAGER,
                    !available.contains(Services::OUTPUT_MANAGER),
                );
                assert_eq!(err.kinds(), expected, "availability {available:?}");
            }
        }
    }

    #[test]
    fn optional_services_never_fail_the_check() {
        let available = Services::MANDATORY | Services::CURSOR_SHAPE;
        assert_eq!(available.check_mandatory(), Ok(()));
    }

    #[test]
    fn display_lists_every_kind() {
        let err = Error::new(ErrorKind::NO_SHM | ErrorKind::NO_LAYER_SHELL);
        assert_eq!(
            err.to_string(),
            "shared memory is not supported, layer shell is not supported"
        );
    }

    #[test]
    fn every_kind_has_a_description() {
        for kind in ErrorKind::all().iter() {
            assert!(kind.describe().is_some(), "{kind:?} lacks a description");
        }
        assert_eq!((ErrorKind::NO_SHM | ErrorKind::NO_COMPOSITOR).describe(), None);
    }

    #[test]
    fn with_accumulates_kinds() {
        let err = Error::from(ErrorKind::SURFACE_INIT).with(ErrorKind::BACKEND_ASSOCIATION);
        assert!(err.contains(ErrorKind::SURFACE_INIT));
        assert!(err.contains(ErrorKind::BACKEND_ASSOCIATION));
        assert!(!err.contains(ErrorKind::NO_SHM));
    }
}
