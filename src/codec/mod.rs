//! Geometry codec: shape records to model geometries and back.

mod decode;
mod encode;
pub mod rings;

use crate::multipatch::MultiPatchAdapter;

/// M value written for unmeasured geometries: the format's "no data" marker
/// rather than a measured zero.
pub const NO_DATA_M: f64 = -f64::MAX;

/// How ring winding is handled during polygon emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindingMode {
    /// Reverse mis-wound rings while the buffers are populated: exterior
    /// rings clockwise, holes counter-clockwise.
    #[default]
    Enforce,
    /// The caller guarantees correct order (or runs a separate rewind
    /// utility); rings are emitted as given.
    AssumeCorrect,
}

/// Codec configuration, threaded in at construction instead of read from
/// process-wide state.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecOptions {
    /// Disables non-finite-coordinate rejection. Unsupported; testing only.
    pub allow_non_finite: bool,
    /// Ring winding handling on encode.
    pub winding: WindingMode,
}

/// Translates between raw shape records and model geometries.
///
/// One codec instance corresponds to one decode/encode session over a layer;
/// it owns the session-scoped warning state.
pub struct GeometryCodec {
    options: CodecOptions,
    adapter: Option<Box<dyn MultiPatchAdapter>>,
    warned_bad_winding: bool,
}

impl GeometryCodec {
    /// Creates a codec with the given options and no multipatch support.
    pub fn new(options: CodecOptions) -> Self {
        Self {
            options,
            adapter: None,
            warned_bad_winding: false,
        }
    }

    /// Creates a codec that delegates multipatch records to `adapter`.
    pub fn with_adapter(options: CodecOptions, adapter: Box<dyn MultiPatchAdapter>) -> Self {
        Self {
            options,
            adapter: Some(adapter),
            warned_bad_winding: false,
        }
    }

    /// The configuration this codec was built with.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}

impl std::fmt::Debug for GeometryCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryCodec")
            .field("options", &self.options)
            .field("has_adapter", &self.adapter.is_some())
            .field("warned_bad_winding", &self.warned_bad_winding)
            .finish()
    }
}
