//! Errors produced by the fitting math.

/// Grepable code and retry hint for errors surfaced to the host.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Error returned by the functions in [`crate::fit`] and [`crate::markers`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Bounds were requested over zero points.
    #[error("cannot compute bounds of an empty point set")]
    EmptyPointSet,
    /// Every point shares one longitude, so no zoom can fit the span.
    #[error("longitude span is zero; zoom-to-fit is undefined")]
    DegenerateSpan,
    /// The viewport width is not a positive finite pixel count.
    #[error("invalid viewport width: {0}")]
    InvalidViewportWidth(f64),
    /// A coordinate lies outside the valid longitude/latitude ranges.
    #[error("coordinate out of range: longitude {longitude}, latitude {latitude}")]
    OutOfRange { longitude: f64, latitude: f64 },
    /// A color string is not `#RRGGBB`.
    #[error("invalid color string: {0}")]
    InvalidColor(String),
}

impl ErrorCode for FitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPointSet => "E_EMPTY_POINT_SET",
            Self::DegenerateSpan => "E_DEGENERATE_SPAN",
            Self::InvalidViewportWidth(_) => "E_INVALID_VIEWPORT_WIDTH",
            Self::OutOfRange { .. } => "E_OUT_OF_RANGE",
            Self::InvalidColor(_) => "E_INVALID_COLOR",
        }
    }
}
