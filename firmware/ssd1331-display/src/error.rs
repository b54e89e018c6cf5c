//! Error types for the display pipeline

use thiserror::Error;

/// Status condition the SPI master was polling for when it gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// STATUS.READY: controller can accept the next TX byte
    TxReady,
    /// STATUS.BUSY cleared: the byte in flight has completed
    Idle,
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// A flush or panel command was issued before bring-up
    #[error("display not initialized")]
    NotInitialized,
    /// Bring-up was requested a second time
    #[error("display already initialized")]
    AlreadyInitialized,
    /// A bounded status poll ran out of budget
    #[error("timed out waiting for SPI {0:?}")]
    Timeout(WaitCondition),
    /// Panel-side copy destination leaves the panel
    #[error("panel window out of bounds")]
    OutOfBounds,
    /// A blit expected to be visible drew no pixels
    #[error("sprite drew no pixels")]
    NothingDrawn,
    /// Transport used outside its begin/send/end framing
    #[error("transport protocol violation: {0}")]
    Protocol(&'static str),
}

/// Sprite asset errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpriteError {
    /// Data length does not match `width * ceil(height / 8)`
    #[error("sprite data is {actual} bytes, geometry needs {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Result type for display operations
pub type DisplayResult<T> = Result<T, DisplayError>;
