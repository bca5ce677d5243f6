use thiserror::Error;

/// Errors reported by the codec.
///
/// Running out of bit budget is *not* an error: the stream is designed to be
/// truncated at any byte boundary past the header, so both the encoder and
/// the decoder treat buffer exhaustion mid-stream as normal termination.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("not enough memory")]
    OutOfMemory,
    #[error("an invalid parameter was supplied")]
    InvalidParameter,
    #[error("destination buffer too small ({0} bytes required)")]
    BufferTooSmall(usize),
    #[error("the compressed image data is corrupted")]
    DataCorrupted,
}
