/// Errors produced while turning session or flash state into cookie text and back.
///
/// Decoding failures never reach callers of the codec: they degrade to a fresh state. The
/// variants exist so the crypto seam and the layer can report what went wrong in logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cookie encode failed: {0}")]
    Encode(String),

    #[error("cookie decode failed: {0}")]
    Decode(String),

    #[error("session encryption failed")]
    Encrypt,

    #[error("session decryption failed: {0}")]
    Decrypt(String),
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
