// Small hand-rolled error type; each variant names the failure site so a
// one-line message is enough to locate the problem.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),   // creating the window failed
    WindowUpdate(String), // pushing the frame to the window failed
    ImageLoad(String),    // the source bitmap could not be read or decoded
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::ImageLoad(s) => write!(f, "Image load error: {s}"),
        }
    }
}

impl std::error::Error for Error {}
