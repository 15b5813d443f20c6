use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid canvas dimension {width}x{height}")]
    InvalidDimension { width: i32, height: i32 },

    #[error("invalid layer {0}, expected 0..=15")]
    InvalidLayer(i32),

    #[error("failed to open display `{target}`")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid geometry `{0}`, expected <W>x<H>[+<X>+<Y>[+<layer>]]")]
    InvalidGeometry(String),

    #[error("invalid color `{0}`, expected RRGGBB")]
    InvalidColor(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn connection(target: impl Into<String>, source: io::Error) -> Self {
        Self::Connection {
            target: target.into(),
            source,
        }
    }
}
