//! Client side of the Flaschen Taschen display protocol.
//!
//! A [`Canvas`] holds one rectangular frame plus its compositing offset,
//! [`wire`] turns it into a datagram and [`Transport`] ships it to the display.

#[macro_use]
extern crate tracing;

mod canvas;
mod color;
mod error;
mod geometry;
pub mod reel;
mod transport;
pub mod wire;

pub use self::{
    canvas::{Canvas, MAX_LAYER, Offset, check_layer},
    color::{Color, Paint},
    error::{Error, Result},
    geometry::Geometry,
    transport::{DEFAULT_HOST, DEFAULT_PORT, DISPLAY_ENV, Transport, resolve, select_target},
};
