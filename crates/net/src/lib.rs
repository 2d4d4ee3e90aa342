#![warn(missing_docs)]
//! Message transport and demo file plumbing shared by the client.

mod codec;
mod demo;
mod summary;
mod transport;

pub use codec::{
    read_frame, read_header, write_frame, write_header, DemoFrame, FrameError, HeaderError,
    DEFAULT_MAX_HEADER_LEN, FRAME_HEADER_LEN, NO_FORCED_TRACK,
};
pub use demo::{DemoOpenError, DemoReader, DemoWriter};
pub use summary::DemoSummary;
pub use transport::{Transport, UdpTransport};
