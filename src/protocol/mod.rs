//! Protocol module - inbound framing and reply classification.
//!
//! This module implements the decode-side building blocks:
//! - Frame kinds delivered by the transport (header, content, last content)
//! - HTTP/1.1 frame buffer for accumulating partial reads
//! - Four-newline record splitting for streaming config replies
//! - Status code to domain status mapping

mod delimiter;
mod frame;
mod frame_buffer;
mod status;

pub use delimiter::{split_record, split_records, CONFIG_DELIMITER};
pub use frame::{HttpFrame, ReplyHeader};
pub use frame_buffer::ResponseFrameBuffer;
pub use status::ResponseStatus;
