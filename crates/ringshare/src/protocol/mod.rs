//! Protocol module for RingShare.
//!
//! This module contains the wire message types and the framing used to
//! exchange them: one JSON request and one JSON response per connection.

pub mod codec;
pub mod types;

pub use codec::{max_frame_len, read_frame, write_frame};
pub use types::{Request, Response, SearchOutcome, SearchRequest, SearchStatus};
