//! The frame pipeline: request resolution, batched capture, staging and the single encode.

pub mod pipeline;
pub mod request;
