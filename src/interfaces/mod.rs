//! Outer surface: request/response shapes, the batch reader, runner and
//! writer, seed loading, and the handler that maps requests onto the workflows.

pub mod batch;
pub mod csv;
pub mod dto;
pub mod handler;
pub mod response_writer;
pub mod seed;
