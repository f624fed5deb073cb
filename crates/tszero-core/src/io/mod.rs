//! I/O utilities shared by the transcoders.

pub mod counting;

pub use counting::CountingWriter;
