//! Access to the streams of a PDB container.

use crate::raw::TPI_STREAM_INDEX;

/// A container of numbered byte streams, such as a PDB file.
pub trait StreamSource {
    /// The error returned when a stream cannot be read.
    type Error;

    /// Returns the complete contents of the stream at `index`.
    fn read_stream(&mut self, index: u16) -> Result<Vec<u8>, Self::Error>;
}

impl<S: StreamSource + ?Sized> StreamSource for &mut S {
    type Error = S::Error;

    fn read_stream(&mut self, index: u16) -> Result<Vec<u8>, Self::Error> {
        (**self).read_stream(index)
    }
}

/// Reads the type information stream from a container.
pub fn read_type_stream<S: StreamSource>(source: &mut S) -> Result<Vec<u8>, S::Error> {
    source.read_stream(TPI_STREAM_INDEX)
}
