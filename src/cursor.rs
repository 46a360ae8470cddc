//! Position tracking over advertising payload buffers.
use crate::codec::{Decode, Encode, Error, FixedSize};

/// Appends AD records into a caller buffer.
pub struct WriteCursor<'d> {
    pos: usize,
    data: &'d mut [u8],
}

impl<'d> WriteCursor<'d> {
    pub fn new(data: &'d mut [u8]) -> Self {
        Self { pos: 0, data }
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8], Error> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(Error::InsufficientSpace);
        }
        let start = core::mem::replace(&mut self.pos, end);
        Ok(&mut self.data[start..end])
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Encode a value little endian at the current position.
    pub fn write<E: Encode>(&mut self, value: E) -> Result<(), Error> {
        let size = value.size();
        value.encode(self.reserve(size)?)
    }

    pub fn available(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }
}

/// Walks a received advertising payload.
pub struct ReadCursor<'d> {
    pos: usize,
    data: &'d [u8],
}

impl<'d> ReadCursor<'d> {
    pub fn new(data: &'d [u8]) -> Self {
        Self { pos: 0, data }
    }

    pub fn read<T: Decode<'d> + FixedSize>(&mut self) -> Result<T, Error> {
        T::decode(self.slice(T::SIZE)?)
    }

    /// Take the next `n` bytes.
    pub fn slice(&mut self, n: usize) -> Result<&'d [u8], Error> {
        let end = self.pos + n;
        let data = self.data.get(self.pos..end).ok_or(Error::InsufficientSpace)?;
        self.pos = end;
        Ok(data)
    }

    /// Skip to the end, returning what was left.
    pub fn remaining(&mut self) -> &'d [u8] {
        let data = &self.data[self.pos..];
        self.pos = self.data.len();
        data
    }

    pub fn available(&self) -> usize {
        self.data.len() - self.pos
    }
}
