//! Containers: the unit of data handed to the writer
//!
//! A container is filled through [`ContainerBuilder`] and sealed into an
//! immutable [`Container`]. Only sealed containers can be pushed onto the
//! transfer queue, so a partially-filled buffer never reaches storage.

use crate::error::ContainerError;
use bytes::{Bytes, BytesMut};
use std::fmt;

/// Opaque container identifier.
///
/// The bytes are used verbatim in the file name and need not be valid text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(Bytes);

impl ContainerId {
    /// Wrap raw ID bytes.
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }

    /// Raw ID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the ID in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ID is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for ContainerId {
    fn from(id: &'static str) -> Self {
        Self(Bytes::from_static(id.as_bytes()))
    }
}

impl From<&'static [u8]> for ContainerId {
    fn from(id: &'static [u8]) -> Self {
        Self(Bytes::from_static(id))
    }
}

impl From<Vec<u8>> for ContainerId {
    fn from(id: Vec<u8>) -> Self {
        Self(Bytes::from(id))
    }
}

impl<const N: usize> From<[u8; N]> for ContainerId {
    fn from(id: [u8; N]) -> Self {
        Self(Bytes::copy_from_slice(&id))
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", hex::encode(&self.0))
    }
}

/// A sealed container ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    id: ContainerId,
    body: Bytes,
    capacity: usize,
}

impl Container {
    /// Create a sealed container from a complete body.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::CapacityExceeded`] if `body` is longer than
    /// `capacity`.
    pub fn new(
        id: impl Into<ContainerId>,
        body: impl Into<Bytes>,
        capacity: usize,
    ) -> Result<Self, ContainerError> {
        let body = body.into();
        if body.len() > capacity {
            return Err(ContainerError::CapacityExceeded {
                capacity,
                requested: body.len(),
            });
        }

        Ok(Self {
            id: id.into(),
            body,
            capacity,
        })
    }

    /// Container identifier.
    pub const fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Valid payload bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of bytes that will be persisted.
    pub fn current_size(&self) -> usize {
        self.body.len()
    }

    /// Fixed capacity the container was assembled with.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Split into ID and payload, releasing the container.
    pub fn into_parts(self) -> (ContainerId, Bytes) {
        (self.id, self.body)
    }
}

/// Fill buffer for a container under assembly.
#[derive(Debug)]
pub struct ContainerBuilder {
    id: ContainerId,
    buf: BytesMut,
    capacity: usize,
}

impl ContainerBuilder {
    /// Start an empty container with a fixed capacity.
    pub fn new(id: impl Into<ContainerId>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a chunk.
    ///
    /// Nothing is appended when the chunk does not fit.
    pub fn append(&mut self, data: &[u8]) -> Result<(), ContainerError> {
        let requested = self.buf.len() + data.len();
        if requested > self.capacity {
            return Err(ContainerError::CapacityExceeded {
                capacity: self.capacity,
                requested,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Bytes still free.
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Bytes filled so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether the container has no room left.
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Freeze the fill buffer into an immutable container.
    pub fn seal(self) -> Container {
        Container {
            id: self.id,
            body: self.buf.freeze(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_container_rejects_oversized_body() {
        let result = Container::new("AAAA", vec![0u8; 9], 8);
        assert_eq!(
            result,
            Err(ContainerError::CapacityExceeded {
                capacity: 8,
                requested: 9
            })
        );
    }

    #[test]
    fn test_container_at_capacity() {
        let container = Container::new("AAAA", vec![7u8; 8], 8).expect("container");
        assert_eq!(container.current_size(), 8);
        assert_eq!(container.capacity(), 8);
    }

    #[test]
    fn test_builder_fill_and_seal() {
        let mut builder = ContainerBuilder::new("BBBB", 10);
        builder.append(b"hello").expect("append");
        assert_eq!(builder.remaining(), 5);
        assert!(!builder.is_full());

        builder.append(b"world").expect("append");
        assert!(builder.is_full());

        let container = builder.seal();
        assert_eq!(container.body(), b"helloworld");
        assert_eq!(container.id().as_bytes(), b"BBBB");
    }

    #[test]
    fn test_builder_overflow_leaves_buffer_untouched() {
        let mut builder = ContainerBuilder::new("CCCC", 4);
        builder.append(b"abc").expect("append");

        let err = builder.append(b"de").expect_err("overflow");
        assert_eq!(
            err,
            ContainerError::CapacityExceeded {
                capacity: 4,
                requested: 5
            }
        );
        assert_eq!(builder.len(), 3);
    }

    #[test]
    fn test_id_formatting() {
        let id = ContainerId::from([0x41u8, 0x00, 0xff]);
        assert_eq!(format!("{id:?}"), "ContainerId(4100ff)");
        assert_eq!(ContainerId::from("AAAA").to_string(), "AAAA");
    }
}
