//! Block headers.
//!
//! Every block handed out by the arena or the fallback allocator is prefixed
//! by a [`Header`]. The router carries no metadata alongside the pointer, so
//! the header is the only place the payload size (needed to rebuild a
//! `Layout`), the owning chunk and the origin of a block can live.

use std::ptr::NonNull;

/// Alignment of every payload returned by the router.
pub(crate) const ALIGNMENT: usize = 16;

/// Prefix written in front of each payload.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    /// Requested payload size in bytes
    pub size: usize,

    /// Index of the arena chunk holding the block (unused for fallback blocks)
    pub chunk: u32,

    /// Raw [`Tag`] value
    pub tag: u32,
}

/// Size of a header, which is also the payload offset.
pub(crate) const HEADER_SIZE: usize = std::mem::size_of::<Header>();

const _: () = assert!(HEADER_SIZE == ALIGNMENT);

/// Origin and liveness of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    /// Live block carved from an arena chunk.
    ArenaLive,
    /// Arena block that has been released.
    ArenaFreed,
    /// Live block from the fallback allocator.
    System,
}

impl Tag {
    const ARENA_LIVE: u32 = 0xA7E4_A11C;
    const ARENA_FREED: u32 = 0xA7E4_DEAD;
    const SYSTEM: u32 = 0x5157_E4A1;

    /// Raw value stored in the header.
    pub const fn raw(self) -> u32 {
        match self {
            Tag::ArenaLive => Self::ARENA_LIVE,
            Tag::ArenaFreed => Self::ARENA_FREED,
            Tag::System => Self::SYSTEM,
        }
    }

    /// Decode a raw header value. Garbage decodes to `None`.
    pub const fn from_raw(raw: u32) -> Option<Tag> {
        match raw {
            Self::ARENA_LIVE => Some(Tag::ArenaLive),
            Self::ARENA_FREED => Some(Tag::ArenaFreed),
            Self::SYSTEM => Some(Tag::System),
            _ => None,
        }
    }
}

impl Header {
    /// Decoded tag of this header.
    pub fn tag(&self) -> Option<Tag> {
        Tag::from_raw(self.tag)
    }

    /// Write a header at `at` and return the payload pointer that follows it.
    ///
    /// # Safety
    ///
    /// `at` must be valid for `HEADER_SIZE` bytes of writes and aligned to
    /// `ALIGNMENT`.
    pub unsafe fn write(at: NonNull<u8>, size: usize, chunk: u32, tag: Tag) -> NonNull<u8> {
        at.as_ptr().cast::<Header>().write(Header {
            size,
            chunk,
            tag: tag.raw(),
        });
        NonNull::new_unchecked(at.as_ptr().add(HEADER_SIZE))
    }

    /// Pointer to the header in front of `payload`.
    ///
    /// # Safety
    ///
    /// `payload` must have been produced by [`Header::write`].
    pub unsafe fn locate(payload: NonNull<u8>) -> NonNull<Header> {
        NonNull::new_unchecked(payload.as_ptr().sub(HEADER_SIZE).cast::<Header>())
    }

    /// Read the header in front of `payload`.
    ///
    /// # Safety
    ///
    /// Same as [`Header::locate`]; the block must still be mapped.
    pub unsafe fn read(payload: NonNull<u8>) -> Header {
        Self::locate(payload).as_ptr().read()
    }

    /// Overwrite the tag of the header in front of `payload`.
    ///
    /// # Safety
    ///
    /// Same as [`Header::read`].
    pub unsafe fn retag(payload: NonNull<u8>, tag: Tag) {
        (*Self::locate(payload).as_ptr()).tag = tag.raw();
    }
}
