// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A NUL-terminated dynamic byte string built on [`Vector<u8>`].
//!
//! The buffer always ends with exactly one terminating `\0` that is not part
//! of the text. [`DString::size`] counts it, [`DString::len`] does not. Every
//! mutation keeps the terminator in place, including on allocation failure.

use crate::allocators::SystemAllocator;
use crate::hash::fnv1a_32;
use crate::vector::Vector;
use cengine_core::{AllocError, CollectionError, RawAllocator};
use std::cmp::Ordering;
use std::ffi::CStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::Utf8Error;

/// A growable, NUL-terminated byte string.
#[derive(Clone)]
pub struct DString<A: RawAllocator = SystemAllocator> {
    bytes: Vector<u8, A>,
}

impl DString {
    /// Creates an empty string on the process heap.
    pub fn new() -> Result<Self, AllocError> {
        Self::new_in(SystemAllocator)
    }

    /// Creates a string holding a copy of `text`, with a buffer of exactly
    /// `text.len() + 1` bytes.
    pub fn create(text: &str) -> Result<Self, AllocError> {
        Self::create_in(text, SystemAllocator)
    }
}

impl<A: RawAllocator> DString<A> {
    /// Creates an empty string allocating through `alloc`.
    pub fn new_in(alloc: A) -> Result<Self, AllocError> {
        let mut bytes = Vector::try_new_in(alloc)?;
        bytes.push(0)?;
        Ok(Self { bytes })
    }

    /// Creates a string holding a copy of `text`, allocating through `alloc`.
    pub fn create_in(text: &str, alloc: A) -> Result<Self, AllocError> {
        Self::from_bytes_in(text.as_bytes(), alloc)
    }

    /// Creates a string holding a copy of `text`, allocating through `alloc`.
    pub fn from_bytes_in(text: &[u8], alloc: A) -> Result<Self, AllocError> {
        let capacity = text.len().checked_add(1).ok_or(AllocError::CapacityOverflow)?;
        let mut bytes = Vector::with_capacity_in(capacity, alloc)?;
        bytes.append_slice(text)?;
        bytes.push(0)?;
        Ok(Self { bytes })
    }

    /// Returns the buffer size, terminator included.
    pub fn size(&self) -> usize {
        self.bytes.size()
    }

    /// Returns the text length, terminator excluded.
    pub fn len(&self) -> usize {
        self.bytes.size() - 1
    }

    /// Returns `true` if the text is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Appends a single byte.
    pub fn push(&mut self, byte: u8) -> Result<(), AllocError> {
        // Push the new terminator first so a failed grow changes nothing,
        // then overwrite the old one.
        self.bytes.push(0)?;
        let old_terminator = self.bytes.size() - 2;
        self.bytes[old_terminator] = byte;
        Ok(())
    }

    /// Appends `text`, growing at most once.
    pub fn push_str(&mut self, text: &str) -> Result<(), AllocError> {
        self.push_bytes(text.as_bytes())
    }

    /// Appends raw bytes, growing at most once.
    pub fn push_bytes(&mut self, text: &[u8]) -> Result<(), AllocError> {
        let start = self.len();
        self.bytes.push_n_with(text.len(), |_| 0)?;
        self.bytes[start..start + text.len()].copy_from_slice(text);
        Ok(())
    }

    /// Appends the text of `other`.
    pub fn cat<B: RawAllocator>(&mut self, other: &DString<B>) -> Result<(), AllocError> {
        self.push_bytes(other.as_bytes())
    }

    /// Replaces the contents with a copy of `other`.
    pub fn copy_from<B: RawAllocator>(&mut self, other: &DString<B>) -> Result<(), AllocError> {
        self.bytes.copy_from(other.as_bytes_with_nul())
    }

    /// Empties the text, keeping the terminator.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Returns the byte offset of the first occurrence of `needle`. An empty
    /// needle matches at offset 0.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        find_bytes(self.as_bytes(), needle)
    }

    /// Appends formatted text.
    ///
    /// On failure the text written so far by this call is removed again.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), CollectionError> {
        struct Sink<'a, A: RawAllocator> {
            target: &'a mut DString<A>,
            error: Option<AllocError>,
        }

        impl<A: RawAllocator> fmt::Write for Sink<'_, A> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.target.push_str(s).map_err(|err| {
                    self.error = Some(err);
                    fmt::Error
                })
            }
        }

        let start = self.len();
        let mut sink = Sink {
            target: self,
            error: None,
        };
        let result = fmt::write(&mut sink, args);
        let error = sink.error;
        if result.is_err() {
            self.truncate(start);
            return Err(error.map_or(CollectionError::Format, CollectionError::Alloc));
        }
        Ok(())
    }

    /// Maps ASCII lowercase letters to uppercase in place.
    pub fn make_ascii_uppercase(&mut self) {
        self.text_mut().make_ascii_uppercase();
    }

    /// Maps ASCII uppercase letters to lowercase in place.
    pub fn make_ascii_lowercase(&mut self) {
        self.text_mut().make_ascii_lowercase();
    }

    /// 32-bit FNV-1a over the text bytes.
    pub fn fnv_hash(&self) -> u32 {
        fnv1a_32(self.as_bytes())
    }

    /// The text, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// The whole buffer, terminator included.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// The text as UTF-8.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    /// The buffer as a C string, or `None` if the text contains a NUL byte.
    pub fn as_c_str(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(self.as_bytes_with_nul()).ok()
    }

    fn text_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.bytes[..len]
    }

    /// Cuts the text back to `len` bytes. Cannot fail.
    fn truncate(&mut self, len: usize) {
        let current = self.len();
        debug_assert!(len <= current);
        self.bytes.delete_n(len, current - len);
    }
}

impl<A: RawAllocator + Clone> DString<A> {
    /// Replaces every non-overlapping occurrence of `pattern` with `with`.
    ///
    /// Returns `Ok(false)`, leaving the string untouched, when `pattern` is
    /// empty or does not occur. The result is built in a fresh buffer, so a
    /// failed allocation leaves the original text in place.
    pub fn replace(&mut self, pattern: &[u8], with: &[u8]) -> Result<bool, AllocError> {
        if pattern.is_empty() {
            return Ok(false);
        }
        let Some(first) = self.find(pattern) else {
            return Ok(false);
        };

        let text = self.as_bytes();
        let mut replaced = Vector::with_capacity_in(self.size(), self.bytes.allocator().clone())?;
        replaced.append_slice(&text[..first])?;
        let mut rest = &text[first..];
        while let Some(offset) = find_bytes(rest, pattern) {
            replaced.append_slice(&rest[..offset])?;
            replaced.append_slice(with)?;
            rest = &rest[offset + pattern.len()..];
        }
        replaced.append_slice(rest)?;
        replaced.push(0)?;

        self.bytes = replaced;
        Ok(true)
    }

    /// Splits the text on any byte in `delims`, skipping empty tokens.
    pub fn tokenize(&self, delims: &[u8]) -> Result<Vector<DString<A>, A>, AllocError> {
        let alloc = self.bytes.allocator();
        let mut tokens = Vector::new_in(alloc.clone());
        for token in self
            .as_bytes()
            .split(|byte| delims.contains(byte))
            .filter(|token| !token.is_empty())
        {
            tokens.push(DString::from_bytes_in(token, alloc.clone())?)?;
        }
        Ok(tokens)
    }

    /// Clones the string, reporting allocation failure instead of panicking.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        Ok(Self {
            bytes: self.bytes.try_clone()?,
        })
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl<A: RawAllocator> fmt::Write for DString<A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}

impl TryFrom<&str> for DString {
    type Error = AllocError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::create(text)
    }
}

impl<A: RawAllocator, B: RawAllocator> PartialEq<DString<B>> for DString<A> {
    fn eq(&self, other: &DString<B>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: RawAllocator> Eq for DString<A> {}

impl<A: RawAllocator> PartialEq<str> for DString<A> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: RawAllocator> PartialEq<&str> for DString<A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: RawAllocator> PartialOrd for DString<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Byte-wise ordering of the text, as `strcmp` orders C strings without
/// interior NULs.
impl<A: RawAllocator> Ord for DString<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl<A: RawAllocator> Hash for DString<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl<A: RawAllocator> fmt::Display for DString<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl<A: RawAllocator> fmt::Debug for DString<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}
