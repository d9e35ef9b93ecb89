//! Growable, always NUL-terminated message buffer.
//!
//! Log messages are assembled in a [`MessageBuffer`] before they are handed to the host.
//! The buffer keeps a trailing NUL byte after every operation so its content can be
//! passed to native code as a C string at any time.
//!
//! Growth never aborts the process: allocation failures and the configured size limit are
//! reported as [`BufferError`]. Callers recover by replacing the content with
//! [`SENTINEL`], which always fits in the capacity reserved at construction.

use std::ffi::CStr;
use std::fmt;
use thiserror::Error;

/// Content used when a message could not be stored.
pub const SENTINEL: &str = "ERROR";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("a message of {requested} bytes exceeds the buffer limit of {limit} bytes")]
    LimitExceeded { requested: usize, limit: usize },
    #[error("could not allocate {requested} bytes for the message buffer")]
    OutOfMemory { requested: usize },
}

/// Append-only text buffer with explicit capacity management.
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    /// Content followed by a single NUL byte.
    bytes: Vec<u8>,
    /// Largest content length the buffer may grow to.
    limit: usize,
}

impl MessageBuffer {
    /// Create an empty buffer able to hold `capacity` bytes without growing.
    pub fn new(capacity: usize, limit: usize) -> Self {
        let capacity = capacity.max(SENTINEL.len());
        let mut bytes = Vec::with_capacity(capacity + 1);
        bytes.push(0);
        Self {
            bytes,
            limit: limit.max(SENTINEL.len()),
        }
    }

    /// Length of the content, excluding the terminator.
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content length the buffer can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity() - 1
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.bytes.push(0);
    }

    /// Shorten the content to `len` bytes. `len` must lie on a character boundary.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.bytes.truncate(len);
            self.bytes.push(0);
        }
    }

    /// Make room for at least `additional` more content bytes, possibly over-allocating.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        self.check_limit(additional)?;
        self.bytes
            .try_reserve(additional)
            .map_err(|_| BufferError::OutOfMemory {
                requested: self.len() + additional,
            })
    }

    /// Make room for exactly `additional` more content bytes.
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), BufferError> {
        self.check_limit(additional)?;
        self.bytes
            .try_reserve_exact(additional)
            .map_err(|_| BufferError::OutOfMemory {
                requested: self.len() + additional,
            })
    }

    fn check_limit(&self, additional: usize) -> Result<(), BufferError> {
        let requested = self.len().saturating_add(additional);
        if requested > self.limit {
            return Err(BufferError::LimitExceeded {
                requested,
                limit: self.limit,
            });
        }
        Ok(())
    }

    pub fn try_push_str(&mut self, text: &str) -> Result<(), BufferError> {
        self.try_reserve(text.len())?;
        self.extend_within_capacity(text.as_bytes());
        Ok(())
    }

    /// Replace the whole content.
    pub fn try_set(&mut self, text: &str) -> Result<(), BufferError> {
        self.clear();
        self.try_push_str(text)
    }

    /// Replace the content with [`SENTINEL`]. Never allocates.
    pub fn set_sentinel(&mut self) {
        self.clear();
        self.extend_within_capacity(SENTINEL.as_bytes());
    }

    /// Render into the buffer, growing it once if the first attempt did not fit.
    ///
    /// The first attempt writes into the current spare capacity only and measures the
    /// full length of the rendering. When it was truncated the partial output is
    /// discarded, the buffer grows to the exact length needed and `render` is invoked
    /// again, so it must produce the same output on every call.
    ///
    /// Returns `true` when the buffer had to grow.
    pub fn try_append_with<F>(&mut self, mut render: F) -> Result<bool, BufferError>
    where
        F: FnMut(&mut dyn fmt::Write) -> fmt::Result,
    {
        let start = self.len();
        let required = self.render_bounded(&mut render);
        if required <= self.capacity() - start {
            return Ok(false);
        }

        self.truncate(start);
        self.try_reserve_exact(required)?;
        self.render_bounded(&mut render);
        Ok(true)
    }

    fn render_bounded<F>(&mut self, render: &mut F) -> usize
    where
        F: FnMut(&mut dyn fmt::Write) -> fmt::Result,
    {
        let mut writer = BoundedWriter {
            buffer: self,
            required: 0,
            truncated: false,
        };
        // The bounded writer never fails, a formatting error can only come from `render`
        // itself and leaves whatever was written so far.
        let _ = render(&mut writer);
        writer.required
    }

    /// Append bytes that are known to fit into the current capacity.
    fn extend_within_capacity(&mut self, content: &[u8]) {
        self.bytes.pop();
        self.bytes.extend_from_slice(content);
        self.bytes.push(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or(SENTINEL)
    }

    /// Content as a C string, cut at the first interior NUL if there is one.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.bytes).unwrap_or_default()
    }

    /// Drop the allocated storage, keeping only room for the sentinel.
    pub fn release(&mut self) {
        let mut bytes = Vec::with_capacity(SENTINEL.len() + 1);
        bytes.push(0);
        self.bytes = bytes;
    }
}

/// Writer that appends into the spare capacity of a buffer without growing it.
struct BoundedWriter<'a> {
    buffer: &'a mut MessageBuffer,
    /// Bytes the complete rendering needs.
    required: usize,
    /// Once a chunk did not fit, nothing else is written so the output stays a prefix.
    truncated: bool,
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.required += s.len();
        if self.truncated {
            return Ok(());
        }

        let spare = self.buffer.capacity() - self.buffer.len();
        if s.len() <= spare {
            self.buffer.extend_within_capacity(s.as_bytes());
        } else {
            let mut end = spare;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            self.buffer.extend_within_capacity(&s.as_bytes()[..end]);
            self.truncated = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_nul_terminated() {
        let mut buffer = MessageBuffer::new(8, 1024);
        assert_eq!(buffer.as_c_str().to_bytes(), b"");

        buffer.try_push_str("hello").unwrap();
        assert_eq!(buffer.as_c_str().to_str().unwrap(), "hello");

        buffer.try_push_str(", world and more").unwrap();
        assert_eq!(buffer.as_str(), "hello, world and more");
        assert_eq!(buffer.as_c_str().to_bytes().len(), buffer.len());

        buffer.truncate(5);
        assert_eq!(buffer.as_c_str().to_str().unwrap(), "hello");

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_c_str().to_bytes(), b"");
    }

    #[test]
    fn limit_degrades_to_sentinel() {
        let mut buffer = MessageBuffer::new(4, 10);
        buffer.try_push_str("0123456789").unwrap();

        let err = buffer.try_push_str("x").unwrap_err();
        assert_eq!(
            err,
            BufferError::LimitExceeded {
                requested: 11,
                limit: 10
            }
        );
        // Failed growth leaves the previous content untouched.
        assert_eq!(buffer.as_str(), "0123456789");

        buffer.set_sentinel();
        assert_eq!(buffer.as_str(), SENTINEL);
        assert_eq!(buffer.as_c_str().to_str().unwrap(), SENTINEL);
    }

    #[test]
    fn sentinel_fits_after_release() {
        let mut buffer = MessageBuffer::new(0, 0);
        assert!(buffer.capacity() >= SENTINEL.len());
        buffer.release();
        let capacity = buffer.capacity();
        buffer.set_sentinel();
        assert_eq!(buffer.capacity(), capacity);
        assert_eq!(buffer.as_str(), SENTINEL);
    }

    #[test]
    fn append_with_grows_once_and_matches_pre_grown_output() {
        let text = "a message that is much longer than the initial capacity";
        let render = |w: &mut dyn fmt::Write| write!(w, "[{}] {} ({})", "category", text, 42);

        let mut small = MessageBuffer::new(8, 4096);
        let grew = small.try_append_with(render).unwrap();
        assert!(grew);

        let mut large = MessageBuffer::new(1024, 4096);
        let grew = large.try_append_with(render).unwrap();
        assert!(!grew);

        assert_eq!(small.as_str(), large.as_str());
        assert_eq!(
            small.as_str(),
            format!("[category] {} (42)", text).as_str()
        );
        assert_eq!(small.as_c_str().to_bytes(), small.as_bytes());
    }

    #[test]
    fn append_with_keeps_existing_prefix() {
        let mut buffer = MessageBuffer::new(6, 4096);
        buffer.try_push_str("[hdr] ").unwrap();
        buffer
            .try_append_with(|w| write!(w, "{}-{}", "multi-byte ünïcödé", 7))
            .unwrap();
        assert_eq!(buffer.as_str(), "[hdr] multi-byte ünïcödé-7");
    }

    #[test]
    fn append_with_respects_limit() {
        let mut buffer = MessageBuffer::new(8, 16);
        let err = buffer
            .try_append_with(|w| w.write_str("this does not fit in sixteen bytes"))
            .unwrap_err();
        assert!(matches!(err, BufferError::LimitExceeded { .. }));
    }
}
