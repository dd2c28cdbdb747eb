//! Newline-framed message source
//!
//! One message per line. A single buffer is reused for every frame, so
//! once it has grown to the longest line the source stops allocating.

use std::io::{self, BufRead};

/// Frames messages out of any `BufRead`
pub struct MessageSource<R> {
    reader: R,
    buf: Vec<u8>,
    frames: u64,
    skipped: u64,
}

impl<R: BufRead> MessageSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, 256)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(capacity),
            frames: 0,
            skipped: 0,
        }
    }

    /// Next non-blank frame without its line terminator
    ///
    /// Returns `Ok(None)` at end of input. A final line without a
    /// trailing newline is still a frame.
    pub fn next_frame(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }

            let mut end = self.buf.len();
            if end > 0 && self.buf[end - 1] == b'\n' {
                end -= 1;
            }
            if end > 0 && self.buf[end - 1] == b'\r' {
                end -= 1;
            }

            if end == 0 {
                self.skipped += 1;
                continue;
            }

            self.frames += 1;
            return Ok(Some(&self.buf[..end]));
        }
    }

    /// Frames returned so far
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Blank lines skipped so far
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> (Vec<Vec<u8>>, u64) {
        let mut source = MessageSource::new(input);
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            frames.push(frame.to_vec());
        }
        assert_eq!(source.frames(), frames.len() as u64);
        (frames, source.skipped())
    }

    #[test]
    fn test_lines_and_crlf() {
        let (frames, skipped) = collect(b"11=A|55=X\r\n11=B|55=Y\n11=C");
        assert_eq!(
            frames,
            vec![b"11=A|55=X".to_vec(), b"11=B|55=Y".to_vec(), b"11=C".to_vec()]
        );
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let (frames, skipped) = collect(b"\n\r\n11=A\n\n");
        assert_eq!(frames, vec![b"11=A".to_vec()]);
        assert_eq!(skipped, 3);
    }

    #[test]
    fn test_escaped_pipe_kept_verbatim() {
        let (frames, _) = collect(b"11=A\\|B|55=X\n");
        assert_eq!(frames, vec![b"11=A\\|B|55=X".to_vec()]);
    }

    #[test]
    fn test_empty_input() {
        let (frames, skipped) = collect(b"");
        assert!(frames.is_empty());
        assert_eq!(skipped, 0);
    }
}
