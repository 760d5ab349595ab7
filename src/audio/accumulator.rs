//! Contiguous PCM output buffer filled in whole segments.

use crate::audio::SegmentSize;

/// Appends resampled bytes to one contiguous buffer.
///
/// Bytes are staged until a full segment is available, so the output grows
/// in segment-sized steps; `finish` commits the final partial segment.
#[derive(Debug)]
pub struct BufferAccumulator {
    segment_bytes: usize,
    staging: Vec<u8>,
    output: Vec<u8>,
    segments: usize,
}

impl BufferAccumulator {
    /// Create an accumulator that appends to an existing buffer.
    pub fn with_output(segment: &SegmentSize, output: Vec<u8>) -> Self {
        let segment_bytes = segment.bytes();
        Self {
            segment_bytes,
            staging: Vec::with_capacity(segment_bytes),
            output,
            segments: 0,
        }
    }

    /// Append bytes, committing every completed segment.
    pub fn append(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let room = self.segment_bytes - self.staging.len();
            let take = room.min(bytes.len());
            self.staging.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            if self.staging.len() == self.segment_bytes {
                self.output.extend_from_slice(&self.staging);
                self.staging.clear();
                self.segments += 1;
            }
        }
    }

    /// Number of full segments committed so far.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Commit the staged remainder and return the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        self.output.extend_from_slice(&self.staging);
        self.output
    }
}
