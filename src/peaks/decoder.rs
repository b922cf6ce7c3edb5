//! Byte chunk to per-channel sample decoding.
//!
//! Input is interleaved 16-bit signed little-endian PCM. Chunks may split a
//! sample in half, so the decoder carries one pending byte and the channel
//! rotation across calls.

/// Reusable per-channel sample buffers filled by [`ChunkDecoder`].
#[derive(Debug, Clone, Default)]
pub struct ChannelBatch {
    channels: Vec<Vec<i16>>,
}

impl ChannelBatch {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: vec![Vec::new(); channels],
        }
    }

    /// Empties every channel, keeping allocations, and resizes to `channels`.
    fn reset(&mut self, channels: usize) {
        self.channels.resize_with(channels, Vec::new);
        for channel in &mut self.channels {
            channel.clear();
        }
    }

    pub fn channels(&self) -> &[Vec<i16>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> &[i16] {
        self.channels.get(index).map_or(&[], |c| c.as_slice())
    }

    /// Samples across all channels.
    pub fn total_len(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }
}

/// Stateful decoder for one interleaved PCM stream.
#[derive(Debug, Clone)]
pub struct ChunkDecoder {
    channels: usize,
    /// Channel that receives the next decoded sample.
    next_channel: usize,
    /// Low byte of a sample split across chunks.
    pending: Option<u8>,
}

impl ChunkDecoder {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: channels.max(1),
            next_channel: 0,
            pending: None,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn next_channel(&self) -> usize {
        self.next_channel
    }

    pub fn pending_byte(&self) -> Option<u8> {
        self.pending
    }

    /// Decodes `chunk` into a fresh batch.
    pub fn decode(&mut self, chunk: &[u8]) -> ChannelBatch {
        let mut batch = ChannelBatch::new(self.channels);
        self.decode_into(chunk, &mut batch);
        batch
    }

    /// Decodes `chunk` into `batch`, replacing its previous contents.
    pub fn decode_into(&mut self, chunk: &[u8], batch: &mut ChannelBatch) {
        batch.reset(self.channels);
        if chunk.is_empty() {
            return;
        }

        let mut rest = chunk;
        if let Some(low) = self.pending.take()
            && let Some((&high, tail)) = rest.split_first()
        {
            self.push(batch, i16::from_le_bytes([low, high]));
            rest = tail;
        }

        let mut pairs = rest.chunks_exact(2);
        for pair in &mut pairs {
            self.push(batch, i16::from_le_bytes([pair[0], pair[1]]));
        }
        self.pending = pairs.remainder().first().copied();
    }

    fn push(&mut self, batch: &mut ChannelBatch, sample: i16) {
        batch.channels[self.next_channel].push(sample);
        self.next_channel = (self.next_channel + 1) % self.channels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_mono_little_endian() {
        let mut decoder = ChunkDecoder::new(1);
        let batch = decoder.decode(&encode(&[1, -1, 256, i16::MIN, i16::MAX]));
        assert_eq!(batch.channel(0), &[1, -1, 256, i16::MIN, i16::MAX]);
        assert_eq!(decoder.pending_byte(), None);
    }

    #[test]
    fn deinterleaves_round_robin() {
        let mut decoder = ChunkDecoder::new(3);
        let batch = decoder.decode(&encode(&[10, 20, 30, 11, 21, 31, 12]));
        assert_eq!(batch.channel(0), &[10, 11, 12]);
        assert_eq!(batch.channel(1), &[20, 21]);
        assert_eq!(batch.channel(2), &[30, 31]);
        assert_eq!(decoder.next_channel(), 1);
    }

    #[test]
    fn odd_chunk_carries_low_byte() {
        let bytes = encode(&[-2, 300]);
        let mut decoder = ChunkDecoder::new(1);

        let first = decoder.decode(&bytes[..3]);
        assert_eq!(first.channel(0), &[-2]);
        assert_eq!(decoder.pending_byte(), Some(bytes[2]));

        let second = decoder.decode(&bytes[3..]);
        assert_eq!(second.channel(0), &[300]);
        assert_eq!(decoder.pending_byte(), None);
    }

    #[test]
    fn single_byte_chunks_only_update_carry_state() {
        let bytes = encode(&[-12345]);
        let mut decoder = ChunkDecoder::new(1);

        let first = decoder.decode(&bytes[..1]);
        assert!(first.is_empty());
        assert_eq!(decoder.pending_byte(), Some(bytes[0]));

        let second = decoder.decode(&bytes[1..]);
        assert_eq!(second.channel(0), &[-12345]);
    }

    #[test]
    fn empty_chunk_keeps_pending_byte() {
        let mut decoder = ChunkDecoder::new(2);
        decoder.decode(&[0x34]);
        let batch = decoder.decode(&[]);
        assert!(batch.is_empty());
        assert_eq!(decoder.pending_byte(), Some(0x34));

        let batch = decoder.decode(&[0x12]);
        assert_eq!(batch.channel(0), &[0x1234]);
        assert_eq!(decoder.next_channel(), 1);
    }

    #[test]
    fn split_sample_rotates_channel() {
        let bytes = encode(&[7, -7, 8, -8]);
        let mut decoder = ChunkDecoder::new(2);

        let a = decoder.decode(&bytes[..3]);
        let b = decoder.decode(&bytes[3..5]);
        let c = decoder.decode(&bytes[5..]);

        assert_eq!(a.channel(0), &[7]);
        assert!(a.channel(1).is_empty());
        assert_eq!(b.channel(1), &[-7]);
        assert!(b.channel(0).is_empty());
        assert_eq!(c.channel(0), &[8]);
        assert_eq!(c.channel(1), &[-8]);
    }

    #[test]
    fn decode_into_reuses_batch() {
        let mut decoder = ChunkDecoder::new(2);
        let mut batch = ChannelBatch::default();

        decoder.decode_into(&encode(&[1, 2, 3, 4]), &mut batch);
        assert_eq!(batch.total_len(), 4);

        decoder.decode_into(&encode(&[5, 6]), &mut batch);
        assert_eq!(batch.channel(0), &[5]);
        assert_eq!(batch.channel(1), &[6]);
    }

    #[test]
    fn zero_channels_treated_as_mono() {
        let decoder = ChunkDecoder::new(0);
        assert_eq!(decoder.channels(), 1);
    }
}
