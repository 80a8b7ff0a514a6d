use crate::error::StatisticsError;

/// Capacity of the raw statistics record, seven radio fragments of 16 bytes.
pub const STATISTIC_PACKET_SIZE: usize = 7 * 16;

/// Reassembles radio fragments into one contiguous record.
#[derive(Clone, Debug)]
pub struct FragmentAssembler {
    buffer: [u8; STATISTIC_PACKET_SIZE],
    written: [bool; STATISTIC_PACKET_SIZE],
    filled: usize,
    finalized: bool,
}

impl Default for FragmentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self {
            buffer: [0; STATISTIC_PACKET_SIZE],
            written: [false; STATISTIC_PACKET_SIZE],
            filled: 0,
            finalized: false,
        }
    }

    /// Starts a new reception cycle.
    pub fn reset(&mut self) {
        self.buffer = [0; STATISTIC_PACKET_SIZE];
        self.written = [false; STATISTIC_PACKET_SIZE];
        self.filled = 0;
        self.finalized = false;
    }

    /// Copies `payload` into the record at `offset`.
    ///
    /// A rejected fragment leaves the buffer untouched.
    pub fn append(&mut self, offset: u8, payload: &[u8]) -> Result<(), StatisticsError> {
        if self.finalized {
            return Err(StatisticsError::AppendAfterFinalize);
        }

        let start = offset as usize;
        let end = start + payload.len();
        if end > STATISTIC_PACKET_SIZE {
            return Err(StatisticsError::Overflow {
                offset: start,
                len: payload.len(),
                capacity: STATISTIC_PACKET_SIZE,
            });
        }

        self.buffer[start..end].copy_from_slice(payload);
        self.written[start..end].fill(true);
        self.filled = self.filled.max(end);

        Ok(())
    }

    /// Closes the cycle and returns the record length. No appends are
    /// accepted until the next `reset`.
    pub fn finalize(&mut self) -> Result<usize, StatisticsError> {
        if self.finalized {
            return Err(StatisticsError::AlreadyFinalized);
        }
        self.finalized = true;
        Ok(self.filled)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn filled_len(&self) -> usize {
        self.filled
    }

    /// Bytes received so far in this cycle. Gaps left by missing
    /// fragments read as zero.
    pub fn record(&self) -> &[u8] {
        &self.buffer[..self.filled]
    }

    /// Whether every byte of `range` arrived in this cycle.
    pub fn covers(&self, range: std::ops::Range<usize>) -> bool {
        self.written
            .get(range)
            .is_some_and(|bytes| bytes.iter().all(|&b| b))
    }

    /// Number of bytes received within the first `len` of the record.
    pub fn received_within(&self, len: usize) -> usize {
        self.written[..len.min(STATISTIC_PACKET_SIZE)]
            .iter()
            .filter(|&&b| b)
            .count()
    }
}
