//! Dynamic RTP payload type allocation

/// First dynamic RTP payload type (RFC 3551)
pub const BASE_PAYLOAD_TYPE: u8 = 96;

/// Last dynamic RTP payload type
pub const MAX_PAYLOAD_TYPE: u8 = 127;

/// Hands out payload types in track order, without reuse
#[derive(Debug, Clone)]
pub struct PayloadAllocator {
    next: u8,
}

impl PayloadAllocator {
    pub fn new() -> Self {
        Self {
            next: BASE_PAYLOAD_TYPE,
        }
    }

    /// The payload type the next hinted track receives, `None` when the
    /// dynamic range is exhausted
    pub fn current(&self) -> Option<u8> {
        (self.next <= MAX_PAYLOAD_TYPE).then_some(self.next)
    }

    /// Mark the current payload type as consumed
    pub fn advance(&mut self) {
        self.next = self.next.saturating_add(1);
    }

    /// Number of payload types consumed so far
    pub fn allocated(&self) -> usize {
        (self.next - BASE_PAYLOAD_TYPE) as usize
    }
}

impl Default for PayloadAllocator {
    fn default() -> Self {
        Self::new()
    }
}
