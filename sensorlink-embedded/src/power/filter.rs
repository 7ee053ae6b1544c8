use heapless::Deque;

/// Fixed-capacity FIFO of recent raw samples, averaged on read.
#[derive(Debug, Default)]
pub struct SlidingWindow<const N: usize> {
    samples: Deque<u16, N>,
}

impl<const N: usize> SlidingWindow<N> {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Appends a sample, evicting the oldest one at capacity.
    pub fn push(&mut self, sample: u16) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        let _ = self.samples.push_back(sample);
    }

    /// Integer arithmetic mean of the current contents.
    pub fn average(&self) -> Option<u16> {
        if self.samples.is_empty() {
            return None;
        }

        let sum: u32 = self.samples.iter().map(|&s| u32::from(s)).sum();
        Some((sum / self.samples.len() as u32) as u16)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    pub fn iter(&self) -> impl Iterator<Item = &u16> {
        self.samples.iter()
    }
}
