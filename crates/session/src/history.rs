use std::collections::VecDeque;

use sim::ReactorState;

/// Bounded ring of sampled plant states for trend plots. Oldest samples fall
/// off once the cap is reached; each sample carries its own timestamp.
#[derive(Clone, Debug)]
pub struct History {
    samples: VecDeque<ReactorState>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(cap),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, sample: ReactorState) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&ReactorState> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReactorState> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
