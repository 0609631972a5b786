use crate::tracker::Position;

/// Positions of the current tracking episode, in arrival order.
#[derive(Debug, Default)]
pub struct SampleHistory {
    samples: Vec<Position>,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every sample of the previous episode.
    pub fn start_episode(&mut self) {
        self.samples.clear();
    }

    pub fn record(&mut self, mut position: Position) -> &Position {
        position.index = self.samples.len();
        self.samples.push(position);
        &self.samples[self.samples.len() - 1]
    }

    pub fn samples(&self) -> &[Position] {
        &self.samples
    }
}
