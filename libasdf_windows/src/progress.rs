/// Progress report emitted once per observed station
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationStatus {
    pub index: usize,
    pub total: usize,
    pub station: String,
}

impl StationStatus {
    pub fn new(index: usize, total: usize, station: &str) -> Self {
        Self {
            index,
            total,
            station: station.to_string(),
        }
    }

    /// Fraction of stations finished once this one is done
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.index + 1) as f32 / self.total as f32
    }
}
