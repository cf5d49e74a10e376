use anyhow::Result;
use std::collections::VecDeque;

/// Sample count kept for each sparkline.
pub const SPARKLINE_CAPACITY: usize = 50;

/// Fixed-capacity FIFO: pushing past capacity drops the oldest entries.
#[derive(Debug, Clone)]
pub struct BoundedSeries<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedSeries<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> BoundedSeries<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Recent pool hashrate and share-rate samples backing the sparklines.
#[derive(Debug, Clone)]
pub struct History {
    pub hashrates: BoundedSeries<f64>,
    pub shares: BoundedSeries<f64>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            hashrates: BoundedSeries::new(SPARKLINE_CAPACITY),
            shares: BoundedSeries::new(SPARKLINE_CAPACITY),
        }
    }
}

impl History {
    pub fn record(&mut self, hashrate: f64, shares_per_second: f64) {
        self.hashrates.push(hashrate);
        self.shares.push(shares_per_second);
    }
}

/// The plotting collaborator behind the hashrate chart.
///
/// Implementations own their eviction policy; callers only append.
pub trait Chart {
    fn append_point(&mut self, label: &str, value: f64) -> Result<()>;
    fn capacity(&self) -> usize;
    fn points(&self) -> Vec<(String, f64)>;
}

/// In-process line chart holding the last `capacity` labelled points.
#[derive(Debug, Clone)]
pub struct LineChart {
    series: BoundedSeries<(String, f64)>,
}

impl LineChart {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: BoundedSeries::new(capacity),
        }
    }
}

impl Chart for LineChart {
    fn append_point(&mut self, label: &str, value: f64) -> Result<()> {
        self.series.push((label.to_string(), value));
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.series.capacity()
    }

    fn points(&self) -> Vec<(String, f64)> {
        self.series.to_vec()
    }
}

/// Scales samples into a `width` x `height` box, y growing downwards.
///
/// The range always spans at least `[0, 1]` so flat or tiny series stay on
/// the baseline instead of filling the box.
pub fn sparkline_points(data: &[f64], width: f64, height: f64) -> Vec<(f64, f64)> {
    if data.is_empty() {
        return Vec::new();
    }
    let max = data.iter().copied().fold(1.0_f64, f64::max);
    let min = data.iter().copied().fold(0.0_f64, f64::min);
    let range = if max - min == 0.0 { 1.0 } else { max - min };
    let steps = (data.len().saturating_sub(1)).max(1) as f64;

    data.iter()
        .enumerate()
        .map(|(i, v)| {
            let x = (i as f64 / steps) * width;
            let y = height - ((v - min) / range) * height;
            (x, y)
        })
        .collect()
}
