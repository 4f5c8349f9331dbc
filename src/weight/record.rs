use anyhow::Result;

use crate::layer::FieldValue;

/// One source polygon's share of one target polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRecord {
    pub to_id: FieldValue,
    pub from_id: FieldValue,
    /// Sum of contribution areas over all sources of this target.
    pub total_area: f64,
    /// This source's contribution area (intersection or full source area).
    pub from_area: f64,
    pub proportion: f64,
    /// Source attribute values, in requested attribute order.
    pub values: Vec<f64>,
    /// `proportion * value`, in requested attribute order.
    pub shares: Vec<f64>,
}

/// Area-weighted estimates for one target polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub to_id: FieldValue,
    /// Number of distinct source ids intersecting the target.
    pub count: usize,
    pub total_area: f64,
    /// Weighted attribute sums, in requested attribute order.
    pub sums: Vec<f64>,
}

/// Receives records as targets are processed.
pub trait RecordSink {
    fn contribution(&mut self, record: &ContributionRecord) -> Result<()>;

    fn aggregate(&mut self, record: &AggregateRecord) -> Result<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn contribution(&mut self, record: &ContributionRecord) -> Result<()> {
        (**self).contribution(record)
    }

    fn aggregate(&mut self, record: &AggregateRecord) -> Result<()> {
        (**self).aggregate(record)
    }
}

/// Collects every record in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightResult {
    pub aggregates: Vec<AggregateRecord>,
    pub contributions: Vec<ContributionRecord>,
}

impl RecordSink for WeightResult {
    fn contribution(&mut self, record: &ContributionRecord) -> Result<()> {
        self.contributions.push(record.clone());
        Ok(())
    }

    fn aggregate(&mut self, record: &AggregateRecord) -> Result<()> {
        self.aggregates.push(record.clone());
        Ok(())
    }
}
