//! Builders for test blocks and test nodes.

use anyhow::anyhow;
use std::sync::{Mutex, PoisonError};

use crate::block::{Block, ColumnBlock, Metadata, SeriesMeta, Step, StepIter};
use crate::bounds::{Bounds, DurationMs, TimestampMs};
use crate::error::{Error, Result};
use crate::models::{QueryContext, Tags};
use crate::transform::{NodeId, OpNode};

/// A fluent builder for [`ColumnBlock`]s, one series (row) at a time.
///
/// Every series must have the same number of values; that number becomes
/// the block's step count.
///
/// # Example
///
/// ```
/// use blocktake::testing::BlockFixture;
/// use blocktake::Block;
///
/// let block = BlockFixture::new(1_000, 10)
///     .named_series("cpu", &[("host", "a")], &[1.0, 2.0, 3.0])
///     .series(&[("host", "b")], &[4.0, 5.0, 6.0])
///     .build()
///     .unwrap();
///
/// assert_eq!(block.meta().bounds.steps(), 3);
/// assert_eq!(block.series_meta().len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BlockFixture {
    start: TimestampMs,
    step_size: DurationMs,
    common_tags: Tags,
    series: Vec<SeriesMeta>,
    rows: Vec<Vec<f64>>,
}

impl BlockFixture {
    #[must_use]
    pub fn new(start: TimestampMs, step_size: DurationMs) -> Self {
        Self { start, step_size, ..Self::default() }
    }

    /// Add a series with no metric name.
    #[must_use]
    pub fn series(self, tags: &[(&str, &str)], values: &[f64]) -> Self {
        self.named_series("", tags, values)
    }

    /// Add a series whose `__name__` tag and meta name are `name`.
    #[must_use]
    pub fn named_series(mut self, name: &str, tags: &[(&str, &str)], values: &[f64]) -> Self {
        let mut tag_set = Tags::from_pairs(tags.iter().copied());
        if !name.is_empty() {
            tag_set = tag_set.with_tag(crate::models::METRIC_NAME_TAG, name);
        }
        self.series.push(SeriesMeta::new(name, tag_set));
        self.rows.push(values.to_vec());
        self
    }

    /// Add a series with an existing meta.
    #[must_use]
    pub fn meta_series(mut self, meta: SeriesMeta, values: &[f64]) -> Self {
        self.series.push(meta);
        self.rows.push(values.to_vec());
        self
    }

    /// Tags shared by every series, stored on the block metadata.
    #[must_use]
    pub fn common_tag(mut self, name: &str, value: &str) -> Self {
        self.common_tags = self.common_tags.with_tag(name, value);
        self
    }

    /// Build the block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] if the series have differing lengths.
    pub fn build(self) -> Result<ColumnBlock> {
        let steps = self.rows.first().map_or(0, Vec::len);
        if let Some(row) = self.rows.iter().position(|r| r.len() != steps) {
            return Err(Error::builder(format!(
                "series {row} has {} values, expected {steps}",
                self.rows[row].len()
            )));
        }

        let columns = (0..steps)
            .map(|step| self.rows.iter().map(|row| row[step]).collect())
            .collect();
        let mut meta = Metadata::new(Bounds::new(self.start, steps as i64 * self.step_size, self.step_size));
        meta.tags = self.common_tags;
        ColumnBlock::new(meta, self.series, columns)
    }
}

/// A block whose step iterator fails with an upstream error at `fail_at`.
///
/// Steps before `fail_at` come from the wrapped block.
pub struct FailingBlock {
    inner: ColumnBlock,
    fail_at: usize,
}

impl FailingBlock {
    pub fn new(inner: ColumnBlock, fail_at: usize) -> Self {
        Self { inner, fail_at }
    }
}

impl Block for FailingBlock {
    fn meta(&self) -> &Metadata {
        self.inner.meta()
    }

    fn series_meta(&self) -> &[SeriesMeta] {
        self.inner.series_meta()
    }

    fn step_iter(&self) -> Result<Box<dyn StepIter + '_>> {
        Ok(Box::new(FailingStepIter { inner: self.inner.step_iter()?, index: 0, fail_at: self.fail_at }))
    }
}

struct FailingStepIter<'a> {
    inner: Box<dyn StepIter + 'a>,
    index: usize,
    fail_at: usize,
}

impl Iterator for FailingStepIter<'_> {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        self.index += 1;
        if index == self.fail_at {
            return Some(Err(Error::upstream(anyhow!("injected failure at step {index}"))));
        }
        if index > self.fail_at {
            return None;
        }
        self.inner.next()
    }
}

impl StepIter for FailingStepIter<'_> {
    fn series_meta(&self) -> &[SeriesMeta] {
        self.inner.series_meta()
    }

    fn step_count(&self) -> usize {
        self.inner.step_count()
    }
}

/// What a [`CollectingNode`] received.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedBlock {
    pub from: NodeId,
    pub meta: Metadata,
    pub series: Vec<SeriesMeta>,
    pub rows: Vec<Vec<f64>>,
}

/// A downstream node that records every block pushed to it.
#[derive(Debug, Default)]
pub struct CollectingNode {
    blocks: Mutex<Vec<CollectedBlock>>,
}

impl CollectingNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> Vec<CollectedBlock> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl OpNode for CollectingNode {
    fn process(&self, _ctx: &QueryContext, id: NodeId, block: &dyn Block) -> Result<()> {
        let collected = CollectedBlock {
            from: id,
            meta: block.meta().clone(),
            series: block.series_meta().to_vec(),
            rows: super::read_rows(block)?,
        };
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner).push(collected);
        Ok(())
    }
}
