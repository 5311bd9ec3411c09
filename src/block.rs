//! Blocks of multivariate time series and the builders that assemble them.
//!
//! A block is a matrix of `series × steps`. Consumers read it one step at a
//! time through a [`StepIter`], which yields a [`Step`] holding one value per
//! series. Index position within a step is the series identity and lines up
//! with [`Block::series_meta`].
//!
//! [`ColumnBlock`] and [`ColumnBlockBuilder`] are the in-memory
//! implementations used by the take operator and its tests.

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, TimestampMs};
use crate::error::{Error, Result};
use crate::models::Tags;

/// Identity of one series within a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub name: String,
    pub tags: Tags,
}

impl SeriesMeta {
    pub fn new(name: impl Into<String>, tags: Tags) -> Self {
        Self { name: name.into(), tags }
    }
}

/// Flags describing how a result should be rendered downstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultMetadata {
    /// Keep series whose values are all missing instead of dropping them.
    pub keep_nans: bool,
    pub exhaustive: bool,
    pub warnings: Vec<String>,
}

impl Default for ResultMetadata {
    fn default() -> Self {
        Self { keep_nans: false, exhaustive: true, warnings: Vec::new() }
    }
}

/// Block-level metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub bounds: Bounds,
    /// Tags shared by every series in the block.
    pub tags: Tags,
    pub result_metadata: ResultMetadata,
}

impl Metadata {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds, ..Self::default() }
    }
}

/// One time step: its timestamp and one value per series.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub time: TimestampMs,
    pub values: Vec<f64>,
}

/// Iterates the steps of a block in time order.
///
/// The first `Err` item ends iteration; consumers must not poll past it.
pub trait StepIter: Iterator<Item = Result<Step>> {
    fn series_meta(&self) -> &[SeriesMeta];

    fn step_count(&self) -> usize;
}

/// A materialized block of series values.
pub trait Block: Send + Sync {
    fn meta(&self) -> &Metadata;

    fn series_meta(&self) -> &[SeriesMeta];

    fn step_iter(&self) -> Result<Box<dyn StepIter + '_>>;
}

/// Accumulates columns and produces a finished block.
pub trait BlockBuilder: Send {
    /// Preallocate `count` additional columns.
    fn add_cols(&mut self, count: usize) -> Result<()>;

    /// Write one step's worth of series values into column `index`.
    fn append_values(&mut self, index: usize, values: &[f64]) -> Result<()>;

    fn build(self: Box<Self>) -> Result<Box<dyn Block>>;
}

/* ===================== ColumnBlock ===================== */

/// In-memory block stored column-major: `columns[step][series]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBlock {
    meta: Metadata,
    series: Vec<SeriesMeta>,
    columns: Vec<Vec<f64>>,
}

impl ColumnBlock {
    /// Create a block from step columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] if any column length differs from the
    /// series count.
    pub fn new(meta: Metadata, series: Vec<SeriesMeta>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != series.len()) {
            return Err(Error::builder(format!(
                "column {i} has {} values, expected {}",
                col.len(),
                series.len()
            )));
        }
        Ok(Self { meta, series, columns })
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Values of one series across every step.
    pub fn series_values(&self, series: usize) -> Vec<f64> {
        self.columns.iter().map(|col| col[series]).collect()
    }
}

impl Block for ColumnBlock {
    fn meta(&self) -> &Metadata {
        &self.meta
    }

    fn series_meta(&self) -> &[SeriesMeta] {
        &self.series
    }

    fn step_iter(&self) -> Result<Box<dyn StepIter + '_>> {
        Ok(Box::new(ColumnStepIter { block: self, index: 0 }))
    }
}

struct ColumnStepIter<'a> {
    block: &'a ColumnBlock,
    index: usize,
}

impl Iterator for ColumnStepIter<'_> {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.block.columns.get(self.index)?.clone();
        let bounds = &self.block.meta.bounds;
        let time = bounds.start + self.index as i64 * bounds.step_size;
        self.index += 1;
        Some(Ok(Step { time, values }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.block.columns.len() - self.index;
        (left, Some(left))
    }
}

impl StepIter for ColumnStepIter<'_> {
    fn series_meta(&self) -> &[SeriesMeta] {
        &self.block.series
    }

    fn step_count(&self) -> usize {
        self.block.columns.len()
    }
}

/* ===================== ColumnBlockBuilder ===================== */

/// Builds a [`ColumnBlock`]. Every preallocated column must be written
/// exactly once before [`BlockBuilder::build`].
#[derive(Debug)]
pub struct ColumnBlockBuilder {
    meta: Metadata,
    series: Vec<SeriesMeta>,
    columns: Vec<Option<Vec<f64>>>,
}

impl ColumnBlockBuilder {
    pub fn new(meta: Metadata, series: Vec<SeriesMeta>) -> Self {
        Self { meta, series, columns: Vec::new() }
    }
}

impl BlockBuilder for ColumnBlockBuilder {
    fn add_cols(&mut self, count: usize) -> Result<()> {
        self.columns.resize(self.columns.len() + count, None);
        Ok(())
    }

    fn append_values(&mut self, index: usize, values: &[f64]) -> Result<()> {
        let cols = self.columns.len();
        let series = self.series.len();
        let slot = self
            .columns
            .get_mut(index)
            .ok_or_else(|| Error::builder(format!("column {index} not allocated ({cols} columns)")))?;
        if values.len() != series {
            return Err(Error::builder(format!(
                "column {index} given {} values, expected {series}",
                values.len()
            )));
        }
        if slot.is_some() {
            return Err(Error::builder(format!("column {index} written twice")));
        }
        *slot = Some(values.to_vec());
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<Box<dyn Block>> {
        let Self { meta, series, columns } = *self;
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, col)| col.ok_or_else(|| Error::builder(format!("column {i} was never written"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(ColumnBlock { meta, series, columns }))
    }
}
