//! The take execution node.
//!
//! [`TakeNode`] drives a [`TakeOp`] over incoming blocks. It only uses
//! grouping to decide which series compete with each other; unlike regular
//! aggregation nodes it does not compress each group into one series.
//!
//! Two paths are chosen once per block from the query context:
//!
//! - **Range**: every step is run through the range take function and
//!   written as one output column. The output keeps the input series set.
//! - **Instantaneous**: only the final step is used. The output is a
//!   one-step block whose series are the retained ones, ordered by
//!   extremity within each group.
//!
//! A node holds no per-block state, so independent blocks may be processed
//! concurrently; each invocation builds its own heap.

use tracing::{debug, trace, warn};

use crate::block::{Block, Metadata, SeriesMeta, StepIter};
use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::grouping::{flatten_metadata, group_series, max_series_count};
use crate::heap::{FloatHeap, HeapOrder};
use crate::metrics::{TAKE_BLOCKS_PROCESSED, TAKE_STEPS_PROCESSED, TAKE_VALUES_DROPPED};
use crate::models::QueryContext;
use crate::take::{TakeKind, TakeOp, TakeStrategy};
use crate::transform::{Controller, NodeId, OpNode, Params, SimpleOpNode, process_simple_block};

/// Execution node for `topk` / `bottomk`.
#[derive(Clone, Debug)]
pub struct TakeNode {
    op: TakeOp,
    controller: Controller,
}

/// The range-mode function picked for a block.
enum RangeTake {
    /// No group can exceed `k`; values pass through unchanged.
    Identity,
    /// One heap reused for every group of every step.
    Heap(FloatHeap),
}

impl RangeTake {
    fn apply(&mut self, strategy: TakeStrategy, values: &mut [f64], buckets: &[Vec<usize>]) {
        match self {
            RangeTake::Identity => {}
            RangeTake::Heap(heap) => strategy.take(heap, values, buckets),
        }
    }
}

/// Heap capacity for `k`, with `k <= 0` mapping to an empty heap.
fn capacity_for(k: i64) -> usize {
    usize::try_from(k.max(0)).unwrap_or(usize::MAX)
}

impl TakeNode {
    pub fn new(op: TakeOp, controller: Controller) -> Self {
        Self { op, controller }
    }

    pub fn params(&self) -> &TakeOp {
        &self.op
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Apply the take to one block and return the resulting block.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported operator type, on any step-iteration or
    /// builder error, and, in instantaneous mode, when the block has no steps.
    pub fn process_block(&self, ctx: &QueryContext, id: NodeId, block: &dyn Block) -> Result<Box<dyn Block>> {
        let result = self.run(ctx, block);
        match &result {
            Ok(_) => {
                if let Some(metrics) = self.controller.metrics() {
                    metrics.increment_counter(TAKE_BLOCKS_PROCESSED, 1);
                }
            }
            Err(err) => warn!(op = %self.op.op_type(), node = %id, error = %err, "take failed"),
        }
        result
    }

    /// Process several independent blocks, each with its own heap. Results
    /// come back in input order; on failure the error of the earliest failing
    /// block is returned.
    ///
    /// # Errors
    ///
    /// See [`process_block`](Self::process_block).
    pub fn process_blocks_par(&self, ctx: &QueryContext, blocks: &[&dyn Block]) -> Result<Vec<Box<dyn Block>>> {
        let id = self.controller.id();

        #[cfg(feature = "parallel")]
        let results: Vec<Result<Box<dyn Block>>> = {
            use rayon::prelude::*;
            blocks.par_iter().map(|b| self.process_block(ctx, id, *b)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<Box<dyn Block>>> =
            blocks.iter().map(|b| self.process_block(ctx, id, *b)).collect();

        results.into_iter().collect()
    }

    fn run(&self, ctx: &QueryContext, block: &dyn Block) -> Result<Box<dyn Block>> {
        let kind = self.op.kind()?;
        let step_iter = block.step_iter()?;

        let params = self.op.params();
        let meta = block.meta().clone();
        let series_metas = flatten_metadata(&meta, step_iter.series_meta());
        let (buckets, _) = group_series(&params.matching_tags, params.without, kind.as_str(), &series_metas);

        let series_count = max_series_count(&buckets);
        let instantaneous = ctx.options.instantaneous;
        debug!(
            op = %kind,
            k = self.op.k(),
            groups = buckets.len(),
            series_count,
            instantaneous,
            "processing take block"
        );

        if instantaneous {
            let heap = FloatHeap::new(kind.heap_order(), capacity_for(self.op.k()).min(series_count));
            self.process_block_instantaneous(heap, kind, ctx, meta, step_iter, series_metas, &buckets)
        } else {
            let take = self.resolve_take(series_count, kind.heap_order());
            self.process_block_range(take, ctx, meta, step_iter, series_metas, &buckets)
        }
    }

    fn resolve_take(&self, series_count: usize, order: HeapOrder) -> RangeTake {
        let k = self.op.k();
        if k < i64::try_from(series_count).unwrap_or(i64::MAX) {
            RangeTake::Heap(FloatHeap::new(order, capacity_for(k)))
        } else {
            RangeTake::Identity
        }
    }

    fn process_block_range(
        &self,
        mut take: RangeTake,
        ctx: &QueryContext,
        meta: Metadata,
        step_iter: Box<dyn StepIter + '_>,
        series_metas: Vec<SeriesMeta>,
        buckets: &[Vec<usize>],
    ) -> Result<Box<dyn Block>> {
        let strategy = self.op.strategy();
        let metrics = self.controller.metrics();

        let width = series_metas.len();
        let mut builder = self.controller.block_builder(ctx, meta, series_metas)?;
        builder.add_cols(step_iter.step_count())?;

        let mut steps = 0u64;
        let mut dropped = 0u64;
        for (index, step) in step_iter.enumerate() {
            let mut values = step?.values;
            check_step_width(index, &values, width)?;
            let present_before = metrics.map(|_| count_present(&values));

            take.apply(strategy, &mut values, buckets);

            if let Some(before) = present_before {
                dropped += (before - count_present(&values)) as u64;
            }
            trace!(index, "take step");
            builder.append_values(index, &values)?;
            steps += 1;
        }

        if let Some(metrics) = metrics {
            metrics.increment_counter(TAKE_STEPS_PROCESSED, steps);
            metrics.increment_counter(TAKE_VALUES_DROPPED, dropped);
        }
        builder.build()
    }

    #[allow(clippy::too_many_arguments)]
    fn process_block_instantaneous(
        &self,
        mut heap: FloatHeap,
        kind: TakeKind,
        ctx: &QueryContext,
        mut meta: Metadata,
        step_iter: Box<dyn StepIter + '_>,
        series_metas: Vec<SeriesMeta>,
        buckets: &[Vec<usize>],
    ) -> Result<Box<dyn Block>> {
        let step_count = step_iter.step_count();
        meta.result_metadata.keep_nans = true;

        for (index, step) in step_iter.enumerate() {
            let step = step?;
            // Instant queries only care about the last step.
            if !is_last_step(index, step_count) {
                continue;
            }
            check_step_width(index, &step.values, series_metas.len())?;

            let taken = self.op.strategy().take_instant(&mut heap, &step.values, buckets, &series_metas);
            let (block_values, block_series): (Vec<f64>, Vec<SeriesMeta>) =
                taken.into_iter().map(|v| (v.val, v.series_meta)).unzip();

            let time = meta.bounds.time_for_index(index)?;
            meta.bounds = Bounds::single_step(time, meta.bounds.step_size);

            if let Some(metrics) = self.controller.metrics() {
                metrics.increment_counter(TAKE_STEPS_PROCESSED, 1);
            }

            let mut builder = self.controller.block_builder(ctx, meta, block_series)?;
            builder.add_cols(1)?;
            builder.append_values(0, &block_values)?;
            return builder.build();
        }

        Err(Error::NoData(kind.to_string()))
    }
}

/// A step must carry exactly one value per series.
fn check_step_width(index: usize, values: &[f64], width: usize) -> Result<()> {
    if values.len() != width {
        return Err(Error::builder(format!("step {index} has {} values, expected {width}", values.len())));
    }
    Ok(())
}

fn is_last_step(index: usize, step_count: usize) -> bool {
    index + 1 == step_count
}

fn count_present(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

impl SimpleOpNode for TakeNode {
    fn params(&self) -> &dyn Params {
        &self.op
    }

    fn process_block(&self, ctx: &QueryContext, id: NodeId, block: &dyn Block) -> Result<Box<dyn Block>> {
        TakeNode::process_block(self, ctx, id, block)
    }
}

impl OpNode for TakeNode {
    fn process(&self, ctx: &QueryContext, id: NodeId, block: &dyn Block) -> Result<()> {
        process_simple_block(self, &self.controller, ctx, id, block)
    }
}
