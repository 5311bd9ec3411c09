//! # blocktake
//!
//! The **top-k / bottom-k** aggregation node of a time-series query engine.
//!
//! Given a block of series (a `series × steps` matrix) and a grouping, a take
//! node keeps, per step and per group, only the `k` series with the largest
//! (`topk`) or smallest (`bottomk`) value and replaces the rest with NaN. In
//! instantaneous mode it instead emits, for the final step only, a reduced
//! series set ordered by value within each group.
//!
//! ## Quick Start
//!
//! ```
//! use blocktake::*;
//! use blocktake::testing::{read_rows, assert_rows_eq, BlockFixture};
//!
//! # fn main() -> anyhow::Result<()> {
//! let block = BlockFixture::new(0, 10)
//!     .series(&[("dc", "east"), ("host", "a")], &[5.0])
//!     .series(&[("dc", "east"), ("host", "b")], &[f64::NAN])
//!     .series(&[("dc", "east"), ("host", "c")], &[9.0])
//!     .series(&[("dc", "east"), ("host", "d")], &[1.0])
//!     .build()?;
//!
//! let op = TakeOp::top_k(NodeParams::with_k(2).by(["dc"]));
//! let node = op.node(Controller::default());
//! let out = node.process_block(&QueryContext::range(), NodeId::new(1), &block)?;
//!
//! assert_rows_eq(
//!     &read_rows(out.as_ref())?,
//!     &[vec![5.0], vec![f64::NAN], vec![9.0], vec![f64::NAN]],
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! - [`FloatHeap`] - fixed-capacity heap keeping the `k` most extreme values,
//!   oriented by [`HeapOrder`]
//! - [`TakeOp`] - immutable operator descriptor (kind, `k`, grouping), built
//!   once per plan node; it picks a [`TakeStrategy`] up front
//! - [`TakeNode`] - drives a block through the range or instantaneous path
//! - [`Block`], [`StepIter`], [`BlockBuilder`] - the block abstraction the
//!   node reads from and writes to; [`ColumnBlock`] is the in-memory version
//! - [`group_series`] - partitions series into groups by tags
//!
//! ## Missing Values
//!
//! NaN is the missing marker. Missing values never compete: in range mode
//! they are skipped before reaching the heap, and in instantaneous mode the
//! heap ranks them below every real value.
//!
//! ## Module Overview
//!
//! - [`heap`] - the bounded value heap
//! - [`take`] - take functions and the operator descriptor
//! - [`node`] - the execution node
//! - [`block`] - blocks, step iterators, builders
//! - [`grouping`] - tag-based series grouping
//! - [`transform`] - controllers and node traits
//! - [`metrics`] - execution counters
//! - [`testing`] - fixtures and NaN-aware assertions

pub mod block;
pub mod bounds;
pub mod error;
pub mod grouping;
pub mod heap;
pub mod metrics;
pub mod models;
pub mod node;
pub mod take;
pub mod testing;
pub mod transform;

pub use block::{
    Block, BlockBuilder, ColumnBlock, ColumnBlockBuilder, Metadata, ResultMetadata, SeriesMeta, Step,
    StepIter,
};
pub use bounds::{Bounds, DurationMs, TimestampMs};
pub use error::{Error, Result};
pub use grouping::{flatten_metadata, group_series, max_series_count};
pub use heap::{FloatHeap, HeapOrder, ValIndex};
pub use metrics::MetricsCollector;
pub use models::{QueryContext, QueryOptions, Tag, Tags};
pub use node::TakeNode;
pub use take::{BOTTOM_K_TYPE, NodeParams, TOP_K_TYPE, TakeKind, TakeOp, TakeStrategy, ValueAndMeta};
pub use transform::{
    BlockBuilderFactory, ColumnBuilderFactory, Controller, NodeId, OpNode, Params, SimpleOpNode,
};
