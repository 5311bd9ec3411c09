//! Plumbing between execution nodes.
//!
//! A [`Controller`] belongs to one node of the query plan. It hands the node
//! block builders and forwards whatever the node produces to the nodes
//! downstream of it.

use std::fmt;
use std::sync::Arc;

use crate::block::{Block, BlockBuilder, ColumnBlockBuilder, Metadata, SeriesMeta};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::QueryContext;

/// Identifier of a node within a query plan.
///
/// Small, `Copy`, and hashable, so it can key maps of per-node state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operator parameters as seen by the plan: an operator type plus a
/// one-line description (via `Display`).
pub trait Params: fmt::Display + Send + Sync {
    fn op_type(&self) -> &str;
}

/// A node that consumes blocks pushed from upstream.
pub trait OpNode: Send + Sync {
    fn process(&self, ctx: &QueryContext, id: NodeId, block: &dyn Block) -> Result<()>;
}

/// A node that maps one input block to one output block.
pub trait SimpleOpNode: Send + Sync {
    fn params(&self) -> &dyn Params;

    fn process_block(&self, ctx: &QueryContext, id: NodeId, block: &dyn Block) -> Result<Box<dyn Block>>;
}

/// Run a [`SimpleOpNode`] over `block` and forward the result downstream.
pub fn process_simple_block<N: SimpleOpNode + ?Sized>(
    node: &N,
    controller: &Controller,
    ctx: &QueryContext,
    id: NodeId,
    block: &dyn Block,
) -> Result<()> {
    let out = node.process_block(ctx, id, block)?;
    controller.process(ctx, out.as_ref())
}

/// Source of block builders for a node's output.
pub trait BlockBuilderFactory: Send + Sync {
    fn block_builder(
        &self,
        ctx: &QueryContext,
        meta: Metadata,
        series: Vec<SeriesMeta>,
    ) -> Result<Box<dyn BlockBuilder>>;
}

/// Builds in-memory [`ColumnBlock`](crate::block::ColumnBlock)s.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColumnBuilderFactory;

impl BlockBuilderFactory for ColumnBuilderFactory {
    fn block_builder(
        &self,
        _ctx: &QueryContext,
        meta: Metadata,
        series: Vec<SeriesMeta>,
    ) -> Result<Box<dyn BlockBuilder>> {
        Ok(Box::new(ColumnBlockBuilder::new(meta, series)))
    }
}

/// Per-node execution context: builder source, downstream nodes, metrics.
#[derive(Clone)]
pub struct Controller {
    id: NodeId,
    factory: Arc<dyn BlockBuilderFactory>,
    transforms: Vec<Arc<dyn OpNode>>,
    metrics: Option<MetricsCollector>,
}

impl Controller {
    /// A controller with in-memory builders and no downstream nodes.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            factory: Arc::new(ColumnBuilderFactory),
            transforms: Vec::new(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn BlockBuilderFactory>) -> Self {
        self.factory = factory;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn add_transform(&mut self, node: Arc<dyn OpNode>) {
        self.transforms.push(node);
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }

    pub fn block_builder(
        &self,
        ctx: &QueryContext,
        meta: Metadata,
        series: Vec<SeriesMeta>,
    ) -> Result<Box<dyn BlockBuilder>> {
        self.factory.block_builder(ctx, meta, series)
    }

    /// Push `block` to every downstream node, stopping at the first error.
    pub fn process(&self, ctx: &QueryContext, block: &dyn Block) -> Result<()> {
        for node in &self.transforms {
            node.process(ctx, self.id, block)?;
        }
        Ok(())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(NodeId::default())
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("transforms", &self.transforms.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
