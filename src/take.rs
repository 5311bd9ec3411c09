//! Top-k / bottom-k take functions and the operator descriptor.
//!
//! Unlike regular aggregations, take does not collapse each group into a
//! single series. Over a range it keeps the series set intact and blanks out
//! (sets to NaN) every value that is not among the `k` most extreme of its
//! group at that step. At an instant it emits a new, shorter series list
//! ordered by extremity within each group.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::block::SeriesMeta;
use crate::error::{Error, Result};
use crate::heap::{FloatHeap, HeapOrder};
use crate::node::TakeNode;
use crate::transform::{Controller, Params};

/// Gathers the largest k non-NaN values in each group.
pub const TOP_K_TYPE: &str = "topk";
/// Gathers the smallest k non-NaN values in each group.
pub const BOTTOM_K_TYPE: &str = "bottomk";

/// The two take operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TakeKind {
    TopK,
    BottomK,
}

impl TakeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TakeKind::TopK => TOP_K_TYPE,
            TakeKind::BottomK => BOTTOM_K_TYPE,
        }
    }

    pub fn heap_order(self) -> HeapOrder {
        match self {
            TakeKind::TopK => HeapOrder::KeepLargest,
            TakeKind::BottomK => HeapOrder::KeepSmallest,
        }
    }
}

impl FromStr for TakeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            TOP_K_TYPE => Ok(TakeKind::TopK),
            BOTTOM_K_TYPE => Ok(TakeKind::BottomK),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for TakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an aggregation node as they come out of the query parser.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    /// Tags that define the groups (or, with `without`, that are ignored).
    pub matching_tags: Vec<String>,
    pub without: bool,
    /// Numeric argument; `k` for take operators.
    pub parameter: f64,
    pub string_parameter: String,
}

impl NodeParams {
    pub fn with_k(k: i64) -> Self {
        Self { parameter: k as f64, ..Self::default() }
    }

    #[must_use]
    pub fn by<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.matching_tags = tags.into_iter().map(Into::into).collect();
        self.without = false;
        self
    }

    #[must_use]
    pub fn without<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.matching_tags = tags.into_iter().map(Into::into).collect();
        self.without = true;
        self
    }
}

/// A retained value together with the identity of its series.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueAndMeta {
    pub val: f64,
    pub series_meta: SeriesMeta,
}

/// Which take algorithm an operator runs, fixed when the operator is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TakeStrategy {
    /// `k <= 0`: nothing survives.
    None,
    /// `k >= 1`: keep the k most extreme values per group.
    K,
}

impl TakeStrategy {
    pub fn for_k(k: i64) -> Self {
        if k < 1 { TakeStrategy::None } else { TakeStrategy::K }
    }

    /// Range take over one step. Overwrites `values` in place.
    pub fn take(self, heap: &mut FloatHeap, values: &mut [f64], buckets: &[Vec<usize>]) {
        match self {
            TakeStrategy::None => take_none(values),
            TakeStrategy::K => take_fn(heap, values, buckets),
        }
    }

    /// Instant take over the final step.
    pub fn take_instant(
        self,
        heap: &mut FloatHeap,
        values: &[f64],
        buckets: &[Vec<usize>],
        metas: &[SeriesMeta],
    ) -> Vec<ValueAndMeta> {
        match self {
            TakeStrategy::None => take_instant_none(values, metas),
            TakeStrategy::K => take_instant_fn(heap, values, buckets, metas),
        }
    }
}

/// Shortcut when taking `k <= 0` values: every value becomes NaN.
pub fn take_none(values: &mut [f64]) {
    values.fill(f64::NAN);
}

/// Shortcut when taking `k <= 0` values at an instant: one NaN per series,
/// each keeping its original identity.
pub fn take_instant_none(values: &[f64], metas: &[SeriesMeta]) -> Vec<ValueAndMeta> {
    metas
        .iter()
        .take(values.len())
        .map(|meta| ValueAndMeta { val: f64::NAN, series_meta: meta.clone() })
        .collect()
}

/// Keep, in each group larger than the heap's capacity, only the values the
/// heap retains; every other position in the group becomes NaN. Groups that
/// fit in the heap are left untouched.
pub fn take_fn(heap: &mut FloatHeap, values: &mut [f64], buckets: &[Vec<usize>]) {
    let capacity = heap.capacity();
    for bucket in buckets {
        if bucket.len() <= capacity {
            continue;
        }

        // Move the group into the heap, clearing it from the vector.
        for &idx in bucket {
            let val = values[idx];
            if !val.is_nan() {
                heap.push(val, idx);
            }
            values[idx] = f64::NAN;
        }

        for pair in heap.flush() {
            values[pair.index] = pair.val;
        }
    }
}

/// Build the ordered instant result: for each group in partition order, its
/// retained values from most to least extreme, each paired with its series.
pub fn take_instant_fn(
    heap: &mut FloatHeap,
    values: &[f64],
    buckets: &[Vec<usize>],
    metas: &[SeriesMeta],
) -> Vec<ValueAndMeta> {
    let mut result = Vec::new();
    for bucket in buckets {
        for &idx in bucket {
            heap.push(values[idx], idx);
        }

        result.extend(heap.ordered_flush().into_iter().map(|pair| ValueAndMeta {
            val: pair.val,
            series_meta: metas[pair.index].clone(),
        }));
    }
    result
}

/// Immutable take operator descriptor, built once per query-plan node.
#[derive(Clone, Debug)]
pub struct TakeOp {
    params: NodeParams,
    op_type: String,
    k: i64,
    strategy: TakeStrategy,
}

impl TakeOp {
    /// Build a take operator. `k` is `params.parameter` truncated toward zero.
    ///
    /// The operator type is checked when a block is processed, not here.
    pub fn new(op_type: impl Into<String>, params: NodeParams) -> Self {
        let k = params.parameter as i64;
        Self { strategy: TakeStrategy::for_k(k), params, op_type: op_type.into(), k }
    }

    pub fn top_k(params: NodeParams) -> Self {
        Self::new(TOP_K_TYPE, params)
    }

    pub fn bottom_k(params: NodeParams) -> Self {
        Self::new(BOTTOM_K_TYPE, params)
    }

    /// Build a take operator from JSON-encoded [`NodeParams`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `json` is not valid node params.
    pub fn from_json(op_type: impl Into<String>, json: &str) -> Result<Self> {
        let params: NodeParams = serde_json::from_str(json)?;
        Ok(Self::new(op_type, params))
    }

    pub fn params(&self) -> &NodeParams {
        &self.params
    }

    pub fn k(&self) -> i64 {
        self.k
    }

    pub fn strategy(&self) -> TakeStrategy {
        self.strategy
    }

    /// Resolve the operator type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperator`] for anything but `topk`/`bottomk`.
    pub fn kind(&self) -> Result<TakeKind> {
        self.op_type.parse()
    }

    /// Create the execution node for this operator.
    pub fn node(&self, controller: Controller) -> TakeNode {
        TakeNode::new(self.clone(), controller)
    }
}

impl Params for TakeOp {
    fn op_type(&self) -> &str {
        &self.op_type
    }
}

impl fmt::Display for TakeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type: {}", self.op_type)
    }
}
