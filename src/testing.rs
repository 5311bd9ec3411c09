//! Testing utilities for take nodes.
//!
//! Helpers for building input blocks and checking what a node produced.
//! NaN marks a missing value throughout:
//!
//! - **Builders**: [`BlockFixture`] assembles a [`ColumnBlock`](crate::block::ColumnBlock)
//!   row by row (one row per series)
//! - **Fixtures**: ready-made series sets such as [`cpu_by_dc`]
//! - **Assertions**: NaN-aware comparisons like [`assert_values_eq`]
//! - **Nodes and blocks**: [`CollectingNode`] records what a node forwards
//!   downstream; [`FailingBlock`] injects an iteration error
//!
//! # Quick Start
//!
//! ```
//! use blocktake::testing::*;
//! use blocktake::*;
//!
//! # fn main() -> blocktake::Result<()> {
//! let block = BlockFixture::new(0, 10)
//!     .series(&[("host", "a")], &[5.0, 1.0])
//!     .series(&[("host", "b")], &[3.0, 4.0])
//!     .build()?;
//!
//! let node = TakeOp::top_k(NodeParams::with_k(1)).node(Controller::default());
//! let out = node.process_block(&QueryContext::range(), NodeId::new(1), &block)?;
//!
//! assert_rows_eq(&read_rows(out.as_ref())?, &[vec![5.0, f64::NAN], vec![f64::NAN, 4.0]]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
