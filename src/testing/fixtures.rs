//! Pre-built series sets for common take scenarios.

use crate::block::ColumnBlock;
use crate::error::Result;
use crate::testing::BlockFixture;

/// Start of every fixture block, in milliseconds.
pub const FIXTURE_START: i64 = 1_600_000_000_000;
/// Step size of every fixture block: 10 seconds.
pub const FIXTURE_STEP: i64 = 10_000;

/// Eight `cpu` series, four per datacenter, over three steps.
///
/// | idx | dc   | host | values               |
/// |-----|------|------|----------------------|
/// | 0   | east | a    | 10, 50, NaN          |
/// | 1   | west | b    | 20, 40, 7            |
/// | 2   | east | c    | 30, NaN, 8           |
/// | 3   | west | d    | 40, 20, 9            |
/// | 4   | east | e    | 50, 10, 1            |
/// | 5   | west | f    | 60, 30, 2            |
/// | 6   | east | g    | 70, 60, NaN          |
/// | 7   | west | h    | 80, 5, 3             |
///
/// # Errors
///
/// Never fails in practice; returns the builder's result.
pub fn cpu_by_dc() -> Result<ColumnBlock> {
    let nan = f64::NAN;
    BlockFixture::new(FIXTURE_START, FIXTURE_STEP)
        .named_series("cpu", &[("dc", "east"), ("host", "a")], &[10.0, 50.0, nan])
        .named_series("cpu", &[("dc", "west"), ("host", "b")], &[20.0, 40.0, 7.0])
        .named_series("cpu", &[("dc", "east"), ("host", "c")], &[30.0, nan, 8.0])
        .named_series("cpu", &[("dc", "west"), ("host", "d")], &[40.0, 20.0, 9.0])
        .named_series("cpu", &[("dc", "east"), ("host", "e")], &[50.0, 10.0, 1.0])
        .named_series("cpu", &[("dc", "west"), ("host", "f")], &[60.0, 30.0, 2.0])
        .named_series("cpu", &[("dc", "east"), ("host", "g")], &[70.0, 60.0, nan])
        .named_series("cpu", &[("dc", "west"), ("host", "h")], &[80.0, 5.0, 3.0])
        .build()
}

/// One step, four series `m0..m3` in a single group with values
/// `[5, NaN, 9, 1]`.
///
/// # Errors
///
/// Never fails in practice; returns the builder's result.
pub fn four_series_single_step() -> Result<ColumnBlock> {
    BlockFixture::new(FIXTURE_START, FIXTURE_STEP)
        .named_series("m", &[("id", "m0")], &[5.0])
        .named_series("m", &[("id", "m1")], &[f64::NAN])
        .named_series("m", &[("id", "m2")], &[9.0])
        .named_series("m", &[("id", "m3")], &[1.0])
        .build()
}
