use anyhow::Result;
use blocktake::testing::*;
use blocktake::{
    Block, Controller, FloatHeap, HeapOrder, NodeId, NodeParams, QueryContext, TakeOp, TakeStrategy,
};

const NAN: f64 = f64::NAN;

fn run_range(op: &TakeOp, block: &dyn Block) -> Result<Vec<Vec<f64>>> {
    let node = op.node(Controller::default());
    let out = node.process_block(&QueryContext::range(), NodeId::new(7), block)?;
    Ok(read_rows(out.as_ref())?)
}

#[test]
fn top_k_keeps_two_largest_and_skips_missing() {
    let mut heap = FloatHeap::new(HeapOrder::KeepLargest, 2);
    let mut values = vec![5.0, NAN, 9.0, 1.0];
    TakeStrategy::K.take(&mut heap, &mut values, &[vec![0, 1, 2, 3]]);
    assert_values_eq(&values, &[5.0, NAN, 9.0, NAN]);
}

#[test]
fn bottom_k_keeps_smallest() {
    let mut heap = FloatHeap::new(HeapOrder::KeepSmallest, 1);
    let mut values = vec![5.0, NAN, 9.0, 1.0];
    TakeStrategy::K.take(&mut heap, &mut values, &[vec![0, 1, 2, 3]]);
    assert_values_eq(&values, &[NAN, NAN, NAN, 1.0]);
}

#[test]
fn take_none_blanks_everything() {
    let mut heap = FloatHeap::new(HeapOrder::KeepLargest, 0);
    let mut values = vec![5.0, NAN, 9.0, 1.0];
    TakeStrategy::None.take(&mut heap, &mut values, &[vec![0, 1], vec![2, 3]]);
    assert_eq!(count_present(&values), 0);
    assert_eq!(values.len(), 4);
}

#[test]
fn heap_is_reused_across_groups() {
    let mut heap = FloatHeap::new(HeapOrder::KeepLargest, 1);
    let mut values = vec![1.0, 2.0, 3.0, 6.0, 5.0, 4.0];
    TakeStrategy::K.take(&mut heap, &mut values, &[vec![0, 1, 2], vec![3, 4, 5]]);
    assert_values_eq(&values, &[NAN, NAN, 3.0, 6.0, NAN, NAN]);
    assert!(heap.is_empty());
}

#[test]
fn group_with_only_missing_values_stays_missing() {
    let mut heap = FloatHeap::new(HeapOrder::KeepLargest, 1);
    let mut values = vec![NAN, NAN, NAN];
    TakeStrategy::K.take(&mut heap, &mut values, &[vec![0, 1, 2]]);
    assert_values_eq(&values, &[NAN, NAN, NAN]);
}

#[test]
fn node_top_k_by_dc() -> Result<()> {
    let block = cpu_by_dc()?;
    let op = TakeOp::top_k(NodeParams::with_k(2).by(["dc"]));
    let rows = run_range(&op, &block)?;

    // step 0: east {10,30,50,70} -> 50,70; west {20,40,60,80} -> 60,80
    // step 1: east {50,NaN,10,60} -> 50,60; west {40,20,30,5} -> 40,30
    // step 2: east {NaN,8,1,NaN} -> 8,1;   west {7,9,2,3} -> 7,9
    assert_rows_eq(
        &rows,
        &[
            vec![NAN, 50.0, NAN],
            vec![NAN, 40.0, 7.0],
            vec![NAN, NAN, 8.0],
            vec![NAN, NAN, 9.0],
            vec![50.0, NAN, 1.0],
            vec![60.0, 30.0, NAN],
            vec![70.0, 60.0, NAN],
            vec![80.0, NAN, NAN],
        ],
    );
    Ok(())
}

#[test]
fn node_bottom_k_without_host() -> Result<()> {
    let block = cpu_by_dc()?;
    let op = TakeOp::bottom_k(NodeParams::with_k(1).without(["host"]));
    let rows = run_range(&op, &block)?;

    assert_rows_eq(
        &rows,
        &[
            vec![10.0, NAN, NAN],
            vec![20.0, NAN, NAN],
            vec![NAN, NAN, NAN],
            vec![NAN, NAN, NAN],
            vec![NAN, 10.0, 1.0],
            vec![NAN, NAN, 2.0],
            vec![NAN, NAN, NAN],
            vec![NAN, 5.0, NAN],
        ],
    );
    Ok(())
}

#[test]
fn groups_no_larger_than_k_pass_through() -> Result<()> {
    let block = cpu_by_dc()?;
    let op = TakeOp::top_k(NodeParams::with_k(4).by(["dc"]));
    let rows = run_range(&op, &block)?;

    for (i, row) in rows.iter().enumerate() {
        assert_values_eq(row, &block.series_values(i));
    }
    Ok(())
}

#[test]
fn k_larger_than_every_group_is_identity() -> Result<()> {
    let block = cpu_by_dc()?;
    let op = TakeOp::bottom_k(NodeParams::with_k(100));
    let rows = run_range(&op, &block)?;

    for (i, row) in rows.iter().enumerate() {
        assert_values_eq(row, &block.series_values(i));
    }
    Ok(())
}

#[test]
fn zero_k_range_output_is_all_missing() -> Result<()> {
    let block = cpu_by_dc()?;
    for k in [0, -2] {
        let rows = run_range(&TakeOp::top_k(NodeParams::with_k(k)), &block)?;
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|row| count_present(row) == 0));
    }
    Ok(())
}

#[test]
fn range_output_keeps_series_and_bounds() -> Result<()> {
    let block = cpu_by_dc()?;
    let node = TakeOp::top_k(NodeParams::with_k(1)).node(Controller::default());
    let out = node.process_block(&QueryContext::range(), NodeId::new(1), &block)?;

    assert_eq!(out.series_meta(), block.series_meta());
    assert_eq!(out.meta().bounds, block.meta().bounds);
    assert!(!out.meta().result_metadata.keep_nans);
    Ok(())
}

#[test]
fn range_take_is_deterministic() -> Result<()> {
    let block = cpu_by_dc()?;
    let op = TakeOp::top_k(NodeParams::with_k(3).by(["dc"]));
    let first = run_range(&op, &block)?;
    for _ in 0..5 {
        assert_rows_eq(&run_range(&op, &block)?, &first);
    }
    Ok(())
}

#[test]
fn common_block_tags_take_part_in_grouping() -> Result<()> {
    let block = BlockFixture::new(0, 10)
        .common_tag("dc", "east")
        .series(&[("host", "a")], &[1.0])
        .series(&[("host", "b")], &[2.0])
        .series(&[("host", "c")], &[3.0])
        .build()?;
    let op = TakeOp::top_k(NodeParams::with_k(1).by(["dc"]));
    let rows = run_range(&op, &block)?;
    assert_rows_eq(&rows, &[vec![NAN], vec![NAN], vec![3.0]]);
    Ok(())
}
