//! Partitioning series into groups by their tags.

use std::collections::HashMap;

use crate::block::{Metadata, SeriesMeta};
use crate::models::Tags;

/// Merge the block's common tags into every series' tags. Tags already on a
/// series win over common tags of the same name.
pub fn flatten_metadata(meta: &Metadata, series_metas: &[SeriesMeta]) -> Vec<SeriesMeta> {
    if meta.tags.is_empty() {
        return series_metas.to_vec();
    }
    series_metas
        .iter()
        .map(|s| SeriesMeta::new(s.name.clone(), s.tags.merged_under(&meta.tags)))
        .collect()
}

/// Partition series indices into groups.
///
/// With `without == false` the group key is each series' tags restricted to
/// `matching_tags`; with `without == true` it is the series' tags minus
/// `matching_tags` and minus the metric name. Groups appear in order of the
/// first series carrying their key and list indices in ascending order.
///
/// The second result holds one meta per group, named `discriminator` and
/// tagged with the group key.
pub fn group_series<S: AsRef<str>>(
    matching_tags: &[S],
    without: bool,
    discriminator: &str,
    metas: &[SeriesMeta],
) -> (Vec<Vec<usize>>, Vec<SeriesMeta>) {
    let key_tags = |tags: &Tags| {
        if without {
            tags.without_keys(matching_tags).without_name()
        } else {
            tags.with_keys(matching_tags)
        }
    };

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    let mut group_metas: Vec<SeriesMeta> = Vec::new();

    for (idx, meta) in metas.iter().enumerate() {
        let tags = key_tags(&meta.tags);
        match positions.get(&tags.id()) {
            Some(&pos) => buckets[pos].push(idx),
            None => {
                positions.insert(tags.id(), buckets.len());
                buckets.push(vec![idx]);
                group_metas.push(SeriesMeta::new(discriminator, tags));
            }
        }
    }

    (buckets, group_metas)
}

/// Size of the largest group, or zero when there are none.
pub fn max_series_count(buckets: &[Vec<usize>]) -> usize {
    buckets.iter().map(Vec::len).max().unwrap_or(0)
}
