use std::collections::BTreeMap;

use crate::input::ObservationTable;

/// Rows owned by one entity, in time order. Row sets of distinct partitions
/// never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub entity: String,
    pub rows: Vec<usize>,
}

/// Groups rows by entity id (ascending), then stable-sorts each group by
/// date with missing dates last.
pub fn partition_by_entity(table: &ObservationTable) -> Vec<Partition> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, entity) in table.entity.iter().enumerate() {
        groups.entry(entity.as_str()).or_default().push(row);
    }

    let partitions: Vec<Partition> = groups
        .into_iter()
        .map(|(entity, mut rows)| {
            rows.sort_by_key(|&r| (table.dates[r].is_none(), table.dates[r]));
            Partition {
                entity: entity.to_string(),
                rows,
            }
        })
        .collect();

    tracing::info!(entities = partitions.len(), "partitioned rows by entity");
    partitions
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_partition.rs"]
mod tests;
