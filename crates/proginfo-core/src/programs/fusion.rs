//! Merging of duplicate uninstall entries.

use super::record::ProgramRecord;
use crate::registry::path;
use std::collections::HashMap;
use tracing::debug;

/// Collapse records sharing a display name into one record per name.
///
/// Records without a display name are dropped. For each name, the first
/// record is kept and its unknown fields are filled from the others, in
/// order, skipping entries that live under the same parent key as the
/// first one (re-reads of one location rather than distinct registrations).
/// Output follows first-seen order.
pub fn fuse_all_duplicates(records: Vec<ProgramRecord>) -> Vec<ProgramRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ProgramRecord>> = HashMap::new();

    for record in records {
        let Some(name) = record.name().map(str::to_string) else {
            debug!("Dropping entry without display name: {}", record.reg_key);
            continue;
        };
        groups
            .entry(name.clone())
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .filter_map(|name| groups.remove(&name))
        .filter_map(fuse_duplicates)
        .collect()
}

fn fuse_duplicates(group: Vec<ProgramRecord>) -> Option<ProgramRecord> {
    let mut members = group.into_iter();
    let mut target = members.next()?;
    let target_parent = path::parent(&target.reg_key).map(str::to_string);

    for member in members {
        if path::parent(&member.reg_key).map(str::to_string) == target_parent {
            continue;
        }
        debug!("Fusing {} into {}", member.reg_key, target.reg_key);
        target.fill_unknown_from(&member);
    }
    Some(target)
}
