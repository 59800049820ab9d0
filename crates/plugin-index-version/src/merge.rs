use crate::compare::is_later;
use plugin_index_types::PluginRecord;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Reduce records to one per name, keeping the latest version.
///
/// A record replaces an earlier one with the same name only when its version
/// is strictly later, so equal versions keep the first one seen. Records with
/// a blank name are dropped. The result is sorted by name.
pub fn keep_latest(records: impl IntoIterator<Item = PluginRecord>) -> Vec<PluginRecord> {
    let mut by_name: BTreeMap<String, PluginRecord> = BTreeMap::new();

    for record in records {
        if record.name().trim().is_empty() {
            debug!("Dropping plugin without a name from {}", record.location());
            continue;
        }

        match by_name.entry(record.name().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if is_later(record.version(), slot.get().version()) {
                    debug!(
                        "Replacing {} with {} from {}",
                        slot.get(),
                        record,
                        record.location()
                    );
                    slot.insert(record);
                }
            }
        }
    }

    by_name.into_values().collect()
}
