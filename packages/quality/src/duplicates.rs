//! Duplicate detection over a batch of records.

use std::collections::HashMap;

use quarry_core::{BusinessRecord, DuplicateGroup};

/// Groups keyed by first appearance, so output order follows input order.
#[derive(Default)]
struct OrderedGroups {
    index: HashMap<String, usize>,
    groups: Vec<Vec<String>>,
}

impl OrderedGroups {
    fn push(&mut self, key: String, place_id: &str) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].push(place_id.to_string()),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(vec![place_id.to_string()]);
            }
        }
    }

    fn into_duplicates(self) -> impl Iterator<Item = Vec<String>> {
        self.groups.into_iter().filter(|ids| ids.len() > 1)
    }
}

/// Find records that describe the same business.
///
/// Two independent passes: records sharing a place id, then records sharing
/// a case-insensitive name + full address. A name/address group is only
/// reported when its members differ from a group already reported, so a
/// place id can show up once per strategy. Records without a place id
/// cannot be referenced in a group and are skipped.
pub fn find_duplicates<'a, I>(records: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = &'a BusinessRecord>,
{
    let mut by_place_id = OrderedGroups::default();
    let mut by_name_address = OrderedGroups::default();

    for record in records {
        let Some(place_id) = record.place_id() else {
            tracing::debug!(
                "Skipping record without place id in duplicate check: {:?}",
                record.business_name
            );
            continue;
        };

        by_place_id.push(place_id.to_string(), place_id);

        let name = soft_key_part(&record.business_name);
        let address = soft_key_part(&record.full_address);
        if !name.is_empty() && !address.is_empty() {
            by_name_address.push(format!("{}|{}", name, address), place_id);
        }
    }

    let mut duplicates: Vec<Vec<String>> = by_place_id.into_duplicates().collect();
    for ids in by_name_address.into_duplicates() {
        if !duplicates.contains(&ids) {
            duplicates.push(ids);
        }
    }

    duplicates.into_iter().map(DuplicateGroup).collect()
}

fn soft_key_part(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_lowercase()
}
