//! Line collection replacement
//!
//! A replace payload carries the full line list. Lines with an id that belongs
//! to the header are updated in place, lines without an id are inserted, and
//! stored lines the payload no longer mentions are deleted.

use std::collections::HashSet;

use uuid::Uuid;

use crate::validation::ValidationCode;

/// How a payload line list maps onto the stored one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDiff {
    /// Payload positions of lines to update in place, with their stored id
    pub update: Vec<(usize, Uuid)>,
    /// Payload positions of new lines
    pub insert: Vec<usize>,
    /// Stored line ids absent from the payload
    pub delete: Vec<Uuid>,
}

/// Compare stored line ids with the ids carried by the payload.
///
/// Fails with `UnknownLine` when the payload references a line that is not
/// stored under this header, or references the same line twice.
pub fn diff_lines<I>(stored: &[Uuid], payload: I) -> Result<LineDiff, ValidationCode>
where
    I: IntoIterator<Item = Option<Uuid>>,
{
    let stored_set: HashSet<Uuid> = stored.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut diff = LineDiff::default();

    for (index, id) in payload.into_iter().enumerate() {
        match id {
            Some(id) => {
                if !stored_set.contains(&id) || !seen.insert(id) {
                    return Err(ValidationCode::UnknownLine);
                }
                diff.update.push((index, id));
            }
            None => diff.insert.push(index),
        }
    }

    diff.delete = stored
        .iter()
        .copied()
        .filter(|id| !seen.contains(id))
        .collect();

    Ok(diff)
}
