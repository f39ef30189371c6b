use crate::{MappingError, MismatchSide, Result, fold_name};
use std::{borrow::Cow, collections::HashMap};

/// Which side of a name join must be fully covered by the other.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSelector {
    /// Every source name must exist in the destination.
    Source,
    /// Every destination name must exist in the source.
    #[default]
    Destination,
    /// No check, only the intersection is used.
    Common,
    /// Both `Source` and `Destination`.
    Both,
}

/// Outcome of joining source and destination names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Matched `(source_name, dest_name)` pairs, in source order.
    pub matched: Vec<(String, String)>,
    /// Matched `(source_index, dest_index)` pairs, aligned with `matched`.
    pub positions: Vec<(usize, usize)>,
    pub source_count: usize,
    pub dest_count: usize,
    pub matched_count: usize,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

fn index_names<'a>(
    names: &'a [impl AsRef<str>],
    case_sensitive: bool,
    side: MismatchSide,
) -> Result<HashMap<Cow<'a, str>, usize>> {
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if index
            .insert(fold_name(name.as_ref(), case_sensitive), i)
            .is_some()
        {
            return Err(MappingError::DuplicateName {
                side,
                name: name.as_ref().to_string(),
            }
            .into());
        }
    }
    Ok(index)
}

/// Join `source` and `dest` by name and enforce `selector` on the result.
///
/// Duplicate names on either side (after lowercasing when `case_sensitive` is false)
/// fail before anything is matched.
pub fn reconcile(
    selector: FieldSelector,
    source: &[impl AsRef<str>],
    dest: &[impl AsRef<str>],
    case_sensitive: bool,
) -> Result<Reconciliation> {
    index_names(source, case_sensitive, MismatchSide::Source)?;
    let dest_index = index_names(dest, case_sensitive, MismatchSide::Destination)?;
    let mut result = Reconciliation {
        source_count: source.len(),
        dest_count: dest.len(),
        ..Default::default()
    };
    for (i, name) in source.iter().enumerate() {
        let name = name.as_ref();
        if let Some(&j) = dest_index.get(&fold_name(name, case_sensitive)) {
            result.matched.push((name.to_string(), dest[j].as_ref().to_string()));
            result.positions.push((i, j));
        }
    }
    result.matched_count = result.matched.len();
    check(
        selector,
        result.source_count,
        result.dest_count,
        result.matched_count,
    )?;
    Ok(result)
}

/// Fail with [`MappingError::FieldSelectionMismatch`] when `selector` is not satisfied.
pub fn check(
    selector: FieldSelector,
    source_count: usize,
    dest_count: usize,
    matched_count: usize,
) -> Result<()> {
    let side = match selector {
        FieldSelector::Source | FieldSelector::Both if source_count != matched_count => {
            MismatchSide::Source
        }
        FieldSelector::Destination | FieldSelector::Both if dest_count != matched_count => {
            MismatchSide::Destination
        }
        _ => return Ok(()),
    };
    Err(MappingError::FieldSelectionMismatch {
        side,
        source_count,
        dest_count,
        matched_count,
    }
    .into())
}
