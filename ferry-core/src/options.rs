use crate::{FieldSelection, FieldSelector};
use std::{
    ops::{BitOr, BitOrAssign},
    time::Duration,
};

/// Provider specific bulk copy switches, passed through untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyFlags(u32);

impl CopyFlags {
    pub const NONE: Self = Self(0);
    pub const KEEP_IDENTITY: Self = Self(1 << 0);
    pub const CHECK_CONSTRAINTS: Self = Self(1 << 1);
    pub const TABLE_LOCK: Self = Self(1 << 2);
    pub const KEEP_NULLS: Self = Self(1 << 3);
    pub const FIRE_TRIGGERS: Self = Self(1 << 4);
    pub const USE_INTERNAL_TRANSACTION: Self = Self(1 << 5);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for CopyFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CopyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Context wide defaults, every call site resolves its own options against them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub mapping_selector: FieldSelector,
    pub bulk_selector: FieldSelector,
    pub case_sensitive: bool,
    pub selection: FieldSelection,
    /// Zero leaves the batch size to the provider.
    pub batch_size: u32,
    pub timeout: Duration,
    pub streaming: bool,
    pub flags: CopyFlags,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            mapping_selector: FieldSelector::Destination,
            bulk_selector: FieldSelector::Source,
            case_sensitive: false,
            selection: FieldSelection::default(),
            batch_size: 0,
            timeout: Duration::from_secs(30),
            streaming: false,
            flags: CopyFlags::NONE,
        }
    }
}

/// Per call overrides for reading rows into records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MappingOptions {
    pub selector: Option<FieldSelector>,
    pub case_sensitive: Option<bool>,
    pub selection: Option<FieldSelection>,
}

/// Mapping options after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveMapping {
    pub selector: FieldSelector,
    pub case_sensitive: bool,
    pub selection: FieldSelection,
}

impl Default for EffectiveMapping {
    fn default() -> Self {
        MappingOptions::default().resolve(&Defaults::default())
    }
}

impl MappingOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn selector(mut self, selector: FieldSelector) -> Self {
        self.selector = Some(selector);
        self
    }
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }
    pub fn selection(mut self, selection: FieldSelection) -> Self {
        self.selection = Some(selection);
        self
    }
    pub fn resolve(&self, defaults: &Defaults) -> EffectiveMapping {
        EffectiveMapping {
            selector: self.selector.unwrap_or(defaults.mapping_selector),
            case_sensitive: self.case_sensitive.unwrap_or(defaults.case_sensitive),
            selection: self.selection.unwrap_or(defaults.selection),
        }
    }
}

/// Per call overrides for a bulk transfer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkCopyOptions {
    pub selector: Option<FieldSelector>,
    pub case_sensitive: Option<bool>,
    /// Explicit source column names, the cursor metadata is used otherwise.
    pub columns: Option<Vec<String>>,
    pub create_table: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub batch_size: Option<u32>,
    pub timeout: Option<Duration>,
    pub streaming: Option<bool>,
    pub flags: Option<CopyFlags>,
}

/// Bulk copy options after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveBulkCopy {
    pub selector: FieldSelector,
    pub case_sensitive: bool,
    pub columns: Option<Vec<String>>,
    pub create_table: bool,
    pub if_not_exists: bool,
    pub batch_size: u32,
    pub timeout: Duration,
    pub streaming: bool,
    pub flags: CopyFlags,
}

impl Default for EffectiveBulkCopy {
    fn default() -> Self {
        BulkCopyOptions::default().resolve(&Defaults::default())
    }
}

impl BulkCopyOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn selector(mut self, selector: FieldSelector) -> Self {
        self.selector = Some(selector);
        self
    }
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
    pub fn create_table(mut self, if_not_exists: bool) -> Self {
        self.create_table = Some(true);
        self.if_not_exists = Some(if_not_exists);
        self
    }
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }
    pub fn flags(mut self, flags: CopyFlags) -> Self {
        self.flags = Some(flags);
        self
    }
    pub fn resolve(&self, defaults: &Defaults) -> EffectiveBulkCopy {
        EffectiveBulkCopy {
            selector: self.selector.unwrap_or(defaults.bulk_selector),
            case_sensitive: self.case_sensitive.unwrap_or(defaults.case_sensitive),
            columns: self.columns.clone(),
            create_table: self.create_table.unwrap_or(false),
            if_not_exists: self.if_not_exists.unwrap_or(true),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            streaming: self.streaming.unwrap_or(defaults.streaming),
            flags: self.flags.unwrap_or(defaults.flags),
        }
    }
}
