use crate::{AsValue, Error, Result, Row, Value, fold_name};
use std::{
    any::{self, Any, TypeId},
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Debug},
    marker::PhantomData,
    ops::{BitOr, BitOrAssign},
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

/// Which members of a record take part in a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSelection(u8);

impl FieldSelection {
    /// Struct fields.
    pub const DATA: Self = Self(0b001);
    /// Members exposed through getter (and optionally setter) functions.
    pub const ACCESSORS: Self = Self(0b010);
    /// Collection typed members, excluded unless requested because they do not fit a cell.
    pub const SEQUENCES: Self = Self(0b100);
    pub const ALL: Self = Self(0b111);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self::DATA.union(Self::ACCESSORS)
    }
}

impl BitOr for FieldSelection {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for FieldSelection {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Data,
    Accessor,
}

pub type Getter<T> = fn(&T) -> Value;
pub type Setter<T> = fn(&mut T, Value) -> Result<()>;

/// A bindable member of `T`: name, declared type, and how to read and write it.
pub struct FieldDescriptor<T> {
    pub name: Cow<'static, str>,
    /// Declared type prototype.
    pub value: Value,
    pub nullable: bool,
    pub member: MemberKind,
    pub sequence: bool,
    pub enumeration: bool,
    /// Argument index in [`Record::construct`], data members only.
    pub position: Option<usize>,
    pub getter: Getter<T>,
    pub setter: Option<Setter<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn new(name: impl Into<Cow<'static, str>>, value: Value, getter: Getter<T>) -> Self {
        Self {
            name: name.into(),
            value,
            nullable: false,
            member: MemberKind::Data,
            sequence: false,
            enumeration: false,
            position: None,
            getter,
            setter: None,
        }
    }
    pub fn with_setter(mut self, setter: Setter<T>) -> Self {
        self.setter = Some(setter);
        self
    }
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
    pub fn with_member(mut self, member: MemberKind) -> Self {
        self.member = member;
        self
    }
    pub fn with_sequence(mut self, sequence: bool) -> Self {
        self.sequence = sequence;
        self
    }
    pub fn with_enumeration(mut self, enumeration: bool) -> Self {
        self.enumeration = enumeration;
        self
    }
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn get(&self, item: &T) -> Value {
        (self.getter)(item)
    }
    pub fn is_null(&self, item: &T) -> bool {
        self.get(item).is_null()
    }
    pub fn set(&self, item: &mut T, value: Value) -> Result<()> {
        let Some(setter) = self.setter else {
            return Err(crate::MappingError::ReadOnlyField(self.name.to_string()).into());
        };
        setter(item, value)
    }
    fn selected(&self, selection: FieldSelection) -> bool {
        let member = match self.member {
            MemberKind::Data => FieldSelection::DATA,
            MemberKind::Accessor => FieldSelection::ACCESSORS,
        };
        selection.contains(member)
            && (!self.sequence || selection.contains(FieldSelection::SEQUENCES))
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.clone(),
            nullable: self.nullable,
            member: self.member,
            sequence: self.sequence,
            enumeration: self.enumeration,
            position: self.position,
            getter: self.getter,
            setter: self.setter,
        }
    }
}

impl<T> Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("nullable", &self.nullable)
            .field("member", &self.member)
            .field("sequence", &self.sequence)
            .field("enumeration", &self.enumeration)
            .field("position", &self.position)
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// A type whose members can be bound to columns, usually implemented with `#[derive(Record)]`.
pub trait Record: Sized + Send + 'static {
    /// Default destination table.
    fn table_name() -> &'static str;
    /// Every member, data members first in declaration order, then accessors.
    fn descriptors() -> &'static [FieldDescriptor<Self>];
    /// Designated constructor, one argument per data member in declaration order.
    fn construct(args: Row) -> Result<Self>;

    fn catalog(selection: FieldSelection) -> Arc<Catalog<Self>> {
        Catalog::of(selection)
    }
}

/// Fieldless enum stored by name or by discriminant, usually implemented with `#[derive(ValueEnum)]`.
pub trait ValueEnum: Sized {
    const NAMES: &'static [&'static str];
    fn name(&self) -> &'static str;
    fn discriminant(&self) -> i64;
    fn from_name(name: &str) -> Option<Self>;
    fn from_discriminant(value: i64) -> Option<Self>;
}

/// Parse an enum from its name or from its underlying numeric representation.
pub fn enum_from_value<E: ValueEnum>(value: Value) -> Result<E> {
    let parsed = match &value {
        Value::Varchar(Some(v)) => {
            let v = v.trim();
            E::from_name(v)
                .or_else(|| {
                    let name = E::NAMES.iter().find(|name| name.eq_ignore_ascii_case(v))?;
                    E::from_name(name)
                })
                .or_else(|| i64::parse(v).ok().and_then(E::from_discriminant))
        }
        v if !v.is_null() => i64::try_from_value(value.clone())
            .ok()
            .and_then(E::from_discriminant),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::msg(format!(
            "`{}` is not a member of {} (expected one of: {})",
            match &value {
                Value::Varchar(Some(v)) => v.clone(),
                v => format!("{v:?}"),
            },
            any::type_name::<E>(),
            E::NAMES.join(", ")
        ))
    })
}

/// Converts a designated constructor argument into the parameter type.
///
/// A null becomes `T::default()` when `T` has a default, the inherent `take` is picked over
/// [`ArgFallback::take`] in that case. Otherwise the conversion rules of `T` apply.
pub struct ArgFactory<T>(PhantomData<T>);

impl<T: AsValue + Default> ArgFactory<T> {
    pub fn take(value: Value) -> Result<T> {
        if value.is_null() {
            return Ok(T::default());
        }
        T::try_from_value(value)
    }
}

pub trait ArgFallback<T> {
    fn take(value: Value) -> Result<T>;
}

impl<T: AsValue> ArgFallback<T> for ArgFactory<T> {
    fn take(value: Value) -> Result<T> {
        T::try_from_value(value)
    }
}

/// Ordered list of the bindable fields of `T` for one selection mode.
pub struct Catalog<T: 'static> {
    selection: FieldSelection,
    fields: Box<[FieldDescriptor<T>]>,
}

type Registry = HashMap<(TypeId, FieldSelection), Arc<dyn Any + Send + Sync>>;
static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(Default::default);

impl<T: Record> Catalog<T> {
    /// Shared catalog for `T` and `selection`, built on first use.
    pub fn of(selection: FieldSelection) -> Arc<Self> {
        let key = (TypeId::of::<T>(), selection);
        let cached = REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        let entry = match cached {
            Some(entry) => entry,
            None => {
                let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
                registry
                    .entry(key)
                    .or_insert_with(|| {
                        log::debug!(
                            "Building the field catalog of {} ({:#05b})",
                            any::type_name::<T>(),
                            selection.bits()
                        );
                        Arc::new(Self::build(selection))
                    })
                    .clone()
            }
        };
        entry
            .downcast::<Self>()
            .unwrap_or_else(|_| Arc::new(Self::build(selection)))
    }

    /// Fresh catalog, same type and selection always give the same fields in the same order.
    pub fn build(selection: FieldSelection) -> Self {
        Self {
            selection,
            fields: T::descriptors()
                .iter()
                .filter(|v| v.selected(selection))
                .cloned()
                .collect(),
        }
    }
}

impl<T: 'static> Catalog<T> {
    /// Catalog from caller supplied descriptors, kept as given.
    pub fn from_descriptors(fields: impl IntoIterator<Item = FieldDescriptor<T>>) -> Self {
        Self {
            selection: FieldSelection::ALL,
            fields: fields.into_iter().collect(),
        }
    }
    pub fn selection(&self) -> FieldSelection {
        self.selection
    }
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + Clone {
        self.fields.iter().map(|v| v.name())
    }
    pub fn position(&self, name: &str, case_sensitive: bool) -> Option<usize> {
        let name = fold_name(name, case_sensitive);
        self.fields
            .iter()
            .position(|v| fold_name(&v.name, case_sensitive) == name)
    }
}

impl<T: 'static> Debug for Catalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("type", &any::type_name::<T>())
            .field("selection", &self.selection)
            .field("fields", &self.fields)
            .finish()
    }
}
