use crate::{
    AsValue, Catalog, ColumnDescriptor, Cursor, EffectiveMapping, Error, FieldDescriptor,
    MappingError, Record, Result, Row, Value, reconcile,
};
use std::{any, marker::PhantomData, sync::Arc};

fn conversion_error(column: &str, target: String, error: Error) -> Error {
    MappingError::Conversion {
        column: column.to_string(),
        target,
        message: format!("{error:#}"),
    }
    .into()
}

fn field_target<T>(field: &FieldDescriptor<T>) -> String {
    format!("field `{}` ({})", field.name, field.value.type_name())
}

/// Compiled binding between the columns of a cursor and the fields of `T`.
///
/// Built once per query execution and used for every row. The plan is immutable,
/// the entries of the parallel arrays are indexed identically.
pub struct ProjectionPlan<T: 'static> {
    catalog: Arc<Catalog<T>>,
    /// Bound column names, for diagnostics.
    columns: Box<[String]>,
    ordinals: Box<[usize]>,
    fields: Box<[usize]>,
    nullable: Box<[bool]>,
    enumeration: Box<[bool]>,
    underlying: Box<[Value]>,
}

/// One entry of a [`ProjectionPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<'a> {
    pub ordinal: usize,
    pub column: &'a str,
    pub field: &'a str,
    pub nullable: bool,
    pub enumeration: bool,
    pub underlying: &'a Value,
}

impl<T: 'static> ProjectionPlan<T> {
    /// Join `columns` with the assignable fields of `catalog` and freeze the result.
    ///
    /// Fields without a setter are not assignable and take no part in the join, a column
    /// carrying their name counts as unmatched.
    pub fn compile(
        columns: &[ColumnDescriptor],
        catalog: Arc<Catalog<T>>,
        options: &EffectiveMapping,
    ) -> Result<Self> {
        let column_names = columns.iter().map(|v| v.name.as_str()).collect::<Vec<_>>();
        let assignable = catalog
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.setter.is_some())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let field_names = assignable
            .iter()
            .map(|i| catalog.fields()[*i].name())
            .collect::<Vec<_>>();
        let reconciliation = reconcile(
            options.selector,
            &column_names,
            &field_names,
            options.case_sensitive,
        )?;
        let len = reconciliation.matched_count;
        let mut bound = Vec::with_capacity(len);
        let mut ordinals = Vec::with_capacity(len);
        let mut fields = Vec::with_capacity(len);
        let mut nullable = Vec::with_capacity(len);
        let mut enumeration = Vec::with_capacity(len);
        let mut underlying = Vec::with_capacity(len);
        for (column, field) in reconciliation.positions {
            let index = assignable[field];
            let field = &catalog.fields()[index];
            bound.push(columns[column].name.clone());
            ordinals.push(columns[column].ordinal);
            fields.push(index);
            nullable.push(field.nullable);
            enumeration.push(field.enumeration);
            underlying.push(field.value.as_null());
        }
        log::debug!(
            "Compiled the projection of {} binding {} of {} columns",
            any::type_name::<T>(),
            len,
            columns.len(),
        );
        Ok(Self {
            catalog,
            columns: bound.into(),
            ordinals: ordinals.into(),
            fields: fields.into(),
            nullable: nullable.into(),
            enumeration: enumeration.into(),
            underlying: underlying.into(),
        })
    }

    /// Compile against the columns of a live cursor.
    pub fn for_cursor(
        cursor: &impl Cursor,
        catalog: Arc<Catalog<T>>,
        options: &EffectiveMapping,
    ) -> Result<Self> {
        Self::compile(&cursor.columns()?, catalog, options)
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    pub fn catalog(&self) -> &Arc<Catalog<T>> {
        &self.catalog
    }

    pub fn bindings(&self) -> impl ExactSizeIterator<Item = Binding<'_>> {
        (0..self.len()).map(|k| Binding {
            ordinal: self.ordinals[k],
            column: self.column(k),
            field: self.catalog.fields()[self.fields[k]].name(),
            nullable: self.nullable[k],
            enumeration: self.enumeration[k],
            underlying: &self.underlying[k],
        })
    }

    fn column(&self, k: usize) -> &str {
        &self.columns[k]
    }

    fn field(&self, k: usize) -> &FieldDescriptor<T> {
        &self.catalog.fields()[self.fields[k]]
    }

    /// Value of binding `k` for the current row, converted to the declared type.
    fn cell(&self, cursor: &impl Cursor, k: usize) -> Result<Value> {
        let ordinal = self.ordinals[k];
        if cursor.is_null(ordinal)? {
            if self.nullable[k] {
                return Ok(self.underlying[k].clone());
            }
            return Err(conversion_error(
                self.column(k),
                field_target(self.field(k)),
                Error::msg("null value for a field that does not accept null"),
            ));
        }
        let value = cursor.get_value(ordinal)?;
        if self.enumeration[k] {
            // Parsed by the field setter, from the name or the numeric value
            return Ok(value);
        }
        value
            .coerce(&self.underlying[k])
            .map_err(|e| conversion_error(self.column(k), field_target(self.field(k)), e))
    }

    fn assign(&self, item: &mut T, k: usize, value: Value) -> Result<()> {
        let field = self.field(k);
        field
            .set(item, value)
            .map_err(|e| match e.downcast::<MappingError>() {
                Ok(e) => e.into(),
                Err(e) => conversion_error(self.column(k), field_target(field), e),
            })
    }

    /// Default constructed `T` with every bound field assigned from the current row.
    pub fn project(&self, cursor: &impl Cursor) -> Result<T>
    where
        T: Default,
    {
        let mut item = T::default();
        for k in 0..self.len() {
            let value = self.cell(cursor, k)?;
            self.assign(&mut item, k, value)?;
        }
        Ok(item)
    }
}

impl<T: Record> ProjectionPlan<T> {
    /// `T` built through its designated constructor.
    ///
    /// Bound data members are passed positionally, unbound parameters receive the typed
    /// null of their declared type. Bound accessors are assigned after construction.
    pub fn construct(&self, cursor: &impl Cursor) -> Result<T> {
        let mut args = Vec::new();
        for field in T::descriptors() {
            if let Some(position) = field.position {
                if args.len() <= position {
                    args.resize(position + 1, Value::Null);
                }
                args[position] = field.value.as_null();
            }
        }
        let mut deferred = Vec::new();
        for k in 0..self.len() {
            let value = self.cell(cursor, k)?;
            match self.field(k).position {
                Some(position) if position < args.len() => args[position] = value,
                _ => deferred.push((k, value)),
            }
        }
        let mut item = T::construct(args.into())?;
        for (k, value) in deferred {
            self.assign(&mut item, k, value)?;
        }
        Ok(item)
    }
}

/// First column shortcut, the cell is converted with `T`'s own rules.
pub struct ScalarPlan<T> {
    column: String,
    _type: PhantomData<fn() -> T>,
}

impl<T: AsValue> ScalarPlan<T> {
    pub fn compile(columns: &[ColumnDescriptor]) -> Result<Self> {
        let Some(column) = columns.iter().find(|v| v.ordinal == 0) else {
            return Err(MappingError::ColumnOutOfRange {
                ordinal: 0,
                count: columns.len(),
            }
            .into());
        };
        Ok(Self {
            column: column.name.clone(),
            _type: PhantomData,
        })
    }

    pub fn project(&self, cursor: &impl Cursor) -> Result<T> {
        T::try_from_value(cursor.get_value(0)?).map_err(|e| {
            conversion_error(&self.column, any::type_name::<T>().to_string(), e)
        })
    }
}

/// Anonymous tuple whose elements are read positionally.
pub trait TupleShape: Sized {
    const ARITY: usize;
    fn from_row(row: Row, columns: &[String]) -> Result<Self>;
}

macro_rules! impl_tuple_shape {
    ($len:literal; $($t:ident),+) => {
        impl<$($t: AsValue),+> TupleShape for ($($t,)+) {
            const ARITY: usize = $len;
            fn from_row(row: Row, columns: &[String]) -> Result<Self> {
                let count = row.len();
                let mut values = row.into_vec().into_iter().enumerate();
                Ok(($({
                    let Some((i, value)) = values.next() else {
                        return Err(MappingError::ColumnOutOfRange { ordinal: count, count }.into());
                    };
                    $t::try_from_value(value).map_err(|e| {
                        conversion_error(
                            columns.get(i).map(String::as_str).unwrap_or_default(),
                            any::type_name::<$t>().to_string(),
                            e,
                        )
                    })?
                },)+))
            }
        }
    };
}
impl_tuple_shape!(1; A);
impl_tuple_shape!(2; A, B);
impl_tuple_shape!(3; A, B, C);
impl_tuple_shape!(4; A, B, C, D);
impl_tuple_shape!(5; A, B, C, D, E);
impl_tuple_shape!(6; A, B, C, D, E, F);
impl_tuple_shape!(7; A, B, C, D, E, F, G);
impl_tuple_shape!(8; A, B, C, D, E, F, G, H);

/// Positional projection into an anonymous tuple, column `i` feeds element `i`.
pub struct TuplePlan<T> {
    columns: Box<[String]>,
    _type: PhantomData<fn() -> T>,
}

impl<T: TupleShape> TuplePlan<T> {
    pub fn compile(columns: &[ColumnDescriptor]) -> Result<Self> {
        if columns.len() < T::ARITY {
            return Err(MappingError::ColumnOutOfRange {
                ordinal: T::ARITY - 1,
                count: columns.len(),
            }
            .into());
        }
        let mut names = vec![String::new(); T::ARITY];
        for column in columns.iter().filter(|v| v.ordinal < T::ARITY) {
            names[column.ordinal] = column.name.clone();
        }
        Ok(Self {
            columns: names.into(),
            _type: PhantomData,
        })
    }

    pub fn project(&self, cursor: &impl Cursor) -> Result<T> {
        let mut row: Row = vec![Value::Null; T::ARITY].into();
        cursor.get_values(&mut row)?;
        T::from_row(row, &self.columns)
    }
}
