mod common;

#[cfg(test)]
mod tests {
    use crate::common::init_logs;
    use ferry::{
        Catalog, Cursor, FieldDescriptor, FieldSelection, MappingError, Record, RecordReader, Row,
        Value, read_row, read_row_labeled, stream,
    };
    use rust_decimal::Decimal;
    use std::{iter, str::FromStr};

    #[derive(Record, Default, Debug, Clone, PartialEq)]
    #[table_name("products")]
    struct Product {
        id: u32,
        name: String,
        price: Decimal,
        discontinued: Option<bool>,
        tags: Vec<String>,
    }

    fn products() -> Vec<Product> {
        vec![
            Product {
                id: 1,
                name: "Kettle".into(),
                price: Decimal::from_str("24.90").unwrap(),
                discontinued: None,
                tags: vec!["kitchen".into()],
            },
            Product {
                id: 2,
                name: "Toaster".into(),
                price: Decimal::from_str("31.00").unwrap(),
                discontinued: Some(true),
                tags: Vec::new(),
            },
        ]
    }

    fn mapping_error(error: ferry::Error) -> MappingError {
        error
            .downcast_ref::<MappingError>()
            .cloned()
            .unwrap_or_else(|| panic!("Unexpected error: {error:#}"))
    }

    #[test]
    fn reader_metadata() {
        init_logs();
        let reader = RecordReader::of(products());
        assert_eq!(reader.column_count(), 4);
        assert_eq!(
            reader.column_names().unwrap().to_vec(),
            ["id", "name", "price", "discontinued"]
        );
        assert_eq!(reader.ordinal("PRICE"), Some(2));
        assert_eq!(reader.ordinal("tags"), None);
        assert!(matches!(reader.column_type(0).unwrap(), Value::UInt32(None)));
        assert_eq!(reader.column_type_name(1).unwrap(), "alloc::string::String");
        assert!(!reader.column_nullable(0).unwrap());
        assert!(reader.column_nullable(3).unwrap());
        assert_eq!(
            mapping_error(reader.column_name(4).unwrap_err()),
            MappingError::ColumnOutOfRange {
                ordinal: 4,
                count: 4
            }
        );
        assert_eq!(reader.has_rows(), Some(true));

        let reader = RecordReader::new(products(), Product::catalog(FieldSelection::ALL));
        assert_eq!(reader.column_count(), 5);
        assert_eq!(reader.column_name(4).unwrap(), "tags");
    }

    #[test]
    fn reader_rows() {
        let mut reader = RecordReader::of(products());
        assert_eq!(
            mapping_error(reader.get_value(0).unwrap_err()),
            MappingError::NoCurrentRow
        );

        assert!(reader.read().unwrap());
        assert_eq!(reader.current().map(|v| v.id), Some(1));
        assert_eq!(reader.get_i64(0).unwrap(), 1);
        assert_eq!(reader.get_string(1).unwrap(), "Kettle");
        assert_eq!(
            reader.get_decimal(2).unwrap(),
            Decimal::from_str("24.9").unwrap()
        );
        assert!(reader.is_null(3).unwrap());
        assert_eq!(reader.get::<Option<bool>>(3).unwrap(), None);

        assert!(reader.read().unwrap());
        assert!(!reader.is_null(3).unwrap());
        assert!(reader.get_bool(3).unwrap());
        let row = read_row(&reader).unwrap();
        assert_eq!(row.len(), 4);
        assert_eq!(row[1], Value::Varchar(Some("Toaster".into())));
        let labels = reader.column_names().unwrap();
        let labeled = read_row_labeled(&reader, &labels).unwrap();
        assert_eq!(
            labeled.get_column("NAME"),
            Some(&Value::Varchar(Some("Toaster".into())))
        );
        assert_eq!(Row::from(labeled).len(), 4);

        let mut buffer = vec![Value::Null; 2];
        assert_eq!(reader.get_values(&mut buffer).unwrap(), 2);
        assert_eq!(buffer[0], Value::UInt32(Some(2)));

        assert!(!reader.read().unwrap());
        assert_eq!(reader.has_rows(), Some(false));
        assert!(!reader.read().unwrap());
        assert_eq!(
            mapping_error(reader.get_value(0).unwrap_err()),
            MappingError::NoCurrentRow
        );
    }

    #[test]
    fn reader_close() {
        let mut reader = RecordReader::of(products());
        assert!(reader.read().unwrap());
        reader.close().unwrap();
        assert!(reader.is_closed());
        reader.close().expect("Closing twice has no effect");
        assert!(!reader.read().unwrap());
        assert_eq!(reader.has_rows(), Some(false));
        assert_eq!(
            mapping_error(reader.get_value(1).unwrap_err()),
            MappingError::ReaderClosed
        );
        assert_eq!(
            mapping_error(reader.is_null(1).unwrap_err()),
            MappingError::ReaderClosed
        );
    }

    #[test]
    fn reader_empty() {
        let mut reader = RecordReader::of(Vec::<Product>::new());
        assert_eq!(reader.has_rows(), Some(false));
        assert_eq!(reader.column_count(), 4);
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn reader_look_ahead() {
        let mut reader = RecordReader::of(iter::from_fn(|| None::<Product>));
        assert_eq!(reader.has_rows(), None);
        reader.look_ahead().unwrap();
        assert_eq!(reader.has_rows(), Some(false));
        assert!(!reader.read().unwrap());

        let mut pending = products().into_iter();
        let mut reader = RecordReader::of(iter::from_fn(move || pending.next()));
        assert_eq!(reader.has_rows(), None);
        reader.look_ahead().unwrap();
        reader.look_ahead().unwrap();
        assert_eq!(reader.has_rows(), Some(true));
        assert_eq!(
            mapping_error(reader.get_value(0).unwrap_err()),
            MappingError::NoCurrentRow
        );
        assert!(reader.read().unwrap());
        assert_eq!(reader.get_string(1).unwrap(), "Kettle");
        assert!(reader.read().unwrap());
        assert_eq!(reader.get_string(1).unwrap(), "Toaster");
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn reader_custom_catalog() {
        // Values are converted to the declared type of the column
        let catalog = Catalog::from_descriptors([
            FieldDescriptor::new("code", Value::Int64(None), |v: &Product| {
                Value::UInt32(Some(v.id))
            }),
            FieldDescriptor::new("label", Value::Varchar(None), |v: &Product| {
                Value::Varchar(Some(v.name.to_uppercase()))
            }),
        ]);
        let mut reader = RecordReader::new(products(), catalog.into());
        assert!(reader.read().unwrap());
        assert_eq!(reader.get_value(0).unwrap(), Value::Int64(Some(1)));
        assert_eq!(reader.get_string(1).unwrap(), "KETTLE");
    }

    #[tokio::test]
    async fn reader_stream() {
        let mut reader = RecordReader::from_stream(
            stream::iter(products()),
            Product::catalog(Default::default()),
        );
        let mut names = Vec::new();
        while reader.read_async().await.unwrap() {
            names.push(reader.get_string(1).unwrap());
        }
        assert_eq!(names, ["Kettle", "Toaster"]);
        assert_eq!(reader.has_rows(), Some(false));
        reader.close().unwrap();
    }

    #[tokio::test]
    async fn reader_stream_error() {
        let items = vec![
            Ok(products().remove(0)),
            Err(ferry::Error::msg("The producer failed")),
        ];
        let mut reader = RecordReader::from_try_stream(
            stream::iter(items),
            Product::catalog(Default::default()),
        );
        assert!(reader.read_async().await.unwrap());
        let error = reader.read_async().await.unwrap_err();
        assert_eq!(error.to_string(), "The producer failed");
        assert_eq!(
            mapping_error(reader.get_value(0).unwrap_err()),
            MappingError::NoCurrentRow
        );
    }
}
