#[cfg(test)]
mod tests {
    use ferry_core::{AsValue, Value, truncate_at};
    use rust_decimal::Decimal;
    use std::{borrow::Cow, str::FromStr, sync::Arc};
    use time::{
        Date, Month, PrimitiveDateTime, Time,
        macros::{date, datetime, time},
    };
    use uuid::Uuid;

    #[test]
    fn value_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Int32(None), Value::Int32(None));
        assert_ne!(Value::Int32(None), Value::Int64(None));
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert_ne!(Value::Int32(Some(1)), Value::Int64(Some(1)));
        assert_eq!(
            Value::Decimal(Some(Decimal::new(125, 2)), 10, 2),
            Value::Decimal(Some(Decimal::new(125, 2)), 10, 2)
        );
        assert_ne!(
            Value::Decimal(Some(Decimal::new(125, 2)), 10, 2),
            Value::Decimal(Some(Decimal::new(125, 2)), 12, 2)
        );
        assert_ne!(
            Value::List(None, Box::new(Value::Int32(None))),
            Value::List(None, Box::new(Value::Varchar(None)))
        );
    }

    #[test]
    fn value_prototypes() {
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
        assert!(Value::Int8(Some(1)).same_type(&Value::Int8(None)));
        assert!(!Value::Decimal(None, 10, 2).same_type(&Value::Decimal(None, 10, 3)));
        assert_eq!(
            Value::Decimal(Some(Decimal::ONE), 8, 3).as_null(),
            Value::Decimal(None, 8, 3)
        );
        assert_eq!(Value::Int64(Some(4)).type_name(), "i64");
        assert_eq!(Value::Varchar(None).type_name(), "alloc::string::String");
        assert_eq!(<Option<u16>>::as_empty_value(), Value::UInt16(None));
        assert_eq!(
            <Vec<bool>>::as_empty_value(),
            Value::List(None, Box::new(Value::Boolean(None)))
        );
        assert_eq!(Decimal::as_empty_value(), Value::Decimal(None, 0, 0));
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(None));
        assert!(bool::try_from_value(val).unwrap());
        assert!(bool::try_from_value(1i8.into()).unwrap());
        assert!(!bool::try_from_value(0u64.into()).unwrap());
        assert!(bool::try_from_value(Value::Varchar(Some(" T ".into()))).unwrap());
        assert!(!bool::parse("false").unwrap());
        assert!(bool::parse("yes").is_err());
        assert!(bool::try_from_value(0.5f32.into()).is_err());
        assert!(bool::try_from_value(Value::Boolean(None)).is_err());
    }

    #[test]
    fn value_integers() {
        assert_eq!(i8::try_from_value(99u8.into()).unwrap(), 99);
        assert!(i8::try_from_value(300i32.into()).is_err());
        assert_eq!(i16::try_from_value((-29i8).into()).unwrap(), -29);
        assert_eq!(i32::try_from_value(Value::Varchar(Some(" 42 ".into()))).unwrap(), 42);
        assert_eq!(i32::parse("-17").unwrap(), -17);
        assert!(i32::parse("42abc").is_err());
        assert!(u8::parse("-1").is_err());
        assert_eq!(i64::try_from_value(u32::MAX.into()).unwrap(), u32::MAX as i64);
        assert_eq!(u64::try_from_value(true.into()).unwrap(), 1);
        assert_eq!(
            i64::try_from_value(Value::Decimal(Some(Decimal::from(5)), 0, 0)).unwrap(),
            5
        );
        assert!(i64::try_from_value(Value::Decimal(Some(Decimal::new(55, 1)), 0, 1)).is_err());
        assert!(i32::try_from_value(1.0f64.into()).is_err());
        assert!(i32::try_from_value(Value::Int32(None)).is_err());

        let long = "x".repeat(600);
        let error = i32::parse(&long).unwrap_err();
        assert!(error.to_string().contains("...`"));
        assert!(error.to_string().len() < 600);
    }

    #[test]
    fn value_floats() {
        assert_eq!(f64::try_from_value(7i32.into()).unwrap(), 7.0);
        assert_eq!(f64::try_from_value(0.25f32.into()).unwrap(), 0.25);
        assert_eq!(f32::try_from_value(Value::Varchar(Some("1.5".into()))).unwrap(), 1.5);
        assert_eq!(
            f64::try_from_value(Value::Decimal(Some(Decimal::new(-125, 2)), 0, 2)).unwrap(),
            -1.25
        );
        assert!(f64::parse("3.25abc").is_err());
        assert!(f32::try_from_value(7i64.into()).is_err());
    }

    #[test]
    fn value_text() {
        assert_eq!(String::try_from_value(5i32.into()).unwrap(), "5");
        assert_eq!(String::try_from_value(1.5f64.into()).unwrap(), "1.5");
        assert_eq!(String::try_from_value(true.into()).unwrap(), "true");
        assert_eq!(
            String::try_from_value(date!(2024 - 03 - 01).into()).unwrap(),
            "2024-03-01"
        );
        assert!(String::try_from_value(Value::Varchar(None)).is_err());
        assert_eq!(
            <Cow<str>>::try_from_value("borrowed".into()).unwrap(),
            "borrowed"
        );
        assert_eq!(Value::from("text"), Value::Varchar(Some("text".into())));
        assert_eq!(<String as AsValue>::parse(" as is ").unwrap(), " as is ");
    }

    #[test]
    fn value_decimal() {
        let value = Decimal::from_str("12.50").unwrap().as_value();
        assert_eq!(value, Value::Decimal(Some(Decimal::new(1250, 2)), 0, 2));
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("-0.125".into()))).unwrap(),
            Decimal::new(-125, 3)
        );
        assert_eq!(Decimal::try_from_value(42u16.into()).unwrap(), Decimal::from(42));
        assert_eq!(<Decimal as AsValue>::parse("7.0").unwrap(), Decimal::from(7));
        assert!(<Decimal as AsValue>::parse("seven").is_err());
        assert!(Decimal::try_from_value(f64::NAN.into()).is_err());
    }

    #[test]
    fn value_time() {
        assert_eq!(
            <Date as AsValue>::parse("2024-02-29").unwrap(),
            Date::from_calendar_date(2024, Month::February, 29).unwrap()
        );
        assert!(<Date as AsValue>::parse("2023-02-29").is_err());
        assert_eq!(<Time as AsValue>::parse("12:30").unwrap(), time!(12:30));
        assert_eq!(<Time as AsValue>::parse("23:59:58.5").unwrap(), time!(23:59:58.5));
        assert_eq!(
            <PrimitiveDateTime as AsValue>::parse("2024-03-01 10:20:30").unwrap(),
            datetime!(2024-03-01 10:20:30)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(date!(2024 - 03 - 01).into()).unwrap(),
            datetime!(2024-03-01 0:00)
        );
        assert_eq!(
            Date::try_from_value(datetime!(2024-03-01 10:20).into()).unwrap(),
            date!(2024 - 03 - 01)
        );
    }

    #[test]
    fn value_uuid() {
        let text = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let uuid = <Uuid as AsValue>::parse(text).unwrap();
        assert_eq!(uuid.to_string(), text);
        let bytes = Value::Blob(Some(uuid.as_bytes().as_slice().into()));
        assert_eq!(Uuid::try_from_value(bytes).unwrap(), uuid);
        assert!(<Uuid as AsValue>::parse("67e55044").is_err());
        assert!(Uuid::try_from_value(Value::Blob(Some([1u8, 2].as_slice().into()))).is_err());
    }

    #[test]
    fn value_wrappers() {
        assert_eq!(<Option<i32>>::try_from_value(Value::Int32(None)).unwrap(), None);
        assert_eq!(<Option<i32>>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(<Option<i32>>::try_from_value(9i64.into()).unwrap(), Some(9));
        assert_eq!(<Option<i32>>::parse("NULL").unwrap(), None);
        assert_eq!(<Option<i32>>::parse("12").unwrap(), Some(12));
        assert_eq!(None::<String>.as_value(), Value::Varchar(None));
        assert_eq!(
            *<Arc<i16>>::try_from_value(3i8.into()).unwrap(),
            3
        );
        assert_eq!(*<Box<u8>>::parse("200").unwrap(), 200);
    }

    #[test]
    fn value_lists() {
        let list = vec![1i32, 2, 3].as_value();
        assert_eq!(
            list,
            Value::List(
                Some(vec![
                    Value::Int32(Some(1)),
                    Value::Int32(Some(2)),
                    Value::Int32(Some(3)),
                ]),
                Box::new(Value::Int32(None)),
            )
        );
        let mixed = Value::List(
            Some(vec![Value::Int64(Some(1)), Value::Varchar(Some("2".into()))]),
            Box::new(Value::Null),
        );
        assert_eq!(<Vec<i32>>::try_from_value(mixed).unwrap(), [1, 2]);
        let blob = Value::Blob(Some([7u8, 8].as_slice().into()));
        assert_eq!(<Vec<u8>>::try_from_value(blob).unwrap(), [7, 8]);
        assert!(<Vec<i32>>::try_from_value(5i32.into()).is_err());
    }

    #[test]
    fn value_coerce() {
        assert_eq!(
            Value::Int64(Some(5)).coerce(&Value::Int32(None)).unwrap(),
            Value::Int32(Some(5))
        );
        assert!(Value::Int64(Some(300)).coerce(&Value::Int8(None)).is_err());
        assert_eq!(
            Value::Varchar(Some("7".into())).coerce(&Value::Int64(None)).unwrap(),
            Value::Int64(Some(7))
        );
        assert_eq!(
            Value::Int32(Some(7)).coerce(&Value::Varchar(None)).unwrap(),
            Value::Varchar(Some("7".into()))
        );
        assert_eq!(
            Value::Null.coerce(&Value::Decimal(None, 10, 2)).unwrap(),
            Value::Decimal(None, 10, 2)
        );
        assert_eq!(
            Value::Int32(Some(3)).coerce(&Value::Decimal(None, 10, 2)).unwrap(),
            Value::Decimal(Some(Decimal::from(3)), 10, 2)
        );
        assert_eq!(
            Value::Varchar(Some("2024-03-01".into()))
                .coerce(&Value::Date(None))
                .unwrap(),
            Value::Date(Some(date!(2024 - 03 - 01)))
        );
        // The payload of the target is ignored
        assert_eq!(
            Value::UInt8(Some(1)).coerce(&Value::Int16(Some(99))).unwrap(),
            Value::Int16(Some(1))
        );
        assert_eq!(
            Value::Float64(Some(2.5)).coerce(&Value::Null).unwrap(),
            Value::Float64(Some(2.5))
        );
        assert!(Value::Boolean(Some(true)).coerce(&Value::Uuid(None)).is_err());
    }

    #[test]
    fn value_long_text() {
        let text = "é".repeat(300);
        let error = Value::Varchar(Some(text.clone()))
            .coerce(&Value::Int32(None))
            .expect_err("Not a number");
        assert!(format!("{error:#}").contains(&format!("{}...", "é".repeat(248))));
        assert!(i64::parse(format!("x{text}")).is_err());
        assert_eq!(truncate_at(&text, 497).len(), 496);
        assert_eq!(truncate_at("abc", 497), "abc");
        assert_eq!(truncate_at("aé", 2), "a");
    }

    #[test]
    fn value_coerce_lists() {
        let list = Value::List(
            Some(vec![Value::Varchar(Some("1".into())), Value::Int8(Some(2))]),
            Box::new(Value::Varchar(None)),
        );
        assert_eq!(
            list.coerce(&Value::List(None, Box::new(Value::Int32(None))))
                .unwrap(),
            Value::List(
                Some(vec![Value::Int32(Some(1)), Value::Int32(Some(2))]),
                Box::new(Value::Int32(None)),
            )
        );
        let blob = Value::Blob(Some([4u8].as_slice().into()));
        assert_eq!(
            blob.coerce(&Value::List(None, Box::new(Value::Int64(None))))
                .unwrap(),
            Value::List(Some(vec![Value::Int64(Some(4))]), Box::new(Value::Int64(None)))
        );
        assert!(
            Value::Int32(Some(1))
                .coerce(&Value::List(None, Box::new(Value::Int32(None))))
                .is_err()
        );
    }
}
