#[cfg(test)]
mod tests {
    use ferry_core::{FieldSelector, MappingError, MismatchSide, check, reconcile};

    fn mismatch(error: ferry_core::Error) -> MappingError {
        error
            .downcast::<MappingError>()
            .unwrap_or_else(|e| panic!("Unexpected error: {e:#}"))
    }

    #[test]
    fn reconcile_exact() {
        let result = reconcile(
            FieldSelector::Both,
            &["id", "Name", "email"],
            &["EMAIL", "id", "name"],
            false,
        )
        .expect("Every name is matched");
        assert_eq!(
            result.matched,
            [
                ("id".to_string(), "id".to_string()),
                ("Name".to_string(), "name".to_string()),
                ("email".to_string(), "EMAIL".to_string()),
            ]
        );
        assert_eq!(result.positions, [(0, 1), (1, 2), (2, 0)]);
        assert_eq!(
            (result.source_count, result.dest_count, result.matched_count),
            (3, 3, 3)
        );
    }

    #[test]
    fn reconcile_selectors() {
        let source = ["id", "name", "extra"];
        let dest = ["id", "name", "missing", "other"];

        let error = reconcile(FieldSelector::Source, &source, &dest, false).unwrap_err();
        assert_eq!(
            mismatch(error),
            MappingError::FieldSelectionMismatch {
                side: MismatchSide::Source,
                source_count: 3,
                dest_count: 4,
                matched_count: 2,
            }
        );
        let error = reconcile(FieldSelector::Destination, &source, &dest, false).unwrap_err();
        assert!(matches!(
            mismatch(error),
            MappingError::FieldSelectionMismatch {
                side: MismatchSide::Destination,
                ..
            }
        ));
        // Source is checked first
        let error = reconcile(FieldSelector::Both, &source, &dest, false).unwrap_err();
        assert!(matches!(
            mismatch(error),
            MappingError::FieldSelectionMismatch {
                side: MismatchSide::Source,
                ..
            }
        ));

        let common = reconcile(FieldSelector::Common, &source, &dest, false).unwrap();
        assert_eq!(common.positions, [(0, 0), (1, 1)]);
        assert!(!common.is_empty());

        let disjoint = reconcile(FieldSelector::Common, &["a"], &["b"], false).unwrap();
        assert!(disjoint.is_empty());
        assert_eq!(disjoint.matched_count, 0);
    }

    #[test]
    fn reconcile_subsets() {
        reconcile(FieldSelector::Source, &["id"], &["id", "name"], false)
            .expect("The source is covered");
        reconcile(FieldSelector::Destination, &["id", "name"], &["id"], false)
            .expect("The destination is covered");
        reconcile(FieldSelector::Both, &[] as &[&str], &[] as &[&str], false)
            .expect("Nothing to match");
    }

    #[test]
    fn reconcile_case() {
        let result =
            reconcile(FieldSelector::Common, &["Id", "name"], &["id", "name"], true).unwrap();
        assert_eq!(result.matched, [("name".to_string(), "name".to_string())]);

        let error = reconcile(FieldSelector::Source, &["Id"], &["id"], true).unwrap_err();
        assert!(matches!(
            mismatch(error),
            MappingError::FieldSelectionMismatch { matched_count: 0, .. }
        ));
    }

    #[test]
    fn reconcile_duplicates() {
        let error = reconcile(FieldSelector::Common, &["id", "ID"], &["id"], false).unwrap_err();
        assert_eq!(
            mismatch(error),
            MappingError::DuplicateName {
                side: MismatchSide::Source,
                name: "ID".into(),
            }
        );
        let error =
            reconcile(FieldSelector::Common, &["id"], &["Name", "name"], false).unwrap_err();
        assert_eq!(
            mismatch(error),
            MappingError::DuplicateName {
                side: MismatchSide::Destination,
                name: "name".into(),
            }
        );
        // Distinct when case matters
        reconcile(FieldSelector::Common, &["id", "ID"], &["id"], true)
            .expect("`id` and `ID` are different names");
    }

    #[test]
    fn reconcile_check() {
        check(FieldSelector::Common, 5, 1, 0).unwrap();
        check(FieldSelector::Source, 2, 9, 2).unwrap();
        check(FieldSelector::Destination, 9, 2, 2).unwrap();
        check(FieldSelector::Both, 2, 2, 2).unwrap();
        let error = check(FieldSelector::Both, 2, 3, 2).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Field selection mismatch: the destination has unmatched fields (source: 2, destination: 3, matched: 2)"
        );
    }
}
