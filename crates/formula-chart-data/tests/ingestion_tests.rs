use formula_chart_data::{
    ArrayProvider, Dataset, DatasetOptions, DimensionDef, DimensionType, ListError, OptionMap,
    Source, SourceFormat,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => panic!("expected an array, got {other}"),
    }
}

#[test]
fn scalar_items_fill_every_dimension() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    list.init_data(items(json!([10, 20, 30]))).unwrap();

    assert_eq!(list.get("x", 0).unwrap(), 10.0);
    assert_eq!(list.get("x", 1).unwrap(), 20.0);
    assert_eq!(list.get("x", 2).unwrap(), 30.0);
    assert_eq!(list.get("y", 1).unwrap(), 20.0);
}

#[test]
fn rows_map_to_dimensions_by_position() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    list.init_data(items(json!([[10, 15], [20, 25], [30, 35]])))
        .unwrap();
    assert_eq!(list.get("x", 1).unwrap(), 20.0);
    assert_eq!(list.get("y", 1).unwrap(), 25.0);

    let mut swapped = Dataset::new(["y", "x"]).unwrap();
    swapped
        .init_data(items(json!([[10, 15], [20, 25], [30, 35]])))
        .unwrap();
    assert_eq!(swapped.get("x", 1).unwrap(), 25.0);
    assert_eq!(swapped.get("y", 1).unwrap(), 20.0);
}

#[test]
fn empty_marker_is_missing() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    list.init_data(items(json!([1, "-"]))).unwrap();

    assert_eq!(list.get("y", 0).unwrap(), 1.0);
    assert!(list.get("y", 1).unwrap().is_nan());
    assert!(list.get("x", 1).unwrap().is_nan());
    assert!(!list.has_value(1).unwrap());
    assert!(list.has_value(0).unwrap());
}

#[test]
fn unparsable_values_are_missing_and_numeric_strings_parse() {
    let mut list = Dataset::new(["v"]).unwrap();
    list.init_data(items(json!(["abc", " 4.5 ", null, "", true, [1, 2]])))
        .unwrap_err();

    // Row `[1, 2]` is too long for one dimension; the rest on their own ingest fine.
    let mut list = Dataset::new(["v"]).unwrap();
    list.init_data(items(json!(["abc", " 4.5 ", null, "", true])))
        .unwrap();
    let values = list.map_array(&["v"], |v, _| v[0]).unwrap();
    assert!(values[0].is_nan());
    assert_eq!(values[1], 4.5);
    assert!(values[2].is_nan());
    assert!(values[3].is_nan());
    assert_eq!(values[4], 1.0);
}

#[test]
fn declared_types_coerce_values() {
    let mut list = Dataset::new([
        DimensionDef::new("x", DimensionType::Int),
        DimensionDef::new("y", DimensionType::Float),
    ])
    .unwrap();
    list.init_data(items(json!([[1.1, 1.1]]))).unwrap();

    assert_eq!(list.get("x", 0).unwrap(), 1.0);
    assert!((list.get("y", 0).unwrap() - 1.1).abs() < 1e-5);
}

#[test]
fn int_values_beyond_i64_are_missing() {
    let mut list = Dataset::new([DimensionDef::new("n", DimensionType::Int)]).unwrap();
    list.init_data(items(json!([1e20, f64::MAX, -1e20, 42.9])))
        .unwrap();

    assert!(list.get("n", 0).unwrap().is_nan());
    assert!(list.get("n", 1).unwrap().is_nan());
    assert!(list.get("n", 2).unwrap().is_nan());
    assert_eq!(list.get("n", 3).unwrap(), 42.0);
    assert_eq!(list.data_extent("n").unwrap().as_array(), [42.0, 42.0]);
}

#[test]
fn infinity_spellings_are_missing() {
    let mut list = Dataset::new(["v"]).unwrap();
    list.init_data(items(json!([1, "inf", "infinity", "+Inf", "2e1"])))
        .unwrap();

    for i in 1..4 {
        assert!(list.get("v", i).unwrap().is_nan(), "item {i}");
    }
    assert_eq!(list.get("v", 4).unwrap(), 20.0);
    assert_eq!(list.data_extent("v").unwrap().as_array(), [1.0, 20.0]);
    assert_eq!(list.indices_of_nearest("v", 1e9, None).unwrap(), vec![4]);
}

#[test]
fn dimension_definitions_deserialize_from_names_and_records() {
    let defs: Vec<DimensionDef> =
        serde_json::from_value(json!(["x", {"name": "y", "type": "int"}, {"name": "c", "type": "ordinal"}]))
            .unwrap();
    assert_eq!(
        defs,
        vec![
            DimensionDef::new("x", DimensionType::Float),
            DimensionDef::new("y", DimensionType::Int),
            DimensionDef::new("c", DimensionType::Ordinal),
        ]
    );

    let list = Dataset::new(defs).unwrap();
    assert_eq!(list.dimension_names(), vec!["x", "y", "c"]);
    assert_eq!(list.dimension("y").unwrap().index, 1);
    assert_eq!(list.dimension("c").unwrap().dimension_type, DimensionType::Ordinal);
}

#[test]
fn ordinal_dimensions_dictionary_encode_strings() {
    let mut list = Dataset::new([
        DimensionDef::new("day", DimensionType::Ordinal),
        DimensionDef::new("v", DimensionType::Float),
    ])
    .unwrap();
    list.init_data(items(json!([["Mon", 1], ["Tue", 2], ["Mon", 3], [7, 4], ["-", 5]])))
        .unwrap();

    assert_eq!(list.get("day", 0).unwrap(), 0.0);
    assert_eq!(list.get("day", 1).unwrap(), 1.0);
    assert_eq!(list.get("day", 2).unwrap(), 0.0);
    assert_eq!(list.get("day", 3).unwrap(), 7.0);
    assert!(list.get("day", 4).unwrap().is_nan());

    assert_eq!(list.ordinal_category("day", 1.0).unwrap(), Some("Tue"));
    assert_eq!(list.ordinal_category("day", 2.0).unwrap(), None);
    assert_eq!(list.ordinal_category("v", 0.0).unwrap(), None);
    assert_eq!(list.ordinal_category_count("day").unwrap(), 2);
}

#[test]
fn short_rows_leave_trailing_dimensions_missing() {
    let mut list = Dataset::new(["x", "y", "z"]).unwrap();
    list.init_data(items(json!([[1, 2], [3]]))).unwrap();

    assert_eq!(list.get("y", 0).unwrap(), 2.0);
    assert!(list.get("z", 0).unwrap().is_nan());
    assert!(list.get("y", 1).unwrap().is_nan());
}

#[test]
fn long_rows_are_rejected_without_touching_the_dataset() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    let err = list
        .init_data(items(json!([[1, 2], [3, 4, 5]])))
        .unwrap_err();
    assert_eq!(
        err,
        ListError::SchemaMismatch {
            raw_index: 1,
            expected: 2,
            actual: 3,
        }
    );
    assert_eq!(list.count(), 0);
    assert_eq!(list.raw_count(), 0);

    // Nothing was committed, so the dataset can still be populated.
    list.init_data(items(json!([[1, 2]]))).unwrap();
    assert_eq!(list.count(), 1);
}

#[test]
fn source_dimension_count_allows_wider_rows() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    let provider = ArrayProvider::new(items(json!([[1, 2, 3], [4, 5, 6]])))
        .with_source(Source::new(SourceFormat::ArrayRows).with_dimension_count(3));
    list.init_provider(provider).unwrap();

    assert_eq!(list.get("y", 1).unwrap(), 5.0);
    assert_eq!(list.raw_value(1).unwrap().into_owned(), json!([4, 5, 6]));
}

#[test]
fn source_dimension_names_map_by_name() {
    let mut list = Dataset::new(["y", "x", "w"]).unwrap();
    let provider = ArrayProvider::new(items(json!([[1, 2, 3], [4, 5, 6]])))
        .with_source(Source::new(SourceFormat::ArrayRows).with_dimension_names(["x", "z", "y"]));
    list.init_provider(provider).unwrap();

    assert_eq!(list.get("x", 0).unwrap(), 1.0);
    assert_eq!(list.get("y", 0).unwrap(), 3.0);
    assert!(list.get("w", 0).unwrap().is_nan());
    assert_eq!(list.get("y", 1).unwrap(), 6.0);
}

#[test]
fn reingestion_is_rejected() {
    let mut list = Dataset::new(["x"]).unwrap();
    list.init_data(items(json!([1, 2, 3]))).unwrap();
    let chunks = list.chunk_count();

    assert_eq!(
        list.init_data(items(json!([4]))).unwrap_err(),
        ListError::AlreadyInitialized
    );
    assert_eq!(list.count(), 3);
    assert_eq!(list.chunk_count(), chunks);
}

#[test]
fn empty_input_is_a_valid_dataset() {
    let mut list = Dataset::new(["x"]).unwrap();
    list.init_data(Vec::new()).unwrap();
    assert_eq!(list.count(), 0);
    assert_eq!(list.index_of_raw_index(1), None);
    assert!(list.data_extent("x").unwrap().is_empty());
}

#[test]
fn columns_span_multiple_chunks() {
    let options = DatasetOptions { chunk_size: 3 };
    let mut list = Dataset::with_host(["x"], Arc::new(OptionMap::new()), options).unwrap();
    list.init_data((0..10).map(|i| json!(i)).collect()).unwrap();

    assert_eq!(list.chunk_count(), 4);
    assert_eq!(list.get("x", 9).unwrap(), 9.0);
    assert_eq!(list.get("x", 3).unwrap(), 3.0);
}

#[test]
fn schema_errors() {
    assert_eq!(
        Dataset::new(["x", "x"]).unwrap_err(),
        ListError::DuplicateDimension("x".into())
    );
    assert_eq!(
        Dataset::new(Vec::<&str>::new()).unwrap_err(),
        ListError::EmptySchema
    );
    assert!(matches!(
        Dataset::with_host(["x"], Arc::new(OptionMap::new()), DatasetOptions { chunk_size: 0 }),
        Err(ListError::InvalidOptions(_))
    ));
}

#[test]
fn options_deserialize_with_defaults() {
    let options: DatasetOptions = serde_json::from_value(json!({})).unwrap();
    assert_eq!(options, DatasetOptions::default());
    let options: DatasetOptions = serde_json::from_value(json!({"chunkSize": 16})).unwrap();
    assert_eq!(options.chunk_size, 16);
}

#[test]
fn datasets_can_share_one_schema() {
    let first = Dataset::new([("day", DimensionType::Ordinal), ("v", DimensionType::Int)]).unwrap();
    let schema = Arc::new(first.schema().clone());
    assert_eq!(schema.names().collect::<Vec<_>>(), vec!["day", "v"]);
    assert_eq!(schema.index_of("v"), Some(1));

    let mut second =
        Dataset::from_schema(schema, Arc::new(OptionMap::new()), DatasetOptions::default())
            .unwrap();
    second.init_data(items(json!([["Mon", 3.7]]))).unwrap();
    assert_eq!(second.get("v", 0).unwrap(), 3.0);
    assert_eq!(second.dimension("day").unwrap().dimension_type, DimensionType::Ordinal);
    assert_eq!(second.ordinal_category("day", second.get("day", 0).unwrap()).unwrap(), Some("Mon"));
}
