use formula_chart_data::{Dataset, DatasetOptions, OptionMap, OptionSource};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn items(value: Value) -> Vec<Value> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn record_fields_become_the_item_overlay() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    list.init_data(items(json!([1, {"value": 2, "somProp": "foo"}])))
        .unwrap();

    assert_eq!(list.get("x", 1).unwrap(), 2.0);
    assert_eq!(list.get("y", 1).unwrap(), 2.0);
    assert_eq!(
        list.item_model(1).unwrap().get("somProp"),
        Some(&json!("foo"))
    );
    assert_eq!(list.item_model(0).unwrap().get("somProp"), None);
    assert_eq!(list.item_model(1).unwrap().get("value"), None);
}

#[test]
fn item_model_option_is_the_raw_item() {
    let mut scalars = Dataset::new(["x", "y"]).unwrap();
    scalars.init_data(items(json!([1, 2, 3]))).unwrap();
    assert_eq!(
        scalars.item_model(1).unwrap().option().unwrap().into_owned(),
        json!(2)
    );

    let mut rows = Dataset::new(["x", "y"]).unwrap();
    rows.init_data(items(json!([[10, 15], [20, 25], [30, 35]])))
        .unwrap();
    assert_eq!(
        rows.item_model(1).unwrap().option().unwrap().into_owned(),
        json!([20, 25])
    );
}

#[test]
fn raw_value_unwraps_records_and_raw_data_item_does_not() {
    let mut list = Dataset::new(["x", "y"]).unwrap();
    list.init_data(items(json!([
        [1, 2],
        {"value": [3, 4], "name": "b"},
        "-"
    ])))
    .unwrap();

    assert_eq!(list.raw_value(0).unwrap().into_owned(), json!([1, 2]));
    assert_eq!(list.raw_value(1).unwrap().into_owned(), json!([3, 4]));
    assert_eq!(
        list.raw_data_item(1).unwrap().into_owned(),
        json!({"value": [3, 4], "name": "b"})
    );
    assert_eq!(list.raw_value(2).unwrap().into_owned(), json!("-"));
    assert_eq!(list.get("y", 1).unwrap(), 4.0);
}

#[test]
fn records_without_value_are_missing_but_keep_fields() {
    let mut list = Dataset::new(["x"]).unwrap();
    list.init_data(items(json!([{"name": "lonely"}]))).unwrap();

    assert!(list.get("x", 0).unwrap().is_nan());
    assert_eq!(list.name(0).unwrap(), Some("lonely"));
    assert_eq!(
        list.item_model(0).unwrap().keys().collect::<Vec<_>>(),
        vec!["name"]
    );
}

#[test]
fn names_resolve_through_the_active_view() {
    let mut list = Dataset::new(["v"]).unwrap();
    list.init_data(items(json!([
        {"value": 1, "name": "a"},
        {"value": 2, "name": "b"},
        3,
        {"value": 4, "name": "d"}
    ])))
    .unwrap();

    assert_eq!(list.name(2).unwrap(), None);
    assert_eq!(list.index_of_name("d"), Some(3));
    assert_eq!(list.index_of_name("zzz"), None);

    list.filter_self(&["v"], |v, _| v[0] > 1.0).unwrap();
    assert_eq!(list.index_of_name("d"), Some(2));
    assert_eq!(list.index_of_name("a"), None);
    assert_eq!(list.name(0).unwrap(), Some("b"));
}

#[test]
fn defaults_come_from_the_host_only_when_asked() {
    let host = OptionMap::from_value(json!({"color": "red", "symbol": "circle"}));
    let mut list = Dataset::with_host(["v"], Arc::new(host), DatasetOptions::default()).unwrap();
    list.init_data(items(json!([{"value": 1, "color": "blue"}, 2])))
        .unwrap();

    let plain = list.item_model(1).unwrap();
    assert_eq!(plain.get("color"), None);

    let first = list.item_model_with_defaults(0).unwrap();
    assert_eq!(first.get_str("color"), Some("blue"));
    assert_eq!(first.get_str("symbol"), Some("circle"));

    let second = list.item_model_with_defaults(1).unwrap();
    assert_eq!(second.get_str("color"), Some("red"));
    assert_eq!(second.get("missing"), None);

    assert_eq!(list.host_model().get("symbol"), Some(&json!("circle")));
}

#[test]
fn item_model_reports_its_raw_index_after_filtering() {
    let mut list = Dataset::new(["v"]).unwrap();
    list.init_data(items(json!([{"value": 1, "w": 10}, {"value": 2, "w": 20}])))
        .unwrap();
    list.filter_self_indexed(|idx| idx == 1);

    let model = list.item_model(0).unwrap();
    assert_eq!(model.raw_index(), 1);
    assert_eq!(model.get_f64("w"), Some(20.0));
    assert!(list.item_model(1).is_err());
}
