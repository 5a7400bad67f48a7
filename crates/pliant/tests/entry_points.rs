use pliant::prelude::*;
use pliant::runtime::persist::{self, PersistError};
use pliant::{Value, run_with};
use serde::{Deserialize, Serialize};

#[derive(Debug, Config)]
struct Simple {
    x: i64,
    y: i64,
}

impl Default for Simple {
    fn default() -> Self {
        Self { x: 1, y: 2 }
    }
}

fn product_plus_one(config: Simple) -> i64 {
    config.x * config.y + 1
}

#[test]
fn test_run_with_arguments() {
    assert_eq!(run_with(["x=5"], product_plus_one).unwrap(), Some(11));
    assert_eq!(
        App::<Simple>::new()
            .run_with(["x=5", "y=3"], product_plus_one)
            .unwrap(),
        Some(16)
    );
}

#[test]
fn test_show_dumps_and_skips_entry_point() {
    let mut out = Vec::new();
    let result = App::<Simple>::new()
        .run_to(["y=7", "--show"], &mut out, product_plus_one)
        .unwrap();
    assert_eq!(result, None);
    assert_eq!(String::from_utf8(out).unwrap(), "x: 1\ny: 7\n");
}

#[test]
fn test_errors_surface_from_run() {
    let err = run_with(["z=1"], product_plus_one).unwrap_err();
    assert!(err.to_string().contains("'z'"));
}

// =============================================================================
// Persistence
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
struct Inner {
    x: i64,
    #[record(default = "hello")]
    y: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Config)]
struct Saved {
    foo1: i64,
    foo2: String,
    baz: f64,
    qux: Vec<i64>,
    quux: Value,
    notes: String,
    nested: Nested,
    inner: Wrapper<Inner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
struct Nested {
    nested_foo: String,
}

impl Default for Saved {
    fn default() -> Self {
        Self {
            foo1: 1,
            foo2: "two".into(),
            baz: 3.0,
            qux: vec![1, 2, 3],
            quux: Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
            notes: String::new(),
            nested: Nested {
                nested_foo: "nested_bar".into(),
            },
            inner: Wrapper::new(),
        }
    }
}

fn configured() -> Saved {
    let mut conf = Saved::default();
    pliant::apply_overrides(
        &mut conf,
        ["foo1=10", "foo2=astring", "inner.x=11", "inner.y=bstring"],
    )
    .unwrap();
    conf
}

#[test]
fn test_to_dict_is_nested_mapping() {
    let dict = configured().to_dict();
    let expected: Value = serde_json::from_value(serde_json::json!({
        "foo1": 10,
        "foo2": "astring",
        "baz": 3.0,
        "qux": [1, 2, 3],
        "quux": [1, 2],
        "notes": "",
        "nested": {"nested_foo": "nested_bar"},
        "inner": {"x": 11, "y": "bstring"},
    }))
    .unwrap();
    assert_eq!(dict.to_plain(), expected);
}

#[test]
fn test_yaml_save_and_merge() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    let mut conf = configured();
    conf.notes = "first line\nsecond line\n".into();
    conf.save_yaml(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.find("baz:").unwrap() < text.find("foo1:").unwrap());

    let mut restored = Saved::default();
    restored.merge_yaml(&path).unwrap();
    assert_eq!(restored.foo1, 10);
    assert_eq!(restored.notes, "first line\nsecond line\n");
    assert_eq!(restored.nested, conf.nested);
    assert_eq!(
        restored.inner.build().unwrap(),
        Inner {
            x: 11,
            y: "bstring".into()
        }
    );
}

#[derive(Debug, Config)]
struct Train {
    learning_rate: f64,
    lr: Alias,
    run_name: Required<String>,
}

impl Default for Train {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            lr: Alias::to("learning_rate"),
            run_name: Required::Unset,
        }
    }
}

#[test]
fn test_yaml_round_trip_with_alias_and_unset_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.yaml");

    let mut conf = Train::default();
    conf.learning_rate = 0.25;
    conf.save_yaml(&path).unwrap();

    let mut restored = Train::default();
    restored.merge_yaml(&path).unwrap();
    assert_eq!(restored.learning_rate, 0.25);
    assert_eq!(restored.lr, Alias::to("learning_rate"));
    assert_eq!(restored.run_name, Required::Unset);
}

#[test]
fn test_snapshot_restores_typed_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.snap");

    let conf = configured();
    persist::save_snapshot(&conf, &path).unwrap();
    let restored: Saved = persist::load_binary(&path).unwrap();

    assert_eq!(restored.foo1, 10);
    assert_eq!(restored.foo2, "astring");
    assert_eq!(restored.inner.build().unwrap(), conf.inner.build().unwrap());

    assert!(matches!(
        persist::load_binary::<Saved>(dir.path().join("config.dill")),
        Err(PersistError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_copies_are_independent() {
    let conf = configured();
    let mut copy = conf.clone();
    pliant::apply_overrides(&mut copy, ["foo1=100", "inner.x=111"]).unwrap();

    assert_eq!(conf.foo1, 10);
    assert_eq!(copy.foo1, 100);
    assert_eq!(copy.foo2, "astring");
    assert_eq!(conf.inner.build().unwrap().x, 11);
    assert_eq!(copy.inner.build().unwrap().x, 111);
    assert_eq!(copy.inner.build().unwrap().y, "bstring");
}
