use std::collections::BTreeMap;

use pliant::core::{OverrideError, PathResolutionError};
use pliant::prelude::*;
use pliant::{Value, apply_overrides};

fn value(json: serde_json::Value) -> Value {
    serde_json::from_value(json).unwrap()
}

// =============================================================================
// Plain fields and methods
// =============================================================================

#[derive(Debug, Config)]
#[config(crate = "pliant::core", methods(bar1, inc_foo1))]
struct Basic {
    foo1: Value,
    foo2: Value,
    extras: Value,
}

impl Default for Basic {
    fn default() -> Self {
        Self {
            foo1: Value::Int(1),
            foo2: Value::Str("two".into()),
            extras: Value::Dict(Default::default()),
        }
    }
}

impl Basic {
    fn bar1(&mut self, args: CallArgs) -> HookResult {
        args.expect_none()?;
        self.foo1 = Value::Int(10);
        Ok(())
    }

    fn inc_foo1(&mut self, args: CallArgs) -> HookResult {
        let mut args = args.bind(&["increment", "extra_decrement"])?;
        let increment: i64 = args.required("increment")?;
        let extra_decrement: i64 = args.optional("extra_decrement")?.unwrap_or(0);
        let current = self
            .foo1
            .as_int()
            .ok_or_else(|| anyhow::anyhow!("foo1 is not an integer"))?;
        self.foo1 = Value::Int(current + increment - extra_decrement);
        Ok(())
    }
}

#[test]
fn test_empty_args() {
    let mut conf = Basic::default();
    let show = apply_overrides(&mut conf, Vec::<String>::new()).unwrap();
    assert!(!show);
    assert_eq!(conf.foo1, Value::Int(1));
    assert_eq!(conf.foo2, Value::Str("two".into()));
}

#[test]
fn test_basic() {
    let mut conf = Basic::default();
    assert!(!apply_overrides(&mut conf, ["foo1=12", "foo2=hi"]).unwrap());
    assert_eq!(conf.foo1, Value::Int(12));
    assert_eq!(conf.foo2, Value::Str("hi".into()));
}

#[test]
fn test_lists() {
    let mut conf = Basic::default();
    apply_overrides(&mut conf, ["foo1=[T,2,a]", "foo2=[a,None,1.0]"]).unwrap();
    assert_eq!(conf.foo1, value(serde_json::json!([true, 2, "a"])));
    assert_eq!(conf.foo2, value(serde_json::json!(["a", null, 1.0])));
}

#[test]
fn test_later_assignments_win() {
    let mut conf = Basic::default();
    apply_overrides(&mut conf, ["foo1=12", "foo2=None", "foo1=[1,2,3]"]).unwrap();
    assert_eq!(conf.foo1, value(serde_json::json!([1, 2, 3])));
    assert_eq!(conf.foo2, Value::Null);
}

#[test]
fn test_show_flag_anywhere() {
    let mut conf = Basic::default();
    assert!(apply_overrides(&mut conf, ["foo1=12", "--show", "foo2=three"]).unwrap());
    assert_eq!(conf.foo2, Value::Str("three".into()));
}

#[test]
fn test_method_calls() {
    let cases: [(&str, i64); 4] = [
        (".bar1", 10),
        (".inc_foo1(5)", 6),
        (".inc_foo1(increment=5)", 6),
        (".inc_foo1(5,extra_decrement=1)", 5),
    ];
    for (arg, expected) in cases {
        let mut conf = Basic::default();
        apply_overrides(&mut conf, [arg]).unwrap();
        assert_eq!(conf.foo1, Value::Int(expected), "{arg}");
    }
}

#[test]
fn test_method_argument_errors() {
    let mut conf = Basic::default();
    for arg in [".inc_foo1", ".inc_foo1(1,2,3)", ".inc_foo1(5,bogus=1)", ".bar1(1)"] {
        assert!(
            matches!(
                apply_overrides(&mut conf, [arg]),
                Err(RuntimeError::Override(OverrideError::Method { .. }))
            ),
            "{arg}"
        );
    }
    assert!(matches!(
        apply_overrides(&mut conf, [".nope"]),
        Err(RuntimeError::Override(OverrideError::Path(_)))
    ));
}

#[test]
fn test_missing_field_is_rejected() {
    let mut conf = Basic::default();
    let err = apply_overrides(&mut conf, ["foo3=3"]).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Override(OverrideError::Path(PathResolutionError::NotFound { .. }))
    ));
    assert!(err.to_string().contains("foo3"));
}

#[test]
fn test_create_marker_adds_keys_to_mappings_only() {
    let mut conf = Basic::default();
    apply_overrides(&mut conf, ["+extras.foo3=3", "+extras.deep.er=x"]).unwrap();
    assert_eq!(
        conf.extras,
        value(serde_json::json!({"foo3": 3, "deep": {"er": "x"}}))
    );

    assert!(matches!(
        apply_overrides(&mut conf, ["+foo3=3"]),
        Err(RuntimeError::Override(OverrideError::Path(
            PathResolutionError::FixedFields { .. }
        )))
    ));
}

// =============================================================================
// Nesting and aliases
// =============================================================================

#[derive(Debug, Config)]
#[config(crate = "pliant::core")]
struct Nested {
    nested_value: String,
    long_name: i64,
    short_name: Alias,
}

impl Default for Nested {
    fn default() -> Self {
        Self {
            nested_value: "original".into(),
            long_name: 15,
            short_name: Alias::to("long_name"),
        }
    }
}

#[derive(Debug, Config)]
#[config(crate = "pliant::core")]
struct Complex {
    nested: Nested,
    normal_dict: BTreeMap<String, i64>,
    long_name: i64,
    short_name: Alias,
    alias_nest: Alias,
}

impl Default for Complex {
    fn default() -> Self {
        Self {
            nested: Nested::default(),
            normal_dict: BTreeMap::from([("a".into(), 1), ("b".into(), 2)]),
            long_name: 5,
            short_name: Alias::to("long_name"),
            alias_nest: Alias::to("nested"),
        }
    }
}

fn complex(args: &[&str]) -> Complex {
    let mut conf = Complex::default();
    apply_overrides(&mut conf, args).unwrap();
    conf
}

#[test]
fn test_mapping_entry_assignment() {
    let conf = complex(&["normal_dict.a=3"]);
    assert_eq!(conf.normal_dict, BTreeMap::from([("a".into(), 3), ("b".into(), 2)]));
}

#[test]
fn test_alias_assignments() {
    assert_eq!(complex(&["short_name=20"]).long_name, 20);
    assert_eq!(complex(&["nested.short_name=25"]).nested.long_name, 25);
    assert_eq!(complex(&["alias_nest.long_name=30"]).nested.long_name, 30);
    assert_eq!(complex(&["alias_nest.short_name=45"]).nested.long_name, 45);

    let conf = complex(&["short_name=40", "nested.short_name=35"]);
    assert_eq!(conf.long_name, 40);
    assert_eq!(conf.nested.long_name, 35);
}

#[test]
fn test_alias_and_target_share_one_value() {
    assert_eq!(complex(&["short_name=40", "long_name=2"]).long_name, 2);
    assert_eq!(complex(&["long_name=2", "short_name=40"]).long_name, 40);
}

#[test]
fn test_alias_under_scope() {
    let conf = complex(&["--in", "nested", "short_name=45", "in--"]);
    assert_eq!(conf.nested.long_name, 45);

    let conf = complex(&["--in", "alias_nest", "nested_value=moved", "in--", "long_name=1"]);
    assert_eq!(conf.nested.nested_value, "moved");
    assert_eq!(conf.long_name, 1);
}

#[test]
fn test_dict_assignment_follows_aliases() {
    let conf = complex(&["nested={'short_name': 7, 'nested_value': 'patched'}"]);
    assert_eq!(conf.nested.long_name, 7);
    assert_eq!(conf.nested.nested_value, "patched");

    assert_eq!(complex(&["alias_nest={'short_name': 8}"]).nested.long_name, 8);
}

#[derive(Debug, Default, Config)]
#[config(crate = "pliant::core")]
struct Tags {
    inner: TagList,
}

#[derive(Debug, Default, Config)]
#[config(crate = "pliant::core")]
struct TagList {
    tags: Vec<String>,
}

#[test]
fn test_list_block_assigns_scoped_key() {
    let mut conf = Tags::default();
    apply_overrides(&mut conf, ["--in", "inner", "--list", "tags", "a", "2", "list--", "in--"])
        .unwrap();
    assert_eq!(conf.inner.tags, ["a", "2"]);
}

// =============================================================================
// Structured literals
// =============================================================================

#[derive(Debug, Default, Config)]
#[config(crate = "pliant::core")]
struct Structures {
    simple_list: Value,
    nested_list: Value,
    dict_value: Value,
    mixed_structure: Value,
    tuple_value: Value,
}

fn structures(args: &[&str]) -> Structures {
    let mut conf = Structures::default();
    apply_overrides(&mut conf, args).unwrap();
    conf
}

#[test]
fn test_nested_lists() {
    assert_eq!(
        structures(&["nested_list=[[1,2],[3,4]]"]).nested_list,
        value(serde_json::json!([[1, 2], [3, 4]]))
    );
    assert_eq!(
        structures(&["nested_list=[[[1,2],3],[4,[5,6]]]"]).nested_list,
        value(serde_json::json!([[[1, 2], 3], [4, [5, 6]]]))
    );
}

#[test]
fn test_dict_literals() {
    assert_eq!(
        structures(&[r#"dict_value={"a": 1, "b": 2, "c": [1,2,3]}"#]).dict_value,
        value(serde_json::json!({"a": 1, "b": 2, "c": [1, 2, 3]}))
    );
    assert_eq!(
        structures(&[r#"dict_value={"outer": {"inner": [1,2,3], "flag": True}}"#]).dict_value,
        value(serde_json::json!({"outer": {"inner": [1, 2, 3], "flag": true}}))
    );
}

#[test]
fn test_list_of_dicts() {
    let conf = structures(&[
        r#"mixed_structure=[{"name": "item1", "values": [1,2,3]}, {"name": "item2", "values": [4,5,6]}]"#,
    ]);
    assert_eq!(
        conf.mixed_structure,
        value(serde_json::json!([
            {"name": "item1", "values": [1, 2, 3]},
            {"name": "item2", "values": [4, 5, 6]},
        ]))
    );
}

#[test]
fn test_tuples() {
    let ints = |items: &[i64]| items.iter().copied().map(Value::Int).collect::<Vec<_>>();
    assert_eq!(
        structures(&["tuple_value=(1,2,3)"]).tuple_value,
        Value::Tuple(ints(&[1, 2, 3]))
    );
    assert_eq!(
        structures(&["tuple_value=((1,2),(3,4))"]).tuple_value,
        Value::Tuple(vec![Value::Tuple(ints(&[1, 2])), Value::Tuple(ints(&[3, 4]))])
    );
}

#[test]
fn test_expressions_in_parentheses() {
    let conf = structures(&[
        "simple_list=([1,2] + [3,4])",
        "nested_list=([x * x for x in range(4) if x % 2 == 1])",
        "dict_value=(2 ** 10)",
    ]);
    assert_eq!(conf.simple_list, value(serde_json::json!([1, 2, 3, 4])));
    assert_eq!(conf.nested_list, value(serde_json::json!([1, 9])));
    assert_eq!(conf.dict_value, Value::Int(1024));
}

#[test]
fn test_literal_evaluator_mode() {
    let mut conf = Structures::default();
    let overrides = Overrides::new().evaluator(EvaluatorMode::Literal);
    overrides
        .apply(&mut conf, [r#"dict_value={"a": (1, -2)}"#, "tuple_value=(1, 2)"])
        .unwrap();
    assert_eq!(conf.tuple_value, Value::Tuple(vec![Value::Int(1), Value::Int(2)]));

    assert!(matches!(
        overrides.apply(&mut conf, ["simple_list=([1] + [2])"]),
        Err(RuntimeError::Parse(_))
    ));
}
