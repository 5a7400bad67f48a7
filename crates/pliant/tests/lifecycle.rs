use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use pliant::core::{
    CoerceResult, FromValue, Leaf, LifecycleError, OverrideError, PathResolutionError,
    WrapperBuildError,
};
use pliant::prelude::*;
use pliant::{apply_overrides, run_with};

// =============================================================================
// Required fields and finalize
// =============================================================================

#[derive(Debug, Config)]
#[config(finalize = finish)]
struct WithRequired {
    required: Required<i64>,
    optional: i64,
    #[config(skip)]
    final_val: Option<i64>,
}

impl Default for WithRequired {
    fn default() -> Self {
        Self {
            required: Required::Unset,
            optional: 5,
            final_val: None,
        }
    }
}

impl WithRequired {
    fn finish(&mut self) -> HookResult {
        self.final_val = Some(self.required.require("required")? + 1);
        Ok(())
    }
}

#[test]
fn test_required_missing() {
    let mut conf = WithRequired::default();
    let err = apply_overrides(&mut conf, ["optional=10"]).unwrap_err();
    assert!(matches!(err, RuntimeError::Required(ref e) if e.path == "required"));
    assert_eq!(conf.final_val, None);
}

#[test]
fn test_required_present_and_finalized() {
    let mut conf = WithRequired::default();
    apply_overrides(&mut conf, ["required=10"]).unwrap();
    assert_eq!(conf.required, Required::Set(10));
    assert_eq!(conf.final_val, Some(11));
}

#[derive(Debug, Default, Config)]
struct Stage {
    name: Required<String>,
}

#[derive(Debug, Default, Config)]
struct Pipeline {
    stages: Vec<Stage>,
}

#[test]
fn test_required_error_names_list_position() {
    let mut conf = Pipeline {
        stages: vec![
            Stage {
                name: Required::Set("load".into()),
            },
            Stage::default(),
        ],
    };
    let err = apply_overrides(&mut conf, Vec::<String>::new()).unwrap_err();
    let RuntimeError::Required(err) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(err.path, "stages.1.name");
}

#[derive(Debug, Config)]
#[config(finalize = finish)]
struct Inner {
    x: i64,
    y: i64,
}

impl Default for Inner {
    fn default() -> Self {
        Self { x: 1, y: 2 }
    }
}

impl Inner {
    fn finish(&mut self) -> HookResult {
        self.x = 10;
        self.y = 20;
        Ok(())
    }
}

#[derive(Debug, Config)]
#[config(finalize = finish)]
struct Middle {
    x: i64,
    y: i64,
    inner: Inner,
}

impl Default for Middle {
    fn default() -> Self {
        Self {
            x: 1,
            y: 2,
            inner: Inner::default(),
        }
    }
}

impl Middle {
    fn finish(&mut self) -> HookResult {
        anyhow::ensure!(self.inner.x == 10, "inner node was not finalized first");
        self.x = 10;
        self.y = 20;
        Ok(())
    }
}

#[derive(Debug, Config)]
#[config(finalize = finish)]
struct Outermost {
    x: i64,
    y: i64,
    configs: Vec<Middle>,
    #[config(skip)]
    total: i64,
}

impl Default for Outermost {
    fn default() -> Self {
        Self {
            x: 1,
            y: 2,
            configs: vec![Middle::default(), Middle::default()],
            total: 0,
        }
    }
}

impl Outermost {
    fn finish(&mut self) -> HookResult {
        self.x = 10;
        self.y = 20;
        self.total = self.configs.iter().map(|c| c.x + c.inner.x).sum();
        Ok(())
    }
}

#[test]
fn test_nested_finalize_runs_leaves_first() {
    let result = run_with(Vec::<String>::new(), |config: Outermost| {
        (
            (config.x, config.y),
            config
                .configs
                .iter()
                .map(|m| (m.x, m.y, m.inner.x, m.inner.y))
                .collect::<Vec<_>>(),
            config.total,
        )
    })
    .unwrap();

    let ((x, y), middles, total) = result.unwrap();
    assert_eq!((x, y), (10, 20));
    assert_eq!(middles, [(10, 20, 10, 20), (10, 20, 10, 20)]);
    assert_eq!(total, 40);
}

#[test]
fn test_finalize_error_is_wrapped() {
    #[derive(Debug, Default, Config)]
    #[config(finalize = reject)]
    struct Picky {
        level: i64,
    }

    impl Picky {
        fn reject(&mut self) -> HookResult {
            anyhow::ensure!(self.level >= 0, "level must not be negative");
            Ok(())
        }
    }

    let mut conf = Picky::default();
    let err = apply_overrides(&mut conf, ["level=-1"]).unwrap_err();
    match err {
        RuntimeError::Lifecycle(LifecycleError::Finalize { path, type_name, source }) => {
            assert_eq!(path, "<root>");
            assert_eq!(type_name, "Picky");
            assert_eq!(source.to_string(), "level must not be negative");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Debug, Default, Config)]
#[config(default, finalize = finish)]
struct Head {
    name: Required<String>,
    #[config(skip)]
    label: String,
}

impl Head {
    fn named(name: &str) -> Self {
        Self {
            name: Required::Set(name.into()),
            label: String::new(),
        }
    }

    fn finish(&mut self) -> HookResult {
        self.label = format!("head:{}", self.name.require("name")?);
        Ok(())
    }
}

#[derive(Debug, Default, Config)]
struct Heads {
    heads: BTreeMap<String, Head>,
    fallback: Option<Head>,
    extra: Vec<Head>,
}

#[test]
fn test_required_error_names_mapping_entry() {
    let mut conf = Heads {
        heads: BTreeMap::from([("a".into(), Head::default()), ("b".into(), Head::named("b"))]),
        ..Heads::default()
    };
    let err = apply_overrides(&mut conf, Vec::<String>::new()).unwrap_err();
    let RuntimeError::Required(err) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(err.path, "heads.a.name");
}

#[test]
fn test_mapping_entries_are_finalized() {
    let mut conf = Heads {
        heads: BTreeMap::from([("a".into(), Head::default())]),
        ..Heads::default()
    };
    apply_overrides(&mut conf, ["heads.a.name=first"]).unwrap();
    assert_eq!(conf.heads["a"].label, "head:first");
}

#[test]
fn test_defaultable_nodes_build_from_dict_literals() {
    let mut conf = Heads::default();
    apply_overrides(
        &mut conf,
        [
            "fallback={'name': 'z'}",
            "extra=[{'name': 'x'}, {'name': 'y'}]",
            "+heads.c={'name': 'c'}",
        ],
    )
    .unwrap();
    assert_eq!(conf.fallback.as_ref().map(|h| h.label.as_str()), Some("head:z"));
    let labels: Vec<&str> = conf.extra.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(labels, ["head:x", "head:y"]);
    assert_eq!(conf.heads["c"].label, "head:c");

    let mut conf = Heads::default();
    assert!(matches!(
        apply_overrides(&mut conf, ["fallback={'nope': 1}"]),
        Err(RuntimeError::Override(OverrideError::Coercion { .. }))
    ));
}

// =============================================================================
// Record wrappers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Record)]
struct Sample {
    a: i64,
    #[record(default)]
    b: Vec<i64>,
    #[record(default = 4.0)]
    c: f64,
}

#[derive(Debug, Default, Config)]
struct Wrapped {
    sample: Wrapper<Sample>,
}

fn wrapped(args: &[&str]) -> Wrapped {
    let mut conf = Wrapped::default();
    apply_overrides(&mut conf, args).unwrap();
    conf
}

#[test]
fn test_wrapper_full_override() {
    let conf = wrapped(&["sample.a=1", "sample.b=[1,2]", "sample.c=3"]);
    assert_eq!(
        conf.sample.build().unwrap(),
        Sample {
            a: 1,
            b: vec![1, 2],
            c: 3.0
        }
    );
}

#[test]
fn test_wrapper_defaults_and_factories() {
    let conf = wrapped(&["sample.a=1", "sample.b=[1,2]"]);
    assert_eq!(conf.sample.build().unwrap().c, 4.0);

    let conf = wrapped(&["sample.a=1", "sample.c=8"]);
    let built = conf.sample.build().unwrap();
    assert!(built.b.is_empty());
    assert_eq!(built.c, 8.0);
}

#[test]
fn test_wrapper_missing_field() {
    let conf = Wrapped::default();
    assert_eq!(
        conf.sample.build(),
        Err(WrapperBuildError::MissingField {
            type_name: "Sample",
            field: "a".into(),
        })
    );
}

#[test]
fn test_wrapper_rejects_unknown_and_mistyped_fields() {
    let mut conf = Wrapped::default();
    assert!(matches!(
        apply_overrides(&mut conf, ["sample.w=3"]),
        Err(RuntimeError::Override(OverrideError::Path(
            PathResolutionError::NotFound { .. }
        )))
    ));
    assert!(matches!(
        apply_overrides(&mut conf, ["sample.a=abc"]),
        Err(RuntimeError::Override(OverrideError::Coercion { .. }))
    ));
}

#[derive(Debug, Default, Config)]
#[config(finalize = finish)]
struct BuildsOnFinalize {
    dc: Wrapper<Sample>,
    #[config(skip)]
    built: Option<Sample>,
}

impl BuildsOnFinalize {
    fn finish(&mut self) -> HookResult {
        self.built = Some(self.dc.build()?);
        Ok(())
    }
}

#[test]
fn test_wrapper_built_in_finalize() {
    let mut conf = BuildsOnFinalize::default();
    apply_overrides(&mut conf, ["dc.a=3", "dc.c=2.0"]).unwrap();
    assert_eq!(
        conf.built,
        Some(Sample {
            a: 3,
            b: vec![],
            c: 2.0
        })
    );

    let mut conf = BuildsOnFinalize::default();
    assert!(matches!(
        apply_overrides(&mut conf, ["dc.c=2.0"]),
        Err(RuntimeError::Lifecycle(LifecycleError::Finalize { .. }))
    ));
}

#[test]
fn test_wrapper_clones_are_independent() {
    let mut conf = wrapped(&["sample.a=11"]);
    let copy = Wrapped {
        sample: conf.sample.clone(),
    };
    apply_overrides(&mut conf, ["sample.a=111"]).unwrap();
    assert_eq!(copy.sample.build().unwrap().a, 11);
    assert_eq!(conf.sample.build().unwrap().a, 111);
}

// =============================================================================
// Declared field types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct DoubleInt(i64);

impl FromValue for DoubleInt {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("DoubleInt")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        i64::from_value(value).map(|i| DoubleInt(i * 2))
    }
}

impl Leaf for DoubleInt {
    fn render(&self) -> Value {
        Value::Int(self.0)
    }
}

pliant::core::leaf_slot!(DoubleInt);

#[derive(Debug, Config)]
struct Annotated {
    a: i64,
    b: Required<DoubleInt>,
    c: f64,
    d: String,
}

impl Default for Annotated {
    fn default() -> Self {
        Self {
            a: 4,
            b: Required::Unset,
            c: 6.0,
            d: "hi".into(),
        }
    }
}

#[test]
fn test_values_are_coerced_to_field_types() {
    let mut conf = Annotated::default();
    apply_overrides(&mut conf, ["a=5.2", "b=11", "c=7", "d=bye"]).unwrap();
    assert_eq!(conf.a, 5);
    assert_eq!(conf.b, Required::Set(DoubleInt(22)));
    assert_eq!(conf.c, 7.0);
    assert_eq!(conf.d, "bye");
}

#[test]
fn test_unset_custom_type_is_required() {
    let mut conf = Annotated::default();
    assert!(matches!(
        apply_overrides(&mut conf, ["a=5.2", "c=7.0"]),
        Err(RuntimeError::Required(_))
    ));
}

#[test]
fn test_failed_coercion_names_key() {
    let mut conf = Annotated::default();
    let err = apply_overrides(&mut conf, ["a=[1,2]", "b=1"]).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Override(OverrideError::Coercion { ref path, .. }) if path == "a"
    ));
}

#[derive(Debug, Default, Config)]
struct WithOptional {
    opt1: Option<PathBuf>,
    opt2: Option<PathBuf>,
}

#[test]
fn test_optional_fields() {
    let mut conf = WithOptional::default();
    apply_overrides(&mut conf, ["opt1=hi", "opt2=bye"]).unwrap();
    assert_eq!(conf.opt1, Some(PathBuf::from("hi")));
    assert_eq!(conf.opt2, Some(PathBuf::from("bye")));

    apply_overrides(&mut conf, ["opt1=foo", "opt2=None"]).unwrap();
    assert_eq!(conf.opt1, Some(PathBuf::from("foo")));
    assert_eq!(conf.opt2, None);
}
