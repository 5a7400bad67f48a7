//! Tree-walking interpreter for parsed expressions.
//!
//! Numeric semantics follow the usual scripting conventions: integer
//! arithmetic is checked, `/` always yields a float, `//` and `%` round
//! toward negative infinity, and `bool` takes part in arithmetic as `0`/`1`.
//!
//! Every value the interpreter builds is charged against one budget of
//! [`MAX_ITEMS`] per evaluation, so nested repetition cannot multiply past it.

use std::cmp::Ordering;
use std::collections::HashSet;

use pliant_core::{Dict, FromValue, Value};

use super::parser::{BinaryOp, CollectionKind, CompareOp, Comprehension, Expr, UnaryOp};
use crate::error::{EvalError, EvalResult};

/// Total number of elements (string bytes included) one evaluation may build.
pub const MAX_ITEMS: usize = 1_000_000;

/// Evaluates `expr` with no variables bound.
pub fn evaluate(expr: &Expr) -> EvalResult<Value> {
    Interpreter::default().eval(expr)
}

#[derive(Debug)]
struct Interpreter {
    bindings: Vec<(String, Value)>,
    remaining: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            remaining: MAX_ITEMS,
        }
    }
}

impl Interpreter {
    fn charge(&mut self, count: usize) -> EvalResult<()> {
        self.remaining = self
            .remaining
            .checked_sub(count)
            .ok_or(EvalError::TooLarge { limit: MAX_ITEMS })?;
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => {
                let value = self
                    .bindings
                    .iter()
                    .rev()
                    .find(|(bound, _)| bound == name)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| EvalError::UnknownName(name.clone()))?;
                self.charge(weight(&value))?;
                Ok(value)
            }
            Expr::List(items) => Ok(Value::List(self.eval_items(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_items(items)?)),
            Expr::Set(items) => Ok(Value::set(self.eval_items(items)?)),
            Expr::Dict(pairs) => {
                self.charge(pairs.len())?;
                let mut dict = Dict::new();
                for (key, value) in pairs {
                    let key = self.eval(key)?.key_string();
                    dict.insert(key, self.eval(value)?);
                }
                Ok(Value::Dict(dict))
            }
            Expr::Unary(op, operand) => unary(*op, self.eval(operand)?),
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary(*op, left, right)
            }
            Expr::Compare(first, chain) => {
                let mut left = self.eval(first)?;
                for (op, right) in chain {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if left.truthy() { self.eval(right) } else { Ok(left) }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.truthy() { Ok(left) } else { self.eval(right) }
            }
            Expr::Not(inner) => Ok(Value::Bool(!self.eval(inner)?.truthy())),
            Expr::Call { function, args } => {
                let args = self.eval_all(args)?;
                self.call(function, args)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                subscript(target, &self.eval(index)?)
            }
            Expr::Comprehension(comp) => self.comprehension(comp),
        }
    }

    /// Evaluates the elements of a collection display, charging one per slot.
    fn eval_items(&mut self, items: &[Expr]) -> EvalResult<Vec<Value>> {
        self.charge(items.len())?;
        self.eval_all(items)
    }

    fn eval_all(&mut self, items: &[Expr]) -> EvalResult<Vec<Value>> {
        items.iter().map(|item| self.eval(item)).collect()
    }

    fn comprehension(&mut self, comp: &Comprehension) -> EvalResult<Value> {
        let iterable = self.eval(&comp.iter)?;
        let source = self.iterate(iterable)?;
        let mut items = Vec::new();
        let mut dict = Dict::new();

        for element in source {
            self.bindings.push((comp.var.clone(), element));
            let produced = self.produce(comp, &mut items, &mut dict);
            self.bindings.pop();
            produced?;
        }

        Ok(match comp.kind {
            CollectionKind::List => Value::List(items),
            CollectionKind::Set => Value::set(items),
            CollectionKind::Dict => Value::Dict(dict),
        })
    }

    fn produce(
        &mut self,
        comp: &Comprehension,
        items: &mut Vec<Value>,
        dict: &mut Dict,
    ) -> EvalResult<()> {
        if let Some(filter) = &comp.filter
            && !self.eval(filter)?.truthy()
        {
            return Ok(());
        }
        let element = self.eval(&comp.element)?;
        self.charge(1)?;
        match &comp.value {
            Some(value) => {
                dict.insert(element.key_string(), self.eval(value)?);
            }
            None => items.push(element),
        }
        Ok(())
    }

    fn binary(&mut self, op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
        if let (Some(a), Some(b)) = (Num::of(&left), Num::of(&right)) {
            return arithmetic(op, a, b);
        }

        match (op, left, right) {
            (BinaryOp::Add, Value::Str(mut a), Value::Str(b)) => {
                self.charge(a.len() + b.len())?;
                a.push_str(&b);
                Ok(Value::Str(a))
            }
            (BinaryOp::Add, Value::List(a), Value::List(b)) => Ok(Value::List(self.concat(a, b)?)),
            (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
                Ok(Value::Tuple(self.concat(a, b)?))
            }
            (BinaryOp::Sub, Value::Set(a), Value::Set(b)) => {
                let removed: HashSet<String> = b.iter().map(Value::set_key).collect();
                Ok(Value::Set(
                    a.into_iter().filter(|item| !removed.contains(&item.set_key())).collect(),
                ))
            }
            (BinaryOp::Mul, left, right) => match self.repeat(&left, &right) {
                Some(result) => result,
                None => self
                    .repeat(&right, &left)
                    .unwrap_or_else(|| Err(unsupported("*", &left, &right))),
            },
            (op, left, right) => Err(unsupported(op.symbol(), &left, &right)),
        }
    }

    fn concat(&mut self, mut a: Vec<Value>, b: Vec<Value>) -> EvalResult<Vec<Value>> {
        self.charge(a.len() + b.len())?;
        a.extend(b);
        Ok(a)
    }

    /// `sequence * count`, or `None` when the operands do not have that shape.
    fn repeat(&mut self, sequence: &Value, count: &Value) -> Option<EvalResult<Value>> {
        let count = match count {
            Value::Int(i) => *i,
            Value::Bool(b) => i64::from(*b),
            _ => return None,
        };
        let times = usize::try_from(count).unwrap_or(0);
        let repeated = |items: &[Value]| {
            if items.is_empty() {
                return Vec::new();
            }
            let mut out = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                out.extend_from_slice(items);
            }
            out
        };

        Some(match sequence {
            Value::Str(s) => self
                .charge(s.len().saturating_mul(times))
                .map(|()| Value::Str(s.repeat(times))),
            Value::List(items) => self
                .charge(weight_of(items).saturating_mul(times))
                .map(|()| Value::List(repeated(items))),
            Value::Tuple(items) => self
                .charge(weight_of(items).saturating_mul(times))
                .map(|()| Value::Tuple(repeated(items))),
            _ => return None,
        })
    }

    /// Elements of an iterable; strings and dict keys are charged as new values.
    fn iterate(&mut self, value: Value) -> EvalResult<Vec<Value>> {
        match value {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items),
            Value::Dict(map) => {
                self.charge(map.len())?;
                Ok(map.into_keys().map(Value::Str).collect())
            }
            Value::Str(s) => {
                self.charge(s.len())?;
                Ok(s.chars().map(|c| Value::Str(c.to_string())).collect())
            }
            other => Err(EvalError::type_error(format!(
                "'{}' object is not iterable",
                other.kind_name()
            ))),
        }
    }

    fn call(&mut self, function: &str, args: Vec<Value>) -> EvalResult<Value> {
        match function {
            "range" => {
                let (start, step, count) = range_bounds(&args)?;
                self.charge(count)?;
                let mut items = Vec::with_capacity(count);
                let mut current = i128::from(start);
                for _ in 0..count {
                    items.push(Value::Int(i64::try_from(current).map_err(|_| EvalError::Overflow)?));
                    current += i128::from(step);
                }
                Ok(Value::List(items))
            }
            "len" => {
                let [value] = exactly::<1>("len", args)?;
                let len = match &value {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.len(),
                    Value::Dict(map) => map.len(),
                    other => {
                        return Err(EvalError::type_error(format!(
                            "object of type '{}' has no len()",
                            other.kind_name()
                        )));
                    }
                };
                i64::try_from(len).map(Value::Int).map_err(|_| EvalError::Overflow)
            }
            "min" => self.extreme("min", args, Ordering::Less),
            "max" => self.extreme("max", args, Ordering::Greater),
            "sum" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(EvalError::argument("sum", "expected 1 or 2 arguments"));
                }
                let mut args = args.into_iter();
                let items = self.iterate(args.next().unwrap_or_default())?;
                let start = args.next().unwrap_or(Value::Int(0));
                items
                    .into_iter()
                    .try_fold(start, |acc, item| self.binary(BinaryOp::Add, acc, item))
            }
            "abs" => {
                let [value] = exactly::<1>("abs", args)?;
                match Num::of(&value) {
                    Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
                    Some(Num::Float(x)) => Ok(Value::Float(x.abs())),
                    None => Err(EvalError::type_error(format!(
                        "bad operand type for abs(): '{}'",
                        value.kind_name()
                    ))),
                }
            }
            "list" => self.collection("list", args).map(Value::List),
            "tuple" => self.collection("tuple", args).map(Value::Tuple),
            "set" => self.collection("set", args).map(Value::set),
            "sorted" => {
                let [value] = exactly::<1>("sorted", args)?;
                let mut items = self.iterate(value)?;
                let mut failure = None;
                items.sort_by(|a, b| match order(a, b, "<") {
                    Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
                    Err(e) => {
                        failure.get_or_insert(e);
                        Ordering::Equal
                    }
                });
                failure.map_or(Ok(Value::List(items)), Err)
            }
            "int" => convert::<i64>("int", args, Value::Int(0), Value::Int),
            "float" => convert::<f64>("float", args, Value::Float(0.0), Value::Float),
            "str" => match <[Value; 1]>::try_from(args) {
                Ok([value]) => {
                    let text = value.to_string();
                    self.charge(text.len())?;
                    Ok(Value::Str(text))
                }
                Err(args) if args.is_empty() => Ok(Value::Str(String::new())),
                Err(_) => Err(EvalError::argument("str", "expected at most 1 argument")),
            },
            "bool" => match <[Value; 1]>::try_from(args) {
                Ok([value]) => Ok(Value::Bool(value.truthy())),
                Err(args) if args.is_empty() => Ok(Value::Bool(false)),
                Err(_) => Err(EvalError::argument("bool", "expected at most 1 argument")),
            },
            other => Err(EvalError::UnknownFunction(other.to_owned())),
        }
    }

    fn extreme(
        &mut self,
        function: &'static str,
        args: Vec<Value>,
        wanted: Ordering,
    ) -> EvalResult<Value> {
        let items = match <[Value; 1]>::try_from(args) {
            Ok([iterable]) => self.iterate(iterable)?,
            Err(args) => args,
        };

        let mut best: Option<Value> = None;
        for item in items {
            best = Some(match best {
                Some(current) if order(&item, &current, "<")? == Some(wanted) => item,
                Some(current) => current,
                None => item,
            });
        }
        best.ok_or_else(|| EvalError::argument(function, "arg is an empty sequence"))
    }

    fn collection(&mut self, function: &'static str, args: Vec<Value>) -> EvalResult<Vec<Value>> {
        match <[Value; 1]>::try_from(args) {
            Ok([value]) => self.iterate(value),
            Err(args) if args.is_empty() => Ok(Vec::new()),
            Err(_) => Err(EvalError::argument(function, "expected at most 1 argument")),
        }
    }
}

/// Elements held at every depth; string bytes count as elements.
fn weight(value: &Value) -> usize {
    match value {
        Value::Str(s) => s.len(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => weight_of(items),
        Value::Dict(map) => map
            .values()
            .fold(0usize, |acc, value| acc.saturating_add(1 + weight(value))),
        _ => 0,
    }
}

fn weight_of(items: &[Value]) -> usize {
    items
        .iter()
        .fold(0usize, |acc, item| acc.saturating_add(1 + weight(item)))
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(x) => Some(Num::Float(*x)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(x) => x,
        }
    }
}

fn unsupported(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.kind_name(),
        right.kind_name()
    ))
}

fn unary(op: UnaryOp, operand: Value) -> EvalResult<Value> {
    match (op, Num::of(&operand)) {
        (UnaryOp::Neg, Some(Num::Int(i))) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Some(Num::Float(x))) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Float(x))) => Ok(Value::Float(x)),
        (_, None) => Err(EvalError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            operand.kind_name()
        ))),
    }
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> EvalResult<Value> {
    if let (Num::Int(a), Num::Int(b)) = (a, b) {
        return int_arithmetic(op, a, b);
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if y == 0.0 => {
            return Err(EvalError::ZeroDivision);
        }
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod => {
            let r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }
        }
        BinaryOp::Pow => float_pow(x, y)?,
    };
    Ok(Value::Float(result))
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> EvalResult<Value> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Err(EvalError::ZeroDivision),
        BinaryOp::Div => return Ok(Value::Float(a as f64 / b as f64)),
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => return Err(EvalError::ZeroDivision),
        BinaryOp::FloorDiv => a.checked_div(b).map(|q| {
            if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q }
        }),
        BinaryOp::Mod => a.checked_rem(b).map(|r| {
            if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
        }),
        BinaryOp::Pow if b < 0 => {
            return float_pow(a as f64, b as f64).map(Value::Float);
        }
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
    };
    checked.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_pow(base: f64, exponent: f64) -> EvalResult<f64> {
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::ZeroDivision);
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(EvalError::type_error(
            "negative number cannot be raised to a fractional power",
        ));
    }
    Ok(base.powf(exponent))
}

// =============================================================================
// Comparison
// =============================================================================

/// Equality with numeric cross-type comparison (`1 == 1.0 == True`).
fn equals(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (Num::of(a), Num::of(b)) {
        return match (x, y) {
            (Num::Int(x), Num::Int(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        };
    }
    match (a, b) {
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| equals(l, r))
        }
        (Value::Set(x), Value::Set(y)) => {
            let keys: HashSet<String> = y.iter().map(Value::set_key).collect();
            x.len() == y.len() && x.iter().all(|item| keys.contains(&item.set_key()))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, value)| y.get(key).is_some_and(|other| equals(value, other)))
        }
        _ => a == b,
    }
}

/// Ordering of two values; `None` for unordered numbers such as NaN.
fn order(a: &Value, b: &Value, symbol: &str) -> EvalResult<Option<Ordering>> {
    if let (Some(x), Some(y)) = (Num::of(a), Num::of(b)) {
        return Ok(match (x, y) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            _ => x.as_f64().partial_cmp(&y.as_f64()),
        });
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            for (l, r) in x.iter().zip(y) {
                if !equals(l, r) {
                    return order(l, r, symbol);
                }
            }
            Ok(Some(x.len().cmp(&y.len())))
        }
        _ => Err(EvalError::type_error(format!(
            "'{symbol}' not supported between instances of '{}' and '{}'",
            a.kind_name(),
            b.kind_name()
        ))),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> EvalResult<bool> {
    let ordering = || order(left, right, op.symbol());
    Ok(match op {
        CompareOp::Eq => equals(left, right),
        CompareOp::Ne => !equals(left, right),
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
        CompareOp::Lt => ordering()? == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering()?, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering()? == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordering()?, Some(Ordering::Greater | Ordering::Equal)),
    })
}

fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.kind_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            Ok(items.iter().any(|candidate| equals(candidate, item)))
        }
        Value::Dict(map) => Ok(map.contains_key(&item.key_string())),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.kind_name()
        ))),
    }
}

// =============================================================================
// Indexing and builtins
// =============================================================================

fn subscript(target: Value, index: &Value) -> EvalResult<Value> {
    if let Value::Dict(mut map) = target {
        let key = index.key_string();
        return map.swap_remove(&key).ok_or(EvalError::KeyNotFound(key));
    }

    let position = match index {
        Value::Int(i) => *i,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(EvalError::type_error(format!(
                "indices must be integers, not {}",
                other.kind_name()
            )));
        }
    };
    let resolve = |len: usize| -> EvalResult<usize> {
        let len = i64::try_from(len).map_err(|_| EvalError::Overflow)?;
        let adjusted = if position < 0 { position + len } else { position };
        if (0..len).contains(&adjusted) {
            usize::try_from(adjusted).map_err(|_| EvalError::Overflow)
        } else {
            Err(EvalError::IndexOutOfRange(position))
        }
    };

    match target {
        Value::List(mut items) | Value::Tuple(mut items) => {
            let at = resolve(items.len())?;
            Ok(items.swap_remove(at))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[resolve(chars.len())?].to_string()))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.kind_name()
        ))),
    }
}

fn exactly<const N: usize>(function: &'static str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let got = args.len();
    <[Value; N]>::try_from(args).map_err(|_| {
        EvalError::argument(function, format!("expected {N} argument(s), got {got}"))
    })
}

fn int_arg(function: &'static str, value: &Value) -> EvalResult<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(EvalError::argument(
            function,
            format!("'{}' object cannot be interpreted as an integer", other.kind_name()),
        )),
    }
}

/// `(start, step, count)` for `range(...)` arguments.
fn range_bounds(args: &[Value]) -> EvalResult<(i64, i64, usize)> {
    let ints = args
        .iter()
        .map(|arg| int_arg("range", arg))
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match ints[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => return Err(EvalError::argument("range", "expected 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(EvalError::argument("range", "step must not be zero"));
    }

    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    let step_size = i128::from(step).abs();
    let count = if span <= 0 { 0 } else { (span + step_size - 1) / step_size };
    let count = usize::try_from(count).map_err(|_| EvalError::TooLarge { limit: MAX_ITEMS })?;
    Ok((start, step, count))
}

fn convert<T: FromValue>(
    function: &'static str,
    args: Vec<Value>,
    empty: Value,
    wrap: fn(T) -> Value,
) -> EvalResult<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([value]) => T::from_value(value)
            .map(wrap)
            .map_err(|e| EvalError::argument(function, e.to_string())),
        Err(args) if args.is_empty() => Ok(empty),
        Err(_) => Err(EvalError::argument(function, "expected at most 1 argument")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::parser::parse;

    fn eval(source: &str) -> EvalResult<Value> {
        evaluate(&parse(source)?)
    }

    fn list(items: &[i64]) -> Value {
        Value::List(items.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2"), Ok(Value::Int(3)));
        assert_eq!(eval("7 / 2"), Ok(Value::Float(3.5)));
        assert_eq!(eval("-7 // 2"), Ok(Value::Int(-4)));
        assert_eq!(eval("-7 % 3"), Ok(Value::Int(2)));
        assert_eq!(eval("7 % -3"), Ok(Value::Int(-2)));
        assert_eq!(eval("2 ** 10"), Ok(Value::Int(1024)));
        assert_eq!(eval("2 ** -1"), Ok(Value::Float(0.5)));
        assert_eq!(eval("-2 ** 2"), Ok(Value::Int(-4)));
        assert_eq!(eval("True + 1"), Ok(Value::Int(2)));
        assert_eq!(eval("1.5 * 2"), Ok(Value::Float(3.0)));
    }

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(eval("1 / 0"), Err(EvalError::ZeroDivision));
        assert_eq!(eval("1 // 0.0"), Err(EvalError::ZeroDivision));
        assert_eq!(eval("0 ** -1"), Err(EvalError::ZeroDivision));
        assert_eq!(eval("2 ** 100"), Err(EvalError::Overflow));
        assert!(matches!(eval("1 + 'a'"), Err(EvalError::Type(_))));
        assert!(matches!(eval("(-8) ** 0.5"), Err(EvalError::Type(_))));
    }

    #[test]
    fn test_sequences() {
        assert_eq!(eval("[1] + [2]"), Ok(list(&[1, 2])));
        assert_eq!(eval("[0] * 3"), Ok(list(&[0, 0, 0])));
        assert_eq!(eval("([1], 'a') * 2"), eval("([1], 'a', [1], 'a')"));
        assert_eq!(eval("[] * 1000000000000"), Ok(list(&[])));
        assert_eq!(eval("2 * 'ab'"), Ok(Value::Str("abab".into())));
        assert_eq!(eval("[1, 2, 3][-1]"), Ok(Value::Int(3)));
        assert_eq!(eval("{'a': 1}['a']"), Ok(Value::Int(1)));
        assert_eq!(eval("[1][5]"), Err(EvalError::IndexOutOfRange(5)));
        assert_eq!(eval("[0] * 2000000"), Err(EvalError::TooLarge { limit: MAX_ITEMS }));
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(eval("1 < 2 < 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("3 > 2 > 2"), Ok(Value::Bool(false)));
        assert_eq!(eval("1 == 1.0"), Ok(Value::Bool(true)));
        assert_eq!(eval("'b' in 'abc'"), Ok(Value::Bool(true)));
        assert_eq!(eval("4 not in [1, 2]"), Ok(Value::Bool(true)));
        assert_eq!(eval("0 or 'x'"), Ok(Value::Str("x".into())));
        assert_eq!(eval("1 and 0"), Ok(Value::Int(0)));
        assert_eq!(eval("not []"), Ok(Value::Bool(true)));
        assert!(matches!(eval("1 < 'a'"), Err(EvalError::Type(_))));
    }

    #[test]
    fn test_comprehensions() {
        assert_eq!(eval("[x * x for x in range(4)]"), Ok(list(&[0, 1, 4, 9])));
        assert_eq!(eval("[x for x in range(10) if x % 3 == 0]"), Ok(list(&[0, 3, 6, 9])));
        assert_eq!(eval("{x % 2 for x in range(5)}"), Ok(Value::Set(vec![Value::Int(0), Value::Int(1)])));

        let Value::Dict(dict) = eval("{str(i): i * 10 for i in range(2)}").unwrap() else {
            panic!("expected dict");
        };
        assert_eq!(dict["1"], Value::Int(10));
        assert_eq!(eval("sum(x for x in [1, 2, 3])"), Ok(Value::Int(6)));
        assert_eq!(eval("x"), Err(EvalError::UnknownName("x".into())));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(eval("range(5, 0, -2)"), Ok(list(&[5, 3, 1])));
        assert_eq!(eval("len('héllo')"), Ok(Value::Int(5)));
        assert_eq!(eval("max(3, 9, 4)"), Ok(Value::Int(9)));
        assert_eq!(eval("min([3, 9, 4])"), Ok(Value::Int(3)));
        assert_eq!(eval("sum([0.5, 1])"), Ok(Value::Float(1.5)));
        assert_eq!(eval("abs(-3)"), Ok(Value::Int(3)));
        assert_eq!(eval("sorted([3, 1, 2])"), Ok(list(&[1, 2, 3])));
        assert_eq!(eval("tuple('ab')"), Ok(Value::Tuple(vec![Value::Str("a".into()), Value::Str("b".into())])));
        assert_eq!(eval("int(3.9)"), Ok(Value::Int(3)));
        assert_eq!(eval("float('2.5')"), Ok(Value::Float(2.5)));
        assert_eq!(eval("str(1.0)"), Ok(Value::Str("1.0".into())));
        assert_eq!(eval("bool('')"), Ok(Value::Bool(false)));
        assert!(matches!(eval("range(1, 2, 0)"), Err(EvalError::Argument { function: "range", .. })));
        assert!(matches!(eval("max([])"), Err(EvalError::Argument { function: "max", .. })));
        assert_eq!(eval("open('x')"), Err(EvalError::UnknownFunction("open".into())));
    }

    #[test]
    fn test_size_budget_spans_nested_collections() {
        let too_large = Err(EvalError::TooLarge { limit: MAX_ITEMS });
        assert_eq!(eval("[[0] * 1000000] * 1000"), too_large);
        assert_eq!(eval("[[0] * 1000] * 1000"), too_large);
        assert_eq!(eval("[[0] * 600000, [0] * 600000]"), too_large);
        assert_eq!(eval("[[0] * 1000 for _ in range(1000)]"), too_large);
        assert_eq!(eval("'ab' * 600000"), too_large);
        assert_eq!(eval("len([[0] * 100] * 100)"), Ok(Value::Int(100)));
    }

    #[test]
    fn test_large_set_comprehension_stays_bounded() {
        assert_eq!(
            eval("{x for x in range(1000000)}"),
            Err(EvalError::TooLarge { limit: MAX_ITEMS })
        );
        assert_eq!(eval("len({x % 7 for x in range(400000)})"), Ok(Value::Int(7)));
        assert_eq!(eval("len(set(range(400000)))"), Ok(Value::Int(400000)));
    }

    #[test]
    fn test_comparison_errors_name_operator() {
        let Err(EvalError::Type(message)) = eval("[1] >= 'a'") else {
            panic!("expected a type error");
        };
        assert!(message.contains("'>='"), "{message}");
    }
}
