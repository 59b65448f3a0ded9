//! Property tests over generated programs

use proptest::prelude::*;
use wavelet::{compile, Value};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Array literals read back element by element after compile and run
    #[test]
    fn prop_array_literal_survives_execution(items in prop::collection::vec(-1000i32..1000, 1..12)) {
        let literal = items.iter().map(i32::to_string).collect::<Vec<_>>().join(", ");
        let mut checks = String::new();
        for (i, item) in items.iter().enumerate() {
            checks.push_str(&format!("if xs[{i}] != {item} {{ return {i}; }}\n"));
        }
        let source = format!(
            "fn main() -> i32 {{ let xs = [{literal}]; {checks} return 0 - xs.len(); }}"
        );
        let value = wavelet::run(&source).unwrap().value;
        prop_assert_eq!(value, Some(Value::I32(-(items.len() as i32))));
    }

    /// Struct fields keep their values whatever their types
    #[test]
    fn prop_struct_fields_round_trip(a in -1_000_000i32..1_000_000, b in -(1i64 << 50)..(1i64 << 50), c in -1.0e9f64..1.0e9) {
        let source = format!(
            "struct R {{ a: i32, b: i64, c: f64 }}
             fn main() -> f64 {{
                let r = R {{ a: 0, b: 0, c: 0.0 }};
                r.a = {a}; r.b = {b}; r.c = {c:?};
                if r.a != {a} {{ return -1.0; }}
                if r.b != {b} {{ return -2.0; }}
                return r.c;
             }}"
        );
        let value = wavelet::run(&source).unwrap().value;
        prop_assert_eq!(value, Some(Value::F64(c)));
    }

    /// Compiling the same text twice yields identical modules
    #[test]
    fn prop_compile_is_idempotent(n in 0i32..50, name in "[a-z]{1,8}") {
        let source = format!(
            "fn {name}_f(x: i32) -> i32 {{ return x * {n}; }} fn main() -> i32 {{ let s = \"{name}\"; return {name}_f(s.len()); }}"
        );
        let first = compile(&source).unwrap();
        let second = compile(&source).unwrap();
        prop_assert_eq!(first.to_wat(), second.to_wat());
        prop_assert_eq!(first, second);
    }
}
