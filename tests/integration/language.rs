//! Language features executed end to end

use crate::support::{i32_of, run, value};
use wavelet::Value;

#[test]
fn test_closures_capture_by_value() {
    let source = "fn make(base: i32) -> fn(i32) -> i32 {
            let scale = 3;
            let f = fn(x: i32) => x * scale + base;
            scale = 100;
            return f;
        }
        fn main() -> i32 { let f = make(1); return f(2) + f(10); }";
    assert_eq!(i32_of(source), 7 + 31);
}

#[test]
fn test_named_function_values() {
    let source = "fn double(x: i32) -> i32 { return x * 2; }
        fn twice(f: fn(i32) -> i32, x: i32) -> i32 { return f(f(x)); }
        fn main() -> i32 { let g: fn(i32) -> i32 = double; return twice(g, 3) + twice(fn(x: i32) => x - 1, 3); }";
    assert_eq!(i32_of(source), 12 + 1);
}

#[test]
fn test_question_mark_propagates() {
    let source = "fn parse_digit(s: string) -> Result<i32, string> {
            if s == \"1\" { return Ok(1); }
            if s == \"2\" { return Ok(2); }
            return Err(\"bad digit\");
        }
        fn sum(a: string, b: string) -> Result<i32, string> {
            let x = parse_digit(a)?;
            let y = parse_digit(b)?;
            return Ok(x + y);
        }
        fn show(r: Result<i32, string>) -> string {
            return match r { Ok(v) => \"ok {v}\", Err(e) => \"err {e}\" };
        }
        fn main() { print(show(sum(\"1\", \"2\"))); print(show(sum(\"1\", \"x\"))); }";
    assert_eq!(
        run(source).output,
        vec!["ok 3".to_string(), "err bad digit".to_string()]
    );
}

#[test]
fn test_nested_break_and_continue() {
    let source = "fn main() -> i32 {
            let count = 0;
            let i = 0;
            while i < 10 {
                i += 1;
                if i == 3 { continue; }
                let j = 0;
                while true {
                    j += 1;
                    if j > i { break; }
                    if j % 2 == 0 { continue; }
                    count += 1;
                }
                if i == 8 { break; }
            }
            return count;
        }";
    // odd j in 1..=i for i in 1..=8 except 3
    let expected: i32 = (1..=8)
        .filter(|i| *i != 3)
        .map(|i| (1..=i).filter(|j| j % 2 == 1).count() as i32)
        .sum();
    assert_eq!(i32_of(source), expected);
}

#[test]
fn test_array_growth_past_capacity() {
    let source = "fn main() -> i32 {
            let xs = [7];
            let i = 0;
            while i < 40 { xs.push(i); i += 1; }
            let total = 0;
            for x in xs { total += x; }
            return total * 1000 + xs.len();
        }";
    assert_eq!(i32_of(source), (7 + (0..40).sum::<i32>()) * 1000 + 41);
}

#[test]
fn test_array_pop_and_field_arrays() {
    let source = "struct Stack { items: [i64] }
        fn main() -> i64 {
            let s = Stack { items: [] };
            s.items.push(5);
            s.items.push(9);
            let top = s.items.pop();
            return top * 10 + s.items.len() as i64;
        }";
    assert_eq!(value(source), Value::I64(91));
}

#[test]
fn test_struct_methods_and_fields() {
    let source = "struct Point {
            x: f64,
            y: f64,
            fn origin() -> Point { return Point { x: 0.0, y: 0.0 }; }
            fn dot(self, other: Point) -> f64 { return self.x * other.x + self.y * other.y; }
        }
        fn main() -> f64 {
            let p = Point::origin();
            p.x = 3.0;
            p.y = 4.0;
            return p.dot(p);
        }";
    assert_eq!(value(source), Value::F64(25.0));
}

#[test]
fn test_interpolation_and_string_ops() {
    let source = "fn main() {
            let who = \"wave\";
            who += \"let\";
            let same = who == \"wavelet\";
            let big: i64 = 9000000000;
            let small: u8 = 200;
            print(\"{who} {big} {small} {1.25} {same}\");
        }";
    assert_eq!(
        run(source).output,
        vec!["wavelet 9000000000 200 1.25 true".to_string()]
    );
}

#[test]
fn test_string_match_and_equality() {
    let source = "fn kind(s: string) -> i32 { return match s { \"a\" => 1, \"bb\" => 2, _ => 0 }; }
        fn main() -> i32 { return kind(\"a\") * 100 + kind(\"b\" + \"b\") * 10 + kind(\"c\"); }";
    assert_eq!(i32_of(source), 120);
}

#[test]
fn test_unsigned_and_wide_arithmetic() {
    let source = "fn main() -> i64 {
            let a: u32 = 4000000000;
            let b: u32 = a / 3;
            let c: i64 = 8;
            return (b as i64) + c;
        }";
    assert_eq!(value(source), Value::I64(4_000_000_000 / 3 + 8));
}

#[test]
fn test_script_and_main_share_output() {
    let source = "let greeting = \"hi\"; print(greeting); fn main() { print(\"main\"); }";
    assert_eq!(run(source).output, vec!["hi".to_string(), "main".to_string()]);
}

#[test]
fn test_block_lambda_takes_expected_return_type() {
    let source = "fn apply(f: fn(i32) -> i32, x: i32) -> i32 { return f(x); }
        fn main() -> i32 {
            let base = 40;
            return apply(fn(x: i32) { return x + base; }, 2);
        }";
    assert_eq!(i32_of(source), 42);
}

#[test]
fn test_break_and_continue_inside_match_arms() {
    let source = "fn main() -> i32 {
            let i = 0;
            let total = 0;
            while true {
                i += 1;
                let n = match i { 5 => { break; }, 2 => { continue; }, _ => i };
                total += n;
            }
            return total * 10 + i;
        }";
    assert_eq!(i32_of(source), (1 + 3 + 4) * 10 + 5);
}

#[test]
fn test_nested_payload_match() {
    let source = "enum Reading { Value(i32), Missing }
        fn score(r: Result<Reading, string>) -> i32 {
            return match r { Ok(Reading::Value(v)) => v, Ok(Missing) => -1, Err(_) => -2 };
        }
        fn main() -> i32 {
            let a = score(Ok(Reading::Value(7)));
            let b = score(Ok(Reading::Missing));
            let c = score(Err(\"offline\"));
            return a * 100 + b * 10 + c;
        }";
    assert_eq!(i32_of(source), 700 - 10 - 2);
}
