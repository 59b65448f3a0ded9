//! Literal layout read back from the data region

use super::*;
use crate::middle::codegen::DataSegment;
use proptest::prelude::*;

fn word(
    bytes: &[u8],
    slot: usize,
) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[slot * 8..slot * 8 + 8]);
    out
}

fn u32_at(
    bytes: &[u8],
    at: usize,
) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Decode an array template: `(len, cap, slots)`
fn decode_array(segment: &DataSegment) -> (u32, u32, Vec<[u8; 8]>) {
    let bytes = &segment.bytes;
    let len = u32_at(bytes, 0);
    let cap = u32_at(bytes, 4);
    let slots = (0..len as usize).map(|i| word(bytes, i + 1)).collect();
    (len, cap, slots)
}

#[test]
fn test_array_literal_layout() {
    let module = compile("fn main() -> i32 { let a = [1, 2, 3]; return a[2]; }");
    assert_eq!(module.data.len(), 1);
    let (len, cap, slots) = decode_array(&module.data[0]);
    assert_eq!(len, 3);
    assert!(cap >= 3);
    let values: Vec<i32> = slots
        .iter()
        .map(|w| i32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
    assert_eq!(module.data[0].bytes.len(), 8 + 8 * cap as usize);
}

#[test]
fn test_array_capacity_follows_config() {
    let config = CompileConfig {
        default_array_capacity: 16,
        ..CompileConfig::default()
    };
    let module = Compiler::with_config(config)
        .compile("let a = [7];")
        .unwrap();
    let (len, cap, _) = decode_array(&module.data[0]);
    assert_eq!((len, cap), (1, 16));
}

#[test]
fn test_struct_fields_use_word_stride() {
    let module = compile(
        "struct P { a: i32, b: i64, c: f64, d: bool }
         fn main() -> i64 { let p = P { c: 2.5, a: -4, d: true, b: 9 }; return p.b; }",
    );
    let bytes = &module.data[0].bytes;
    assert_eq!(bytes.len(), 32);
    assert_eq!(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), -4);
    assert_eq!(i64::from_le_bytes(word(bytes, 1)), 9);
    assert_eq!(f64::from_le_bytes(word(bytes, 2)), 2.5);
    assert_eq!(bytes[24], 1);

    let main = function(&module, "main");
    assert!(main.body.contains(&Instr::Load {
        kind: crate::middle::codegen::MemKind::I64,
        offset: 8,
    }));
}

#[test]
fn test_string_literals_are_interned() {
    let module = compile("let a = \"same\"; let b = \"same\"; let c = \"other\";");
    let strings: Vec<&DataSegment> = module
        .data
        .iter()
        .filter(|d| u32_at(&d.bytes, 0) as usize + 4 == d.bytes.len())
        .collect();
    assert_eq!(strings.len(), 2);
    assert_eq!(&strings[0].bytes[4..], b"same");
    assert!(module.heap_base >= strings[1].offset + strings[1].bytes.len() as u32);
    assert_eq!(module.heap_base % 8, 0);
}

#[test]
fn test_data_region_starts_at_base() {
    let config = CompileConfig {
        data_base: 4096,
        ..CompileConfig::default()
    };
    let module = Compiler::with_config(config).compile("let s = \"x\";").unwrap();
    assert_eq!(module.data[0].offset, 4096);
}

proptest! {
    #[test]
    fn prop_array_literal_round_trips(values in prop::collection::vec(-100_000i32..100_000, 1..12)) {
        let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let source = format!("let a = [{}];", list.join(", "));
        let module = compile(&source);
        let (len, cap, slots) = decode_array(&module.data[0]);
        prop_assert_eq!(len as usize, values.len());
        prop_assert!(cap as usize >= values.len());
        let decoded: Vec<i32> = slots
            .iter()
            .map(|w| i32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn prop_compilation_is_deterministic(a in 0i64..1_000_000, b in 0i64..1_000_000) {
        let source = format!(
            "fn main() -> i64 {{ let x: i64 = {}; let y: i64 = {}; return x * y + [x, y][1]; }}",
            a, b
        );
        prop_assert_eq!(compile(&source), compile(&source));
    }
}
