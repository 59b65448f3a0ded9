//! Machine values

use super::errors::{VmError, VmResult};
use crate::middle::codegen::ValType;
use std::fmt;

/// A value on the operand stack or in a local
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl Value {
    /// Initial value of a local of type `ty`
    pub fn zero(ty: ValType) -> Self {
        match ty {
            ValType::I32 => Value::I32(0),
            ValType::I64 => Value::I64(0),
            ValType::F64 => Value::F64(0.0),
        }
    }

    pub fn ty(&self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::I64(_) => ValType::I64,
            Value::F64(_) => ValType::F64,
        }
    }

    /// Decode a promise payload
    pub fn from_payload(
        bits: i64,
        ty: ValType,
    ) -> Self {
        match ty {
            ValType::I32 => Value::I32(bits as i32),
            ValType::I64 => Value::I64(bits),
            ValType::F64 => Value::F64(f64::from_bits(bits as u64)),
        }
    }

    fn mismatch(
        &self,
        expected: ValType,
    ) -> VmError {
        VmError::TypeMismatch {
            expected,
            found: self.ty(),
        }
    }

    pub fn as_i32(self) -> VmResult<i32> {
        match self {
            Value::I32(v) => Ok(v),
            other => Err(other.mismatch(ValType::I32)),
        }
    }

    pub fn as_i64(self) -> VmResult<i64> {
        match self {
            Value::I64(v) => Ok(v),
            other => Err(other.mismatch(ValType::I64)),
        }
    }

    pub fn as_f64(self) -> VmResult<f64> {
        match self {
            Value::F64(v) => Ok(v),
            other => Err(other.mismatch(ValType::F64)),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}
