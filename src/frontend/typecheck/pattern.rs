//! Match patterns and exhaustiveness

use super::check::TypeChecker;
use super::errors::{TypeError, TypeResult};
use super::types::Type;
use crate::frontend::parser::ast::{MatchArm, Pattern, PatternKind};
use crate::util::span::Span;

impl TypeChecker<'_> {
    /// Check `pattern` against the scrutinee type; returns the binding it
    /// introduces, if any
    pub(super) fn check_pattern(
        &self,
        pattern: &Pattern,
        scrutinee: &Type,
    ) -> TypeResult<Option<(String, Type)>> {
        let literal_of = |expected: &str, ok: bool| {
            if ok {
                Ok(None)
            } else {
                Err(TypeError::Mismatch {
                    expected: scrutinee.to_string(),
                    found: expected.to_string(),
                    span: pattern.span,
                })
            }
        };
        match &pattern.kind {
            PatternKind::Wildcard => Ok(None),
            PatternKind::Binding(name) => {
                if self.symbols.variant_of(scrutinee, name).is_some() {
                    self.check_variant(None, name, None, scrutinee, pattern.span)
                } else {
                    Ok(Some((name.clone(), scrutinee.clone())))
                }
            }
            PatternKind::Int(value) => match scrutinee {
                Type::Int(kind) if kind.contains(*value) => Ok(None),
                Type::Int(_) => Err(TypeError::LiteralOutOfRange {
                    value: *value,
                    ty: scrutinee.clone(),
                    span: pattern.span,
                }),
                _ => literal_of("integer literal", *scrutinee == Type::Float),
            },
            PatternKind::Float(_) => literal_of("float literal", *scrutinee == Type::Float),
            PatternKind::Bool(_) => literal_of("bool literal", *scrutinee == Type::Bool),
            PatternKind::Str(_) => literal_of("string literal", *scrutinee == Type::Str),
            PatternKind::Variant {
                qualifier,
                name,
                payload,
            } => self.check_variant(
                qualifier.as_deref(),
                name,
                payload.as_deref(),
                scrutinee,
                pattern.span,
            ),
        }
    }

    fn check_variant(
        &self,
        qualifier: Option<&str>,
        name: &str,
        payload: Option<&Pattern>,
        scrutinee: &Type,
        span: Span,
    ) -> TypeResult<Option<(String, Type)>> {
        let payload_ty = match scrutinee {
            Type::Result(ok, err) if qualifier.is_none() && (name == "Ok" || name == "Err") => {
                Some(if name == "Ok" { (**ok).clone() } else { (**err).clone() })
            }
            Type::Enum(enum_name) => {
                if let Some(q) = qualifier {
                    if q != enum_name {
                        return Err(TypeError::Mismatch {
                            expected: enum_name.clone(),
                            found: q.to_string(),
                            span,
                        });
                    }
                }
                let Some(tag) = self.symbols.variant_of(scrutinee, name) else {
                    return Err(TypeError::Undefined {
                        what: "variant",
                        name: format!("{}::{}", enum_name, name),
                        span,
                    });
                };
                self.symbols.enums[enum_name].variants[tag].payload.clone()
            }
            _ => {
                return Err(TypeError::Mismatch {
                    expected: scrutinee.to_string(),
                    found: format!("variant pattern '{}'", name),
                    span,
                })
            }
        };

        match (payload, payload_ty) {
            (None, _) => Ok(None),
            (Some(inner), Some(ty)) => self.check_pattern(inner, &ty),
            (Some(_), None) => Err(TypeError::invalid(
                format!("variant '{}' has no payload", name),
                span,
            )),
        }
    }

    fn is_catch_all(
        &self,
        pattern: &Pattern,
        scrutinee: &Type,
    ) -> bool {
        match &pattern.kind {
            PatternKind::Wildcard => true,
            PatternKind::Binding(name) => self.symbols.variant_of(scrutinee, name).is_none(),
            _ => false,
        }
    }

    /// Reject a match that misses a variant and has no catch-all arm.
    /// A variant is covered when the payload patterns of its arms together
    /// cover the payload type.
    pub(super) fn check_exhaustive(
        &self,
        scrutinee: &Type,
        arms: &[MatchArm],
        span: Span,
    ) -> TypeResult<()> {
        let patterns: Vec<&Pattern> = arms.iter().map(|arm| &arm.pattern).collect();
        let missing = match scrutinee {
            Type::Enum(_) | Type::Result(..) | Type::Bool => self.missing(&patterns, scrutinee),
            other if patterns.iter().any(|p| self.is_catch_all(p, other)) => Vec::new(),
            other => vec![format!("values of type {}", other)],
        };

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TypeError::NonExhaustive {
                missing: missing.join(", "),
                span,
            })
        }
    }

    /// Values of `ty` none of `patterns` matches, rendered as patterns
    fn missing(
        &self,
        patterns: &[&Pattern],
        ty: &Type,
    ) -> Vec<String> {
        if patterns.iter().any(|p| self.is_catch_all(p, ty)) {
            return Vec::new();
        }
        match ty {
            Type::Enum(enum_name) => {
                let Some(shape) = self.symbols.enums.get(enum_name) else {
                    return Vec::new();
                };
                shape
                    .variants
                    .iter()
                    .flat_map(|v| {
                        self.missing_variant(patterns, ty, &v.name)
                            .into_iter()
                            .map(move |rest| format!("{}::{}{}", enum_name, v.name, rest))
                    })
                    .collect()
            }
            Type::Result(..) => ["Ok", "Err"]
                .into_iter()
                .flat_map(|v| {
                    self.missing_variant(patterns, ty, v)
                        .into_iter()
                        .map(move |rest| format!("{}{}", v, rest))
                })
                .collect(),
            Type::Bool => [true, false]
                .into_iter()
                .filter(|b| !patterns.iter().any(|p| p.kind == PatternKind::Bool(*b)))
                .map(|b| b.to_string())
                .collect(),
            _ => vec!["_".to_string()],
        }
    }

    /// Missing cases of one variant: `[""]` when no arm names it, the
    /// uncovered payloads as `"(p)"` otherwise
    fn missing_variant(
        &self,
        patterns: &[&Pattern],
        ty: &Type,
        variant: &str,
    ) -> Vec<String> {
        let mut named = false;
        let mut payloads = Vec::new();
        for pattern in patterns {
            match &pattern.kind {
                PatternKind::Binding(name) if name == variant => return Vec::new(),
                PatternKind::Variant { name, payload, .. } if name == variant => match payload {
                    None => return Vec::new(),
                    Some(inner) => {
                        named = true;
                        payloads.push(&**inner);
                    }
                },
                _ => {}
            }
        }
        if !named {
            return match self.payload_type(ty, variant) {
                Some(_) if matches!(ty, Type::Result(..)) => vec!["(_)".to_string()],
                _ => vec![String::new()],
            };
        }
        match self.payload_type(ty, variant) {
            Some(payload_ty) => self
                .missing(&payloads, &payload_ty)
                .into_iter()
                .map(|inner| format!("({})", inner))
                .collect(),
            None => Vec::new(),
        }
    }

    fn payload_type(
        &self,
        scrutinee: &Type,
        variant: &str,
    ) -> Option<Type> {
        match scrutinee {
            Type::Result(ok, _) if variant == "Ok" => Some((**ok).clone()),
            Type::Result(_, err) if variant == "Err" => Some((**err).clone()),
            Type::Enum(enum_name) => {
                let shape = self.symbols.enums.get(enum_name)?;
                let tag = shape.variant_index(variant)?;
                shape.variants[tag].payload.clone()
            }
            _ => None,
        }
    }
}
