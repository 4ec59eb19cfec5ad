//! Index references into a call: `this`/`base`, `result`, an argument
//! position, optionally narrowed to the array elements (`[*]`) or a field
//! (`.name`) of the referenced value.

use crate::config::{ConfigError, ConfigResult};
use crate::shared::models::{FieldId, Invoke, MethodId, MethodIr, Program, Type, VarId};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Index {
    Base,
    Result,
    Arg(usize),
}

impl Index {
    /// Variable at this index of a call site
    pub fn call_var(self, invoke: &Invoke) -> Option<VarId> {
        match self {
            Index::Base => invoke.base,
            Index::Result => invoke.result,
            Index::Arg(i) => invoke.args.get(i).copied(),
        }
    }

    /// Variable at this index inside the callee body; `Result` has none
    pub fn param_var(self, ir: &MethodIr) -> Option<VarId> {
        match self {
            Index::Base => ir.this,
            Index::Result => None,
            Index::Arg(i) => ir.params.get(i).copied(),
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Base => write!(f, "base"),
            Index::Result => write!(f, "result"),
            Index::Arg(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IndexKind {
    Var,
    Array,
    Field(FieldId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IndexRef {
    pub index: Index,
    pub kind: IndexKind,
}

impl IndexRef {
    pub fn var(index: Index) -> Self {
        Self {
            index,
            kind: IndexKind::Var,
        }
    }

    /// Parse `text` against the signature of `method`
    pub fn parse(program: &Program, method: MethodId, text: &str) -> ConfigResult<Self> {
        let invalid = |reason: String| ConfigError::InvalidIndexRef {
            value: text.to_string(),
            method: program.method_signature(method),
            reason,
        };
        let (base, kind) = if let Some(base) = text.strip_suffix("[*]") {
            (base, Some(Suffix::Array))
        } else if let Some((base, field)) = text.split_once('.') {
            (base, Some(Suffix::Field(field)))
        } else {
            (text, None)
        };
        let m = program.method(method);
        let index = match base.trim() {
            "this" | "base" => {
                if m.is_static() {
                    return Err(invalid("static method has no receiver".into()));
                }
                Index::Base
            }
            "result" => {
                if m.return_type == Type::Void {
                    return Err(invalid("method returns void".into()));
                }
                Index::Result
            }
            other => {
                let i: usize = other
                    .parse()
                    .map_err(|_| invalid("expected an integer, this, base or result".into()))?;
                if i >= m.param_types.len() {
                    return Err(invalid(format!(
                        "method has {} parameter(s)",
                        m.param_types.len()
                    )));
                }
                Index::Arg(i)
            }
        };
        let ty = index_type(program, method, index);
        let kind = match kind {
            None => IndexKind::Var,
            Some(Suffix::Array) => {
                if !matches!(ty, Type::Array(_)) {
                    return Err(invalid(format!(
                        "[*] needs an array, found {}",
                        program.type_name(&ty)
                    )));
                }
                IndexKind::Array
            }
            Some(Suffix::Field(name)) => {
                let field = ty
                    .as_class()
                    .and_then(|c| program.lookup_field(c, name))
                    .ok_or_else(|| {
                        invalid(format!("no field '{name}' in {}", program.type_name(&ty)))
                    })?;
                IndexKind::Field(field)
            }
        };
        Ok(Self { index, kind })
    }
}

impl IndexRef {
    /// Declared type of the designated value: the element type for `[*]`,
    /// the field type for `.field`
    pub fn value_type(self, program: &Program, method: MethodId) -> Type {
        let ty = index_type(program, method, self.index);
        match self.kind {
            IndexKind::Var => ty,
            IndexKind::Array => ty.element_type().cloned().unwrap_or(ty),
            IndexKind::Field(field) => program.field(field).ty.clone(),
        }
    }
}

enum Suffix<'a> {
    Array,
    Field(&'a str),
}

/// Declared type at `index` of `method`
pub fn index_type(program: &Program, method: MethodId, index: Index) -> Type {
    let m = program.method(method);
    match index {
        Index::Base => Type::Class(m.declaring_class),
        Index::Result => m.return_type.clone(),
        Index::Arg(i) => m.param_types.get(i).cloned().unwrap_or(Type::Null),
    }
}

impl fmt::Display for IndexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IndexKind::Var => write!(f, "{}", self.index),
            IndexKind::Array => write!(f, "{}[*]", self.index),
            IndexKind::Field(field) => write!(f, "{}.{}", self.index, field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{MethodFlags, ProgramBuilder};

    fn fixture() -> (Program, MethodId, MethodId, FieldId) {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let string = b.add_class("java.lang.String", Some(object));
        let holder = b.add_class("Holder", Some(object));
        let sub = b.add_class("SubHolder", Some(holder));
        let value = b.add_field(holder, "value", Type::Class(string), false);
        let put = b.add_method(
            holder,
            "put",
            vec![Type::array_of(Type::Class(string)), Type::Class(sub)],
            Type::Class(string),
            MethodFlags::instance(),
        );
        let util = b.add_method(holder, "util", vec![], Type::Void, MethodFlags::static_());
        (b.build(), put, util, value)
    }

    #[test]
    fn test_parse_forms() {
        let (program, put, _, value) = fixture();
        let parse = |t| IndexRef::parse(&program, put, t).unwrap();
        assert_eq!(parse("base"), IndexRef::var(Index::Base));
        assert_eq!(parse("this"), IndexRef::var(Index::Base));
        assert_eq!(parse("result"), IndexRef::var(Index::Result));
        assert_eq!(parse("1"), IndexRef::var(Index::Arg(1)));
        assert_eq!(parse("0[*]").kind, IndexKind::Array);
        // field looked up through the superclass of SubHolder
        assert_eq!(parse("1.value").kind, IndexKind::Field(value));
    }

    #[test]
    fn test_value_type_follows_suffix() {
        let (program, put, _, _) = fixture();
        let string = Type::Class(program.class_by_name("java.lang.String").unwrap());
        let ty = |t| IndexRef::parse(&program, put, t).unwrap().value_type(&program, put);
        assert_eq!(ty("0"), Type::array_of(string.clone()));
        assert_eq!(ty("0[*]"), string);
        assert_eq!(ty("1.value"), string);
        assert_eq!(ty("base"), Type::Class(program.class_by_name("Holder").unwrap()));
    }

    #[test]
    fn test_parse_rejects() {
        let (program, put, util, _) = fixture();
        for bad in ["2", "x", "1[*]", "0.value", "1.missing"] {
            assert!(
                matches!(
                    IndexRef::parse(&program, put, bad),
                    Err(ConfigError::InvalidIndexRef { .. })
                ),
                "{bad} should be rejected"
            );
        }
        assert!(IndexRef::parse(&program, util, "base").is_err());
        assert!(IndexRef::parse(&program, util, "result").is_err());
    }
}
