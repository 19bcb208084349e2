//! Call-shape descriptors.
//!
//! A [`Signature`] describes the shape of one required operation: an ordered
//! list of parameter descriptors and a return descriptor. The engine treats
//! signatures opaquely and only ever compares them by value.
//!
//! Descriptors have a compact textual form used for parsing, display and
//! serialization:
//!
//! ```text
//! (T&) -> void
//! (const T&, size) -> Reference
//! () -> T
//! ```
//!
//! `T` is the placeholder for the erased type; it may be passed by value,
//! by reference (`T&`, `const T&`, `T&&`) or by pointer (`T*`, `const T*`).

use crate::error::ConceptError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the erased placeholder type is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Passing {
    /// `T`
    Value,
    /// `T&`
    Ref,
    /// `const T&`
    ConstRef,
    /// `T&&`
    RvalueRef,
    /// `T*`
    Ptr,
    /// `const T*`
    ConstPtr,
}

impl Passing {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "T",
            Self::Ref => "T&",
            Self::ConstRef => "const T&",
            Self::RvalueRef => "T&&",
            Self::Ptr => "T*",
            Self::ConstPtr => "const T*",
        }
    }
}

/// One parameter or return type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDesc {
    /// No value.
    Void,

    /// The erased type itself, in some passing form.
    Placeholder(Passing),

    /// Any other type, identified by name.
    ///
    /// Unchecked when built directly; [`TypeDesc::named`] and parsing only
    /// produce names that print and parse back to the same descriptor.
    Named(String),
}

impl TypeDesc {
    /// A named type; fails for names the textual form would read back as
    /// something else (`void`, `T&`, padded or punctuated names).
    pub fn named(name: impl Into<String>) -> Result<Self, ConceptError> {
        let name = name.into();
        match name.parse::<Self>() {
            Ok(Self::Named(parsed)) if parsed == name => Ok(Self::Named(name)),
            Ok(_) => Err(ConceptError::InvalidSignature {
                input: name,
                reason: "not a plain type name".to_string(),
            }),
            Err(err) => Err(err),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Placeholder(passing) => write!(f, "{}", passing.as_str()),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for TypeDesc {
    type Err = ConceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConceptError::InvalidSignature {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let passing = match s.trim() {
            "" => return Err(invalid("empty type descriptor")),
            "void" => return Ok(Self::Void),
            "T" => Passing::Value,
            "T&" => Passing::Ref,
            "const T&" => Passing::ConstRef,
            "T&&" => Passing::RvalueRef,
            "T*" => Passing::Ptr,
            "const T*" => Passing::ConstPtr,
            other => {
                if other.contains(['(', ')', ',']) || other.contains("->") {
                    return Err(invalid("type names may not contain `(`, `)`, `,` or `->`"));
                }
                return Ok(Self::Named(other.to_string()));
            }
        };
        Ok(Self::Placeholder(passing))
    }
}

impl TryFrom<String> for TypeDesc {
    type Error = ConceptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDesc> for String {
    fn from(value: TypeDesc) -> Self {
        value.to_string()
    }
}

/// The call shape of one required operation.
///
/// Equality is structural: two signatures are the same exactly when their
/// parameter lists and return descriptors are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    params: Vec<TypeDesc>,
    ret: TypeDesc,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = TypeDesc>, ret: TypeDesc) -> Self {
        Self {
            params: params.into_iter().collect(),
            ret,
        }
    }

    pub fn params(&self) -> &[TypeDesc] {
        &self.params
    }

    pub fn ret(&self) -> &TypeDesc {
        &self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl FromStr for Signature {
    type Err = ConceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConceptError::InvalidSignature {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let Some(rest) = s.trim().strip_prefix('(') else {
            return Err(invalid("expected `(` to open the parameter list"));
        };
        let Some((params, tail)) = rest.split_once(')') else {
            return Err(invalid("unclosed parameter list"));
        };
        let Some(ret) = tail.trim().strip_prefix("->") else {
            return Err(invalid("expected `->` before the return type"));
        };

        let params = if params.trim().is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(str::parse)
                .collect::<Result<Vec<TypeDesc>, _>>()?
        };

        Ok(Self {
            params,
            ret: ret.parse()?,
        })
    }
}

impl TryFrom<String> for Signature {
    type Error = ConceptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signature> for String {
    fn from(value: Signature) -> Self {
        value.to_string()
    }
}
