use crate::error::DocDiffError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A document mutation, as embedded in a [`guarantor_change::Change`]'s `opcode`/`opdata`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    pub opcode: Opcode,
    pub opdata: Value,
}

/// The four opcodes this codebase's changes may carry. `DictDiff`, `Set` and `Del` are reserved —
/// recognized on decode so a change from a peer using them round-trips, but nothing here ever
/// produces or applies one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Opcode {
    Reset,
    DictDiff,
    Set,
    Del,
}

impl Opcode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Reset => "reset",
            Opcode::DictDiff => "dictdiff",
            Opcode::Set => "set",
            Opcode::Del => "del",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Opcode {
    type Err = DocDiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(Opcode::Reset),
            "dictdiff" => Ok(Opcode::DictDiff),
            "set" => Ok(Opcode::Set),
            "del" => Ok(Opcode::Del),
            other => Err(DocDiffError::UnknownOpcode(other.to_owned())),
        }
    }
}

impl Operation {
    pub fn from_parts(opcode: &str, opdata: Value) -> Result<Self, DocDiffError> {
        Ok(Self {
            opcode: opcode.parse()?,
            opdata,
        })
    }
}
