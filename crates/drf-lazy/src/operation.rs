use std::borrow::Cow;
use std::fmt;

/// One argument to a target operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    U64(u64),
    I64(i64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
}

impl Arg {
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            Self::I64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<u64> for Arg {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<u32> for Arg {
    fn from(v: u32) -> Self {
        Self::U64(u64::from(v))
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U64(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// A named target operation with its captured arguments.
///
/// Operations are data, not closures: the binding checks the name
/// against [`LazyTarget::OPERATIONS`](crate::LazyTarget::OPERATIONS)
/// when it is configured, and the target dispatches on it when invoked.
///
/// ```text
///   Operation::new("parse").arg(64 * 1024 * 1024_u64).arg(true)
///   // displays as: parse(67108864, true)
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    name: Cow<'static, str>,
    args: Vec<Arg>,
}

impl Operation {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    #[must_use]
    pub fn u64_arg(&self, index: usize) -> Option<u64> {
        self.args.get(index).and_then(Arg::as_u64)
    }

    #[must_use]
    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        self.args.get(index).and_then(Arg::as_bool)
    }
}

impl From<&'static str> for Operation {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_displays() {
        let op = Operation::new("parse").arg(1024u64).arg(true).arg("rgb8");
        assert_eq!(op.name(), "parse");
        assert_eq!(op.u64_arg(0), Some(1024));
        assert_eq!(op.bool_arg(1), Some(true));
        assert_eq!(op.to_string(), r#"parse(1024, true, "rgb8")"#);
    }

    #[test]
    fn typed_accessors_miss_on_wrong_kind() {
        let op = Operation::new("skip").arg(-1i64).arg(vec![1u8, 2]);
        assert_eq!(op.u64_arg(0), None);
        assert_eq!(op.bool_arg(1), None);
        assert_eq!(op.u64_arg(5), None);
        assert_eq!(op.to_string(), "skip(-1, <2 bytes>)");
    }
}
