use crate::{ChangeError, ChangeId};
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

/// A lexicographically sortable revision token:
/// `YYYYMMDDhhmm_<root8>_<revhex8>_<changeid8>_<doctype_sanitized>`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Rev(String);

struct Parts<'a> {
    root8: &'a str,
    revhex8: &'a str,
}

impl Rev {
    /// Builds the root revision of a new chain: `revhex = 0`, `root8 = change_id[0:8]`.
    pub fn root(doctype: &str, change_id: &ChangeId) -> Self {
        Self::build(doctype, change_id.prefix8(), 0, change_id.prefix8())
    }

    /// Builds the next revision in a chain, incrementing `revhex` and carrying `root8` forward.
    pub fn increment(&self, doctype: &str, change_id: &ChangeId) -> Result<Self, ChangeError> {
        let parts = self.parts()?;
        let revhex = u32::from_str_radix(parts.revhex8, 16)
            .map_err(|_| ChangeError::Validation(format!("malformed rev: {}", self.0)))?;
        Ok(Self::build(
            doctype,
            parts.root8,
            revhex.wrapping_add(1),
            change_id.prefix8(),
        ))
    }

    fn build(doctype: &str, root8: &str, revhex: u32, changeid8: &str) -> Self {
        let timestamp = Utc::now().format("%Y%m%d%H%M");
        let doctype_sanitized = sanitize_doctype(doctype);
        Self(format!(
            "{timestamp}_{root8}_{revhex:08x}_{changeid8}_{doctype_sanitized}",
            timestamp = timestamp,
            root8 = root8,
            revhex = revhex,
            changeid8 = changeid8,
            doctype_sanitized = doctype_sanitized,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Result<Parts<'_>, ChangeError> {
        let mut it = self.0.splitn(5, '_');
        let (_timestamp, root8, revhex8, _changeid8, _doctype) =
            match (it.next(), it.next(), it.next(), it.next(), it.next()) {
                (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
                _ => return Err(ChangeError::Validation(format!("malformed rev: {}", self.0))),
            };
        Ok(Parts { root8, revhex8 })
    }

    /// The `root8` component: `change_id[0:8]` of the chain's root change.
    pub fn root8(&self) -> Result<String, ChangeError> {
        Ok(self.parts()?.root8.to_owned())
    }
}

fn sanitize_doctype(doctype: &str) -> String {
    doctype
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

impl fmt::Display for Rev {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rev {
    type Err = ChangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rev = Self(s.to_owned());
        rev.parts()?;
        Ok(rev)
    }
}
