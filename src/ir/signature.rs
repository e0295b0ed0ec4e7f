//! Method subsignatures, e.g. `void foo(A,int[])`.
//! A subsignature identifies a method inside a class, dispatch looks methods up by it.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static SUBSIGNATURE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([\w.$\[\]<>]+)\s+([\w$<>]+)\s*\(\s*([\w.$\[\]<>,\s]*)\)\s*$").unwrap()
});

static TYPE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.$<>]+(\[\])*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subsignature {
    pub return_type: String,
    pub name: String,
    pub params: Vec<String>,
}

impl Subsignature {
    pub fn new(return_type: &str, name: &str, params: &[&str]) -> Self {
        Self {
            return_type: return_type.to_owned(),
            name: name.to_owned(),
            params: params.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl FromStr for Subsignature {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = SUBSIGNATURE_REGEX
            .captures(s)
            .ok_or_else(|| anyhow!("malformed method subsignature: {:?}", s))?;
        let params_str = caps[3].trim();
        let mut params = Vec::new();
        if !params_str.is_empty() {
            for param in params_str.split(',') {
                let param = param.trim();
                if !TYPE_NAME_REGEX.is_match(param) {
                    return Err(anyhow!(
                        "malformed parameter type {:?} in subsignature {:?}",
                        param,
                        s
                    ));
                }
                params.push(param.to_owned());
            }
        }
        Ok(Self {
            return_type: caps[1].to_owned(),
            name: caps[2].to_owned(),
            params,
        })
    }
}

impl fmt::Display for Subsignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.return_type, self.name, self.params.join(","))
    }
}
