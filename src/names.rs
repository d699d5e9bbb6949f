use std::fs;
use std::path::Path;
use std::collections::HashMap;

use serde::Deserialize;

use super::error::Result;


#[derive(Deserialize,Debug)]
struct CountryCode {
    en: String,
    cn: String,
}

/// English region name to display name.
#[derive(Default,Debug,Clone)]
pub struct NameTable(HashMap<String,String>);

impl NameTable {

    pub fn load(path: &Path) -> Result<Self> {
	Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
	let codes : Vec<CountryCode> = serde_json::from_str(text)?;
	Ok(Self(codes.into_iter().map(|c| (c.en, c.cn)).collect()))
    }

    pub fn len(&self) -> usize {
	self.0.len()
    }

    pub fn translate(&self, name: &str) -> Option<&str> {
	self.0.get(&name.replace('_', " ")).map(|n| n.as_str())
    }

    pub fn display_name(&self, name: &str) -> String {
	self.translate(name).unwrap_or(name).to_string()
    }

}
