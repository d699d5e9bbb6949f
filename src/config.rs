use std::fs;
use std::path::{Path,PathBuf};

use chrono::naive::NaiveDate;
use log::info;
use serde::Deserialize;

use super::error::Result;
use super::frame::TraceParams;


#[derive(Deserialize,Debug,Clone,Default)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub data: DataSettings,
    pub plot: PlotSettings,
}

#[derive(Deserialize,Debug,Clone)]
#[serde(default, deny_unknown_fields)]
pub struct DataSettings {
    pub input: PathBuf,
    pub names: Option<PathBuf>,
    /// Fetched into `input` when that file does not exist yet.
    pub download_url: Option<String>,
}

#[derive(Deserialize,Debug,Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PlotSettings {
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub start_date: Option<NaiveDate>,
    pub trace_length: usize,
    pub off_day: usize,
    pub threshold: i64,
    pub mortality_floor: f64,
    pub width: u32,
    pub height: u32,
    pub dpi: f64,
    pub font_family: String,
    pub font_size: f64,
    pub x_title: String,
    pub y_title: String,
    pub transliterate_labels: bool,
}

impl Default for DataSettings {
    fn default() -> Self {
	Self {
	    input: PathBuf::from("covid_cases.csv"),
	    names: Some(PathBuf::from("countrycode.json")),
	    download_url: None,
	}
    }
}

impl Default for PlotSettings {
    fn default() -> Self {
	Self {
	    output_dir: PathBuf::from("pic_tmp"),
	    file_prefix: "pcum_d".to_string(),
	    start_date: NaiveDate::from_ymd_opt(2020, 1, 20),
	    trace_length: 14,
	    off_day: 0,
	    threshold: 100,
	    mortality_floor: 0.191,
	    width: 1600,
	    height: 1200,
	    dpi: 240.0,
	    font_family: "sans-serif".to_string(),
	    font_size: 12.0,
	    x_title: "dead(day) / infected(day)".to_string(),
	    y_title: "infected".to_string(),
	    transliterate_labels: false,
	}
    }
}

impl Settings {

    pub fn load(path: &Path) -> Result<Self> {
	match path.exists() {
	    false => {
		info!("No {} found, using default settings", path.display());
		Ok(Self::default())
	    }
	    true => {
		info!("Reading settings from {}", path.display());
		Self::from_toml(&fs::read_to_string(path)?)
	    }
	}
    }

    pub fn from_toml(text: &str) -> Result<Self> {
	Ok(toml::from_str(text)?)
    }

}

impl PlotSettings {
    pub fn trace_params(&self) -> TraceParams {
	TraceParams {
	    trace_length: self.trace_length,
	    off_day: self.off_day,
	    threshold: self.threshold,
	    mortality_floor: self.mortality_floor,
	}
    }
}
