use std::{io,num,fmt};
use std::convert::From;

use plotters::drawing::DrawingAreaErrorKind;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IO(io::Error),
    CSV(csv::Error),
    JSON(serde_json::Error),
    TOML(toml::de::Error),
    Reqwest(reqwest::Error),
    HttpError(reqwest::StatusCode),
    ParseInt(num::ParseIntError),
    InvalidDate(String),
    MissingColumn(u64,usize),
    MissingRegion(String),
    Plot(String),
    MissingData,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
	Self::IO(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
	Self::CSV(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
	Self::JSON(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
	Self::TOML(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
	Self::Reqwest(err)
    }
}

impl From<num::ParseIntError> for Error {
    fn from(err: num::ParseIntError) -> Self {
	Self::ParseInt(err)
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for Error {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
	Self::Plot(err.to_string())
    }
}


impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    Self::IO(err) => write!(f, "I/O error: {}", err),
	    Self::CSV(err) => write!(f, "CSV error: {}", err),
	    Self::JSON(err) => write!(f, "JSON error: {}", err),
	    Self::TOML(err) => write!(f, "Settings error: {}", err),
	    Self::Reqwest(err) => write!(f, "Request error: {}", err),
	    Self::HttpError(err) => write!(f, "HTTP error: {}", err),
	    Self::ParseInt(err) => write!(f, "Integer parse error: {}", err),
	    Self::InvalidDate(date) => write!(f, "Invalid date: {}", date),
	    Self::MissingColumn(line,col) => write!(f, "Missing column {} on line {}", col, line),
	    Self::MissingRegion(code) => write!(f, "Missing region: {}", code),
	    Self::Plot(err) => write!(f, "Plot error: {}", err),
	    Self::MissingData => write!(f, "No data!"),
	}
    }
}
