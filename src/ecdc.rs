use std::{io,fs};
use std::path::Path;
use std::collections::HashSet;

use chrono::naive::NaiveDate;
use csv::StringRecord;
use encoding_rs::ISO_8859_15;
use log::{debug,info};

use super::config::DataSettings;
use super::error::{Result,Error};
use super::names::NameTable;


const COL_DAY: usize = 1;
const COL_MONTH: usize = 2;
const COL_YEAR: usize = 3;
const COL_CASES: usize = 4;
const COL_DEATHS: usize = 5;
const COL_NAME: usize = 6;
const COL_CODE: usize = 7;
const COL_ISO_CODE: usize = 8;
const COL_POPULATION: usize = 9;
const COL_CONTINENT: usize = 10;


/// One daily report row: increments, not totals.
#[derive(Clone,Debug,PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
    pub region: String,
}

#[derive(Clone,Debug,PartialEq)]
pub struct Region {
    pub code: String,
    pub iso_code: String,
    pub name: String,
    pub population: Option<u64>,
    pub continent: String,
}

/// Rows in file order plus the region registry in first-seen order.
#[derive(Clone,Debug,Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub regions: Vec<Region>,
}


pub fn ensure_input(settings: &DataSettings) -> Result<()> {

    if settings.input.exists() {
	return Ok(());
    }

    match &settings.download_url {
	Some(url) => download(url, &settings.input),
	None => Err(Error::IO(io::Error::new(
	    io::ErrorKind::NotFound,
	    format!("{} not found and no download url configured",
		    settings.input.display())))),
    }

}


fn download(url: &str, dest: &Path) -> Result<()> {

    info!("Downloading {}...", url);
    let res = reqwest::blocking::get(url)?;

    if !res.status().is_success() {
	return Err(Error::HttpError(res.status()));
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
	fs::create_dir_all(parent)?;
    }
    fs::write(dest, &res.bytes()?)?;
    Ok(())

}


pub fn load(path: &Path, names: &NameTable) -> Result<Dataset> {
    info!("Loading {}...", path.display());
    let data = parse(&fs::read(path)?, names)?;
    for region in &data.regions {
	debug!("{}/{} {} ({}), population {:?}", region.code, region.iso_code,
	       region.name, region.continent, region.population);
    }
    info!("Loaded {} rows for {} regions", data.records.len(), data.regions.len());
    Ok(data)
}


pub fn parse(bytes: &[u8], names: &NameTable) -> Result<Dataset> {

    let (text, _) = ISO_8859_15.decode_without_bom_handling(bytes);
    let mut reader = csv::ReaderBuilder::new()
	.has_headers(true)
	.from_reader(text.as_bytes());

    let mut data = Dataset::default();
    let mut seen = HashSet::new();

    for row in reader.records() {

	let row = row?;
	let record = Record {
	    date: date(&row)?,
	    cases: field(&row, COL_CASES)?.trim().parse()?,
	    deaths: field(&row, COL_DEATHS)?.trim().parse()?,
	    region: field(&row, COL_CODE)?.to_string(),
	};

	if !seen.contains(&record.region) {
	    seen.insert(record.region.clone());
	    data.regions.push(Region {
		code: record.region.clone(),
		iso_code: field(&row, COL_ISO_CODE)?.to_string(),
		name: names.display_name(field(&row, COL_NAME)?),
		population: match field(&row, COL_POPULATION)?.trim() {
		    "" => None,
		    n => Some(n.parse()?),
		},
		continent: field(&row, COL_CONTINENT)?.to_string(),
	    });
	}

	data.records.push(record);

    }

    Ok(data)

}


fn field(row: &StringRecord, col: usize) -> Result<&str> {
    row.get(col).ok_or_else(|| Error::MissingColumn(
	row.position().map_or(0, |p| p.line()), col))
}


fn date(row: &StringRecord) -> Result<NaiveDate> {
    let day = field(row, COL_DAY)?.trim();
    let month = field(row, COL_MONTH)?.trim();
    let year = field(row, COL_YEAR)?.trim();
    NaiveDate::from_ymd_opt(year.parse()?, month.parse()?, day.parse()?)
	.ok_or_else(|| Error::InvalidDate(format!("{}-{}-{}", year, month, day)))
}


#[cfg(test)]
mod tests {

    use super::*;

    const HEADER : &str = "dateRep,day,month,year,cases,deaths,countriesAndTerritories,\
			   geoId,countryterritoryCode,popData2019,continentExp\n";

    fn csv(rows: &[&str]) -> Vec<u8> {
	let mut text = HEADER.to_string();
	for row in rows {
	    text.push_str(row);
	    text.push('\n');
	}
	text.into_bytes()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rows_keep_file_order() {
	let data = parse(&csv(&[
	    "23/01/2020,23,1,2020,3,1,China,CN,CHN,1433783692,Asia",
	    "22/01/2020,22,1,2020,1,0,China,CN,CHN,1433783692,Asia",
	    "22/01/2020,22,1,2020,2,0,United_States_of_America,US,USA,329064917,America",
	]), &NameTable::default()).unwrap();
	assert_eq!(data.records, vec![
	    Record { date: ymd(2020, 1, 23), cases: 3, deaths: 1, region: "CN".to_string() },
	    Record { date: ymd(2020, 1, 22), cases: 1, deaths: 0, region: "CN".to_string() },
	    Record { date: ymd(2020, 1, 22), cases: 2, deaths: 0, region: "US".to_string() },
	]);
	let codes : Vec<_> = data.regions.iter().map(|r| r.code.as_str()).collect();
	assert_eq!(codes, vec!["CN", "US"]);
    }

    #[test]
    fn registry_keeps_first_seen_metadata() {
	let names = NameTable::from_json(
	    r#"[{"en": "United States of America", "cn": "美国"}]"#).unwrap();
	let data = parse(&csv(&[
	    "22/01/2020,22,1,2020,2,0,United_States_of_America,US,USA,329064917,America",
	    "23/01/2020,23,1,2020,2,0,USA,US,USA,1,Elsewhere",
	]), &names).unwrap();
	assert_eq!(data.regions, vec![Region {
	    code: "US".to_string(),
	    iso_code: "USA".to_string(),
	    name: "美国".to_string(),
	    population: Some(329064917),
	    continent: "America".to_string(),
	}]);
    }

    #[test]
    fn reads_metadata_columns_of_a_published_row() {
	let data = parse(&csv(&[
	    "22/01/2020,22,1,2020,1,0,China,CN,CHN,1433783692,Asia",
	]), &NameTable::default()).unwrap();
	assert_eq!(data.regions, vec![Region {
	    code: "CN".to_string(),
	    iso_code: "CHN".to_string(),
	    name: "China".to_string(),
	    population: Some(1433783692),
	    continent: "Asia".to_string(),
	}]);
    }

    #[test]
    fn decodes_latin_text_and_empty_population() {
	let mut bytes = HEADER.as_bytes().to_vec();
	bytes.extend_from_slice(b"01/04/2020,1,4,2020,5,0,Cura\xe7ao,CW,CUW,,America\n");
	let data = parse(&bytes, &NameTable::default()).unwrap();
	assert_eq!(data.regions[0].name, "Curaçao");
	assert_eq!(data.regions[0].iso_code, "CUW");
	assert_eq!(data.regions[0].population, None);
	assert_eq!(data.regions[0].continent, "America");
    }

    #[test]
    fn negative_corrections_are_kept() {
	let data = parse(&csv(&[
	    "22/05/2020,22,5,2020,-12,-3,Spain,ES,ESP,46937060,Europe",
	]), &NameTable::default()).unwrap();
	assert_eq!(data.records[0].cases, -12);
	assert_eq!(data.records[0].deaths, -3);
    }

    #[test]
    fn malformed_count_fails() {
	let result = parse(&csv(&[
	    "22/01/2020,22,1,2020,many,0,China,CN,CHN,1433783692,Asia",
	]), &NameTable::default());
	assert!(matches!(result, Err(Error::ParseInt(_))));
    }

    #[test]
    fn impossible_date_fails() {
	let result = parse(&csv(&[
	    "31/02/2020,31,2,2020,1,0,China,CN,CHN,1433783692,Asia",
	]), &NameTable::default());
	assert!(matches!(result, Err(Error::InvalidDate(_))));
    }

    #[test]
    fn short_row_fails() {
	let mut reader_input = b"a,b,c\n".to_vec();
	reader_input.extend_from_slice(b"1,2,3\n");
	let result = parse(&reader_input, &NameTable::default());
	assert!(matches!(result, Err(Error::MissingColumn(_, _))));
    }

    #[test]
    fn missing_input_without_url_fails() {
	let settings = DataSettings {
	    input: "does/not/exist.csv".into(),
	    names: None,
	    download_url: None,
	};
	assert!(matches!(ensure_input(&settings), Err(Error::IO(_))));
	assert!(matches!(load(&settings.input, &NameTable::default()), Err(Error::IO(_))));
    }

}
