use std::collections::{BTreeMap,HashMap};

use chrono::naive::NaiveDate;

use super::ecdc::{Dataset,Record,Region};
use super::error::{Result,Error};


#[derive(Clone,Copy,Debug,Default,PartialEq,Eq)]
pub struct Counts {
    pub infected: i64,
    pub dead: i64,
}

/// Running totals, region-major: `cells[region * days + day]`.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct CumulativeTable {
    days: usize,
    cells: Vec<Counts>,
}

#[derive(Clone,Debug)]
pub struct Timeline {
    pub dates: Vec<NaiveDate>,
    pub regions: Vec<Region>,
    pub table: CumulativeTable,
}


impl CumulativeTable {

    fn zeros(regions: usize, days: usize) -> Self {
	Self { days, cells: vec![Counts::default(); regions * days] }
    }

    pub fn regions(&self) -> usize {
	match self.days {
	    0 => 0,
	    days => self.cells.len() / days
	}
    }

    pub fn days(&self) -> usize {
	self.days
    }

    pub fn get(&self, region: usize, day: usize) -> Counts {
	self.cells[region * self.days + day]
    }

    #[cfg(test)]
    pub fn series(&self, region: usize) -> &[Counts] {
	&self.cells[region * self.days..(region + 1) * self.days]
    }

    pub fn infected(&self, region: usize, day: usize) -> i64 {
	self.get(region, day).infected
    }

    pub fn dead(&self, region: usize, day: usize) -> i64 {
	self.get(region, day).dead
    }

    /// Dead at `day` over infected `lag` days earlier (floored at day 0).
    pub fn fatality(&self, region: usize, day: usize, lag: usize) -> f64 {
	self.dead(region, day) as f64 / self.infected(region, day.saturating_sub(lag)) as f64
    }

    pub fn total_infected(&self, day: usize) -> i64 {
	(0..self.regions()).map(|r| self.infected(r, day)).sum()
    }

}


impl Timeline {

    pub fn aggregate(data: Dataset) -> Result<Self> {

	let Dataset { records, regions } = data;

	if records.is_empty() {
	    return Err(Error::MissingData);
	}

	let index : HashMap<&str,usize> = regions.iter().enumerate()
	    .map(|(i,r)| (r.code.as_str(), i)).collect();

	let mut by_date : BTreeMap<NaiveDate,Vec<&Record>> = BTreeMap::new();
	for record in &records {
	    by_date.entry(record.date).or_insert_with(Vec::new).push(record);
	}

	let dates : Vec<NaiveDate> = by_date.keys().cloned().collect();
	let mut table = CumulativeTable::zeros(regions.len(), dates.len());
	let mut running = vec![Counts::default(); regions.len()];

	for (day,rows) in by_date.values().enumerate() {
	    for record in rows {
		let region = *index.get(record.region.as_str())
		    .ok_or_else(|| Error::MissingRegion(record.region.clone()))?;
		running[region].infected += record.cases;
		running[region].dead += record.deaths;
	    }
	    for (region,counts) in running.iter().enumerate() {
		table.cells[region * table.days + day] = *counts;
	    }
	}

	Ok(Self { dates, regions, table })

    }

    pub fn day_of(&self, date: NaiveDate) -> Option<usize> {
	self.dates.binary_search(&date).ok()
    }

}
