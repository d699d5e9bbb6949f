mod config;
mod cumulative;
mod ecdc;
mod error;
mod frame;
mod graph;
mod names;

use std::path::Path;

use env_logger::Env;
use log::info;

use config::Settings;
use cumulative::Timeline;
use error::Result;
use names::NameTable;


const SETTINGS_FILE: &str = "fatality-trace.toml";


fn main() -> Result<()> {

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::load(Path::new(SETTINGS_FILE))?;

    let names = match &settings.data.names {
	Some(path) => {
	    let names = NameTable::load(path)?;
	    info!("Loaded {} region names from {}", names.len(), path.display());
	    names
	}
	None => NameTable::default(),
    };

    ecdc::ensure_input(&settings.data)?;
    let data = ecdc::load(&settings.data.input, &names)?;
    let timeline = Timeline::aggregate(data)?;

    let last = timeline.dates.len() - 1;
    info!("Cumulative table: {} regions x {} days ({} to {}), {} infected in total",
	  timeline.table.regions(), timeline.table.days(),
	  timeline.dates[0], timeline.dates[last], timeline.table.total_infected(last));

    graph::render_frames(&settings.plot, &timeline)?;

    Ok(())

}
