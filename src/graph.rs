use std::fs;
use std::ops::Range;
use std::path::Path;

use log::{debug,info};
use plotters::prelude::*;
use unidecode::unidecode;

use super::config::PlotSettings;
use super::cumulative::Timeline;
use super::error::Result;
use super::frame::{Frame,FrameBuilder,Rgba,TRACE_GRAY};


const POINTS_PER_INCH: f64 = 72.0;


pub fn render_frames(settings: &PlotSettings, timeline: &Timeline) -> Result<usize> {

    fs::create_dir_all(&settings.output_dir)?;

    let days = day_range(settings, timeline);
    let mut frames = FrameBuilder::new(timeline, settings.trace_params());

    info!("Rendering days {} to {} into {}", days.start, days.end.saturating_sub(1),
	  settings.output_dir.display());

    for day in days.clone() {
	let frame = frames.build(day);
	let path = settings.output_dir.join(file_name(&settings.file_prefix, frame.day));
	debug!("{}: {} traces, {} dots, {} labels -> {}", frame.title, frame.traces.len(),
	       frame.dots.len(), frame.labels.len(), path.display());
	draw(settings, &frame, &path)?;
    }

    info!("Rendered {} frames, peak fatality ratio {:.3}",
	  days.len(), frames.peak_mortality());
    Ok(days.len())

}


/// Days from the configured start date (day 0 if absent from the data) to the last.
pub fn day_range(settings: &PlotSettings, timeline: &Timeline) -> Range<usize> {
    let first = settings.start_date.and_then(|date| timeline.day_of(date)).unwrap_or(0);
    first..timeline.dates.len()
}


pub fn file_name(prefix: &str, day: usize) -> String {
    format!("{}{:04}.png", prefix, day)
}


fn draw(settings: &PlotSettings, frame: &Frame, path: &Path) -> Result<()> {

    let scale = settings.dpi / POINTS_PER_INCH;
    let font = settings.font_family.as_str();
    let text = (font, settings.font_size * scale).into_font().color(&BLACK);
    let title = (font, settings.font_size * 4.0 / 3.0 * scale).into_font().color(&BLACK);

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
	.caption(&frame.title, title.clone())
	.margin((8.0 * scale) as i32)
	.x_label_area_size((3.0 * settings.font_size * scale) as i32)
	.y_label_area_size((5.0 * settings.font_size * scale) as i32)
	.build_cartesian_2d(0f64..frame.x_max, (frame.y_min..frame.y_max).log_scale())?;

    chart.configure_mesh()
	.disable_mesh()
	.x_desc(settings.x_title.as_str())
	.y_desc(settings.y_title.as_str())
	.axis_desc_style(title.clone())
	.label_style(text.clone())
	.x_label_formatter(&percent)
	.y_label_formatter(&count)
	.draw()?;

    let inside = |&(x,y): &(f64,f64)| x >= 0.0 && x <= frame.x_max
	&& y >= frame.y_min && y <= frame.y_max;
    let clamp = |(x,y): (f64,f64)| (x.max(0.0).min(frame.x_max),
				      y.max(frame.y_min).min(frame.y_max));

    let gray = color(TRACE_GRAY);
    let stroke = scale.round().max(1.0) as u32;
    chart.draw_series(frame.traces.iter()
	.flat_map(|trace| clip(trace, (0.0, frame.x_max), (frame.y_min, frame.y_max)))
	.map(|part| PathElement::new(part, gray.stroke_width(stroke))))?;

    chart.draw_series(frame.dots.iter().filter(|dot| inside(&(dot.x, dot.y))).map(
	|dot| Circle::new((dot.x, dot.y), marker_radius(dot.size, scale),
			  color(dot.color).filled())
    ))?;

    chart.draw_series(frame.labels.iter().map(
	|label| Text::new(match settings.transliterate_labels {
	    true => unidecode(&label.text),
	    false => label.text.clone()
	}, clamp((label.x, label.y)), text.clone())
    ))?;

    root.present()?;
    Ok(())

}


/// Parts of a polyline inside the chart, cut at the axis bounds in
/// drawing space (linear x, log y).
fn clip(path: &[(f64,f64)], x: (f64,f64), y: (f64,f64)) -> Vec<Vec<(f64,f64)>> {

    let log = |v: f64| v.max(f64::MIN_POSITIVE).log10();
    let bounds = (x.0, x.1, log(y.0), log(y.1));
    let mut parts = Vec::new();
    let mut part = Vec::new();

    for pair in path.windows(2) {

	let a = (pair[0].0, log(pair[0].1));
	let b = (pair[1].0, log(pair[1].1));
	let at = |t: f64| match t {
	    t if t <= 0.0 => pair[0],
	    t if t >= 1.0 => pair[1],
	    t => (a.0 + t * (b.0 - a.0), 10f64.powf(a.1 + t * (b.1 - a.1))),
	};

	match clip_segment(a, b, bounds) {
	    Some((t0,t1)) => {
		if t0 > 0.0 || part.is_empty() {
		    if !part.is_empty() {
			parts.push(std::mem::take(&mut part));
		    }
		    part.push(at(t0));
		}
		part.push(at(t1));
		if t1 < 1.0 {
		    parts.push(std::mem::take(&mut part));
		}
	    }
	    None => if !part.is_empty() {
		parts.push(std::mem::take(&mut part));
	    }
	}

    }

    if !part.is_empty() {
	parts.push(part);
    }
    parts

}

/// Liang-Barsky: the parameter range of `a`-`b` inside `(x0, x1, y0, y1)`.
fn clip_segment(a: (f64,f64), b: (f64,f64), bounds: (f64,f64,f64,f64)) -> Option<(f64,f64)> {

    let (x0, x1, y0, y1) = bounds;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for &(p,q) in &[(-dx, a.0 - x0), (dx, x1 - a.0), (-dy, a.1 - y0), (dy, y1 - a.1)] {
	if p == 0.0 {
	    if q < 0.0 {
		return None;
	    }
	} else if p < 0.0 {
	    t0 = t0.max(q / p);
	} else {
	    t1 = t1.min(q / p);
	}
	if t0 > t1 {
	    return None;
	}
    }

    Some((t0, t1))

}


fn color(c: Rgba) -> RGBAColor {
    let byte = |v: f64| (v.max(0.0).min(1.0) * 255.0).round() as u8;
    RGBAColor(byte(c.0), byte(c.1), byte(c.2), c.3)
}

/// Marker area in pt² to a pixel radius.
fn marker_radius(area: f64, scale: f64) -> i32 {
    (area.sqrt() / 2.0 * scale).round().max(1.0) as i32
}

fn percent(x: &f64) -> String {
    match x.fract() == 0.0 {
	true => format!("{:.0}%", x),
	false => format!("{:.1}%", x)
    }
}

fn count(y: &f64) -> String {
    match *y >= 1e6 {
	true => format!("{:.0e}", y),
	false => format!("{:.0}", y)
    }
}


#[cfg(test)]
mod tests {

    use chrono::naive::NaiveDate;

    use super::*;
    use crate::ecdc::{Dataset,Record,Region};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn four_days() -> Timeline {
	let records = (20..24).map(|d| Record {
	    date: ymd(2020, 1, d), cases: 1, deaths: 0, region: "CN".to_string()
	}).collect();
	let regions = vec![Region {
	    code: "CN".to_string(),
	    iso_code: "CHN".to_string(),
	    name: "China".to_string(),
	    population: None,
	    continent: "Asia".to_string(),
	}];
	Timeline::aggregate(Dataset { records, regions }).unwrap()
    }

    #[test]
    fn frames_run_from_start_date_to_last_day() {
	let timeline = four_days();
	let settings = PlotSettings { start_date: Some(ymd(2020, 1, 22)), ..Default::default() };
	assert_eq!(day_range(&settings, &timeline), 2..4);
    }

    #[test]
    fn unknown_or_unset_start_date_begins_at_first_day() {
	let timeline = four_days();
	let absent = PlotSettings { start_date: Some(ymd(2019, 12, 31)), ..Default::default() };
	assert_eq!(day_range(&absent, &timeline), 0..4);
	let unset = PlotSettings { start_date: None, ..Default::default() };
	assert_eq!(day_range(&unset, &timeline), 0..4);
    }

    #[test]
    fn file_names_are_zero_padded() {
	assert_eq!(file_name("pcum_d", 7), "pcum_d0007.png");
	assert_eq!(file_name("pcum_d", 123), "pcum_d0123.png");
	assert_eq!(file_name("frame_", 12345), "frame_12345.png");
    }

    #[test]
    fn colours_scale_to_bytes() {
	let c = color(Rgba(1.0, 0.0, 0.5, 0.25));
	assert_eq!((c.0, c.1, c.2, c.3), (255, 0, 128, 0.25));
	let c = color(TRACE_GRAY);
	assert_eq!((c.0, c.1, c.2, c.3), (204, 204, 204, 0.5));
    }

    #[test]
    fn marker_area_to_radius() {
	let scale = 240.0 / POINTS_PER_INCH;
	assert_eq!(marker_radius(4.0, scale), 3);
	assert_eq!(marker_radius(40.0, scale), 11);
	assert_eq!(marker_radius(0.0, scale), 1);
    }

    fn close(a: (f64,f64), b: (f64,f64)) -> bool {
	(a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-6 * b.1
    }

    #[test]
    fn traces_inside_the_chart_are_untouched() {
	let trace = vec![(1.0, 200.0), (2.0, 400.0), (3.0, 800.0)];
	assert_eq!(clip(&trace, (0.0, 10.0), (100.0, 1e5)), vec![trace]);
    }

    #[test]
    fn traces_are_cut_at_the_axis_edge() {
	// enters through the bottom axis on the way from (50%, 10) to (10%, 1000)
	let parts = clip(&[(50.0, 10.0), (10.0, 1000.0), (5.0, 1000.0)],
			 (0.0, 40.0), (100.0, 1e5));
	assert_eq!(parts.len(), 1);
	assert_eq!(parts[0].len(), 3);
	assert!(close(parts[0][0], (30.0, 100.0)));
	assert_eq!(parts[0][1..], [(10.0, 1000.0), (5.0, 1000.0)]);
    }

    #[test]
    fn traces_leaving_and_reentering_split() {
	let parts = clip(&[(5.0, 1000.0), (15.0, 1000.0), (25.0, 1000.0), (15.0, 2000.0)],
			 (0.0, 20.0), (100.0, 1e5));
	assert_eq!(parts.len(), 2);
	assert!(close(parts[0][0], (5.0, 1000.0)));
	assert!(close(parts[0][2], (20.0, 1000.0)));
	assert_eq!(parts[0].len(), 3);
	assert_eq!(parts[1].len(), 2);
	assert!(close(parts[1][1], (15.0, 2000.0)));
    }

    #[test]
    fn traces_entirely_outside_vanish() {
	assert!(clip(&[(30.0, 1000.0), (40.0, 2000.0)], (0.0, 20.0), (100.0, 1e5)).is_empty());
	assert!(clip(&[(5.0, 1000.0)], (0.0, 20.0), (100.0, 1e5)).is_empty());
    }

    #[test]
    fn axis_labels() {
	assert_eq!(percent(&5.0), "5%");
	assert_eq!(percent(&2.5), "2.5%");
	assert_eq!(count(&1000.0), "1000");
	assert_eq!(count(&1e7), "1e7");
    }

}
