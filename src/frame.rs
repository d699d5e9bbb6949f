use std::cmp::Ordering;

use super::cumulative::Timeline;


pub const PALETTE_SIZE: usize = 7;
pub const TRACE_GRAY: Rgba = Rgba(0.8, 0.8, 0.8, 0.5);
pub const Y_FLOOR: f64 = 100.0;
pub const Y_MIN_CEILING: f64 = 1e5;

const LABEL_DAYS: [f64; 4] = [0.0, 70.0, 77.0, 85.0];
const LABEL_COUNTS: [f64; 4] = [10.0, 10.0, 14.0, 25.0];

const MARKER_OLDEST: f64 = 4.0;
const MARKER_NEWEST: f64 = 20.0;
const MARKER_CURRENT: f64 = 40.0;

const LABEL_PENALTY: f64 = 10000.0;

// Control points of the classic `hsv` colour map, per channel.
const HSV_RED: [(f64, f64); 10] = [
    (0.0, 1.0), (0.158730, 1.0), (0.174603, 0.96875), (0.333333, 0.03125),
    (0.349206, 0.0), (0.666667, 0.0), (0.682540, 0.03125), (0.841270, 0.96875),
    (0.857143, 1.0), (1.0, 1.0),
];
const HSV_GREEN: [(f64, f64); 7] = [
    (0.0, 0.0), (0.158730, 0.9375), (0.174603, 1.0), (0.507937, 1.0),
    (0.666667, 0.0625), (0.682540, 0.0), (1.0, 0.0),
];
const HSV_BLUE: [(f64, f64); 7] = [
    (0.0, 0.0), (0.333333, 0.0), (0.349206, 0.0625), (0.507937, 1.0),
    (0.841270, 1.0), (0.857143, 0.9375), (1.0, 0.09375),
];


#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Rgba(pub f64, pub f64, pub f64, pub f64);

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct TraceParams {
    pub trace_length: usize,
    pub off_day: usize,
    pub threshold: i64,
    pub mortality_floor: f64,
}

/// Marker at (fatality %, infected); `size` is an area in pt².
#[derive(Clone,Debug,PartialEq)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: Rgba,
}

#[derive(Clone,Debug,PartialEq)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Clone,Debug)]
pub struct Frame {
    pub day: usize,
    pub title: String,
    pub traces: Vec<Vec<(f64,f64)>>,
    pub dots: Vec<Dot>,
    pub labels: Vec<Label>,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}


/// Piecewise-linear interpolation, clamped to the end values outside `xs`.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    match xs.iter().position(|&p| x < p) {
	Some(0) => ys[0],
	None => ys[ys.len() - 1],
	Some(i) => {
	    let t = (x - xs[i-1]) / (xs[i] - xs[i-1]);
	    ys[i-1] + t * (ys[i] - ys[i-1])
	}
    }
}

pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
	0 => vec![],
	1 => vec![start],
	n => (0..n).map(|i| start + (end - start) * i as f64 / (n - 1) as f64).collect()
    }
}

/// Number of region names shown on a given day.
pub fn label_count(day: usize) -> usize {
    interp(day as f64, &LABEL_DAYS, &LABEL_COUNTS).round() as usize
}

/// Marker areas from oldest to newest; the current day is emphasised.
pub fn marker_sizes(n: usize) -> Vec<f64> {
    let mut sizes = linspace(MARKER_OLDEST, MARKER_NEWEST, n);
    if let Some(last) = sizes.last_mut() {
	*last = MARKER_CURRENT;
    }
    sizes
}

fn colormap(points: &[(f64, f64)], x: f64) -> f64 {
    let xs : Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys : Vec<f64> = points.iter().map(|p| p.1).collect();
    interp(x, &xs, &ys)
}

pub fn palette(region: usize) -> Rgba {
    let x = (region % PALETTE_SIZE) as f64 / PALETTE_SIZE as f64;
    Rgba(colormap(&HSV_RED, x), colormap(&HSV_GREEN, x), colormap(&HSV_BLUE, x), 1.0)
}

/// Blend from the trace gray (`weight` 0) to `base` (`weight` 1).
pub fn fade(base: Rgba, weight: f64) -> Rgba {
    let channel = |gray: f64, hue: f64| interp(weight, &[0.0, 1.0], &[gray, hue]);
    Rgba(channel(TRACE_GRAY.0, base.0),
	 channel(TRACE_GRAY.1, base.1),
	 channel(TRACE_GRAY.2, base.2),
	 channel(TRACE_GRAY.3, base.3))
}

/// Label ranking: large outbreaks and high fatality both score high.
/// NaN when the counts make the ratio or logarithm undefined.
pub fn interest_score(infected: i64, dead: i64, infected_lagged: i64, threshold: i64) -> f64 {
    let scale = 0.4 * (infected as f64).log10();
    let severity = 10.0 * (dead as f64 / infected_lagged as f64);
    let penalty = match infected < threshold {
	true => LABEL_PENALTY,
	false => 0.0
    };
    scale * scale + severity * severity - penalty
}


pub struct FrameBuilder<'a> {
    timeline: &'a Timeline,
    params: TraceParams,
    peak_mortality: f64,
}

impl<'a> FrameBuilder<'a> {

    pub fn new(timeline: &'a Timeline, params: TraceParams) -> Self {
	Self { timeline, params, peak_mortality: params.mortality_floor }
    }

    pub fn peak_mortality(&self) -> f64 {
	self.peak_mortality
    }

    pub fn build(&mut self, day: usize) -> Frame {

	let first = day.saturating_sub(self.params.trace_length);
	let traces = self.traces(first, day);
	let dots = self.dots(first, day);

	for dot in &dots {
	    self.peak_mortality = self.peak_mortality.max(dot.x / 100.0).min(1.0);
	}

	let table = &self.timeline.table;
	let y_max = (0..table.regions()).map(|r| table.infected(r, day) as f64)
	    .fold(Y_MIN_CEILING, f64::max);

	Frame {
	    day,
	    title: self.timeline.dates[day].format("%Y-%m-%d").to_string(),
	    traces,
	    dots,
	    labels: self.labels(day),
	    x_max: 100.0 * 0.1f64.max(1.15 * self.peak_mortality),
	    y_min: Y_FLOOR,
	    y_max,
	}

    }

    fn point(&self, region: usize, day: usize) -> (f64,f64) {
	let table = &self.timeline.table;
	(100.0 * table.fatality(region, day, self.params.off_day),
	 table.infected(region, day) as f64)
    }

    /// Trace runs: a region's line breaks wherever its ratio is undefined.
    fn traces(&self, first: usize, day: usize) -> Vec<Vec<(f64,f64)>> {

	let table = &self.timeline.table;
	let mut traces = Vec::new();

	for r in (0..table.regions()).filter(|&r| table.infected(r, day) >= self.params.threshold) {
	    let mut run = Vec::new();
	    for o in first..=day {
		let (x,y) = self.point(r, o);
		if x.is_finite() {
		    run.push((x,y));
		} else if !run.is_empty() {
		    traces.push(std::mem::take(&mut run));
		}
	    }
	    if !run.is_empty() {
		traces.push(run);
	    }
	}

	traces

    }

    fn dots(&self, first: usize, day: usize) -> Vec<Dot> {

	let table = &self.timeline.table;
	let n = day - first + 1;
	let sizes = marker_sizes(n);
	let recency = linspace(0.0, 1.0, n);
	let mut dots = Vec::new();

	for o in first..=day {
	    for r in (0..table.regions()).filter(|&r| table.infected(r, o) > self.params.threshold) {
		let (x,y) = self.point(r, o);
		if x.is_finite() {
		    dots.push(Dot { x, y, size: sizes[o - first],
				    color: fade(palette(r), recency[o - first]) });
		}
	    }
	}

	dots

    }

    /// Indices of the most interesting regions, best first.
    pub fn ranked_regions(&self, day: usize) -> Vec<usize> {

	let table = &self.timeline.table;
	let lagged = day.saturating_sub(self.params.off_day);
	let mut scored : Vec<(usize,f64)> = (0..table.regions())
	    .map(|r| (r, interest_score(table.infected(r, day), table.dead(r, day),
					table.infected(r, lagged), self.params.threshold)))
	    .filter(|(_,score)| !score.is_nan())
	    .collect();

	scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
	scored.into_iter().take(label_count(day)).map(|(r,_)| r).collect()

    }

    fn labels(&self, day: usize) -> Vec<Label> {
	self.ranked_regions(day).into_iter()
	    .filter(|&r| self.timeline.table.infected(r, day) > self.params.threshold)
	    .map(|r| {
		let (x,y) = self.point(r, day);
		Label { x, y, text: self.timeline.regions[r].name.clone() }
	    })
	    .collect()
    }

}
