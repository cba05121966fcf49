//! Terminal chart backend: each instance keeps its latest text render.

use super::{ChartBackend, ChartConfig, ChartData, ChartInstance, ChartKind, SlotId, UpdateMode};

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR: char = '█';
const EMPTY: &str = "(no data)";

#[derive(Debug, Clone)]
pub struct TextBackend {
    width: usize,
}

impl TextBackend {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(8),
        }
    }
}

impl ChartBackend for TextBackend {
    type Chart = TextChart;

    fn create(&mut self, slot: SlotId, config: ChartConfig) -> TextChart {
        let rendered = render(&config, self.width);
        TextChart {
            slot,
            config,
            width: self.width,
            rendered,
            redraws: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextChart {
    slot: SlotId,
    config: ChartConfig,
    width: usize,
    rendered: String,
    redraws: u64,
}

impl TextChart {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl ChartInstance for TextChart {
    fn config(&self) -> &ChartConfig {
        &self.config
    }

    fn data_mut(&mut self) -> &mut ChartData {
        &mut self.config.data
    }

    fn update(&mut self, _mode: UpdateMode) {
        // animation has no meaning on a terminal
        self.rendered = render(&self.config, self.width);
        self.redraws += 1;
    }

    fn destroy(self) {}
}

pub fn render(config: &ChartConfig, width: usize) -> String {
    let data = &config.data;
    let mut out = String::new();
    let heading = config
        .options
        .title
        .clone()
        .or_else(|| data.datasets.first().map(|d| d.label.clone()))
        .unwrap_or_default();
    if !heading.is_empty() {
        out.push_str(&heading);
        out.push('\n');
    }
    if data.is_empty() {
        out.push_str(EMPTY);
        return out;
    }
    let body = match config.kind {
        ChartKind::Line => sparkline(data.values(), width),
        ChartKind::Doughnut => shares(config, width),
        ChartKind::Bar => bars(config, width),
    };
    out.push_str(&body);
    out
}

fn sparkline(values: &[f64], width: usize) -> String {
    let tail = &values[values.len().saturating_sub(width)..];
    let (min, max) = min_max(tail);
    let span = max - min;
    let line: String = tail
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARKS[0]
            } else {
                let idx = ((v - min) / span * (SPARKS.len() - 1) as f64).round() as usize;
                SPARKS[idx.min(SPARKS.len() - 1)]
            }
        })
        .collect();
    let last = tail.last().copied().unwrap_or(0.0);
    format!("{}\nmin {:.3}  max {:.3}  last {:.3}  n={}", line, min, max, last, values.len())
}

fn shares(config: &ChartConfig, width: usize) -> String {
    let data = &config.data;
    let values = data.values();
    let total: f64 = values.iter().sum();
    let label_w = label_width(&data.labels);
    let bar_w = width.saturating_sub(label_w + 16).max(4);
    data.labels
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (label, v))| {
            let frac = if total > 0.0 { v / total } else { 0.0 };
            let fill = (frac * bar_w as f64).round() as usize;
            let tip = config
                .options
                .tooltips
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("{:.1}%", frac * 100.0));
            format!("{:<lw$} {:<bw$} {}", label, bar(fill), tip, lw = label_w, bw = bar_w)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bars(config: &ChartConfig, width: usize) -> String {
    let data = &config.data;
    let values = data.values();
    let (_, observed_max) = min_max(values);
    let max = config.options.y_max.unwrap_or(observed_max);
    let label_w = label_width(&data.labels);
    let bar_w = width.saturating_sub(label_w + 8).max(4);
    data.labels
        .iter()
        .zip(values)
        .map(|(label, v)| {
            let frac = if max > 0.0 { (v / max).clamp(0.0, 1.0) } else { 0.0 };
            let fill = (frac * bar_w as f64).round() as usize;
            format!("{:<lw$} {:<bw$} {:.2}", label, bar(fill), v, lw = label_w, bw = bar_w)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bar(n: usize) -> String {
    std::iter::repeat(BAR).take(n).collect()
}

fn label_width(labels: &[String]) -> usize {
    labels.iter().map(|l| l.chars().count()).max().unwrap_or(0).min(24)
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
