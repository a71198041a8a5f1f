use irl_core::{
    Result,
    iteration::IterationPlotter,
    td::{GridState, SarsaEnvironment, Windy},
    tensors::{Policy, StateValue},
};
use std::fmt::{self, Write};
use textplots::{Chart, Plot, Shape};

/// How a per state vector is laid out on the terminal.
#[derive(Debug, Clone, Copy)]
pub enum Layout {
    /// States in index order, `per_row` to a line, labelled from `first_label`.
    Rows { per_row: usize, first_label: usize },
    /// A `side x side` grid of `row * side + column`, last row printed first.
    Grid { side: usize },
}

/// Renders iteration snapshots as text.
///
/// Policies are shown through `action_label`, which maps an action index to what it means
/// in the exercise. State values are only kept for the snapshot numbers in `value_snapshots`
/// (1 based, counted per call); an empty list keeps them all.
pub struct TextPlotter<F> {
    layout: Layout,
    action_label: F,
    value_snapshots: Vec<usize>,
    values_seen: usize,
    policies: Vec<String>,
    values: Vec<(usize, String)>,
}

impl<F: Fn(u32) -> i64> TextPlotter<F> {
    pub fn new(layout: Layout, action_label: F, value_snapshots: Vec<usize>) -> Self {
        Self {
            layout,
            action_label,
            value_snapshots,
            values_seen: 0,
            policies: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn policies(&self) -> &[String] {
        &self.policies
    }

    /// Kept value snapshots with their snapshot number.
    pub fn values(&self) -> &[(usize, String)] {
        &self.values
    }

    pub fn render_values(&self, state_value: &StateValue) -> Result<String> {
        let values = state_value.to_vec()?;
        Ok(self.render(&values, 7, |value| format!("{value:.3}")))
    }

    fn render<T>(&self, cells: &[T], width: usize, format: impl Fn(&T) -> String) -> String {
        let mut out = String::new();
        match self.layout {
            Layout::Rows {
                per_row,
                first_label,
            } => {
                for (row, chunk) in cells.chunks(per_row.max(1)).enumerate() {
                    out.push_str(&format!("{:>5} |", first_label + row * per_row));
                    for cell in chunk {
                        out.push_str(&format!(" {:>width$}", format(cell)));
                    }
                    out.push('\n');
                }
            }
            Layout::Grid { side } => {
                let rows: Vec<_> = cells.chunks(side.max(1)).collect();
                for (row, chunk) in rows.iter().enumerate().rev() {
                    out.push_str(&format!("{row:>3} |"));
                    for cell in chunk.iter() {
                        out.push_str(&format!(" {:>width$}", format(cell)));
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}

impl<F: Fn(u32) -> i64> IterationPlotter for TextPlotter<F> {
    fn plot_policy(&mut self, policy: &Policy) -> Result<()> {
        let actions: Vec<i64> = policy
            .to_vec()?
            .into_iter()
            .map(|index| (self.action_label)(index))
            .collect();
        let rendered = self.render(&actions, 3, |action| action.to_string());
        self.policies.push(rendered);
        Ok(())
    }

    fn plot_state_value(&mut self, state_value: &StateValue) -> Result<()> {
        self.values_seen += 1;
        if !self.value_snapshots.is_empty() && !self.value_snapshots.contains(&self.values_seen) {
            return Ok(());
        }
        let rendered = self.render_values(state_value)?;
        self.values.push((self.values_seen, rendered));
        Ok(())
    }
}

/// Line chart of `(x, y)` curves, followed by a table with one line per curve as the legend.
pub fn render_curves(
    x_label: &str,
    curves: &[(String, Vec<(f64, f64)>)],
) -> std::result::Result<String, fmt::Error> {
    let mut out = String::new();
    let Some((_, first)) = curves.first() else {
        return Ok(out);
    };
    let (x_min, x_max) = first
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
            (lo.min(x), hi.max(x))
        });
    if x_min < x_max {
        let lines: Vec<Vec<(f32, f32)>> = curves
            .iter()
            .map(|(_, points)| points.iter().map(|&(x, y)| (x as f32, y as f32)).collect())
            .collect();
        let shapes: Vec<Shape> = lines.iter().map(|line| Shape::Lines(line)).collect();
        let mut chart = Chart::new(120, 40, x_min as f32, x_max as f32);
        let chart = shapes
            .iter()
            .fold(&mut chart, |chart, shape| chart.lineplot(shape));
        chart.axis();
        chart.figures();
        writeln!(out, "{chart}")?;
    }

    write!(out, "{x_label:>16} |")?;
    for (x, _) in first {
        write!(out, " {x:>6.2}")?;
    }
    out.push('\n');
    for (name, points) in curves {
        write!(out, "{name:>16} |")?;
        for (_, y) in points {
            write!(out, " {y:>6.3}")?;
        }
        out.push('\n');
    }
    Ok(out)
}

/// The grid with the visited cells of `path` marked, wind strengths underneath.
pub fn render_path(world: &Windy, path: &[GridState]) -> std::result::Result<String, fmt::Error> {
    let start = world.start();
    let mut out = String::new();
    for y in 0..world.height() {
        for x in 0..world.width() {
            let cell = GridState::new(x, y);
            let mark = if cell == start {
                'S'
            } else if cell == world.goal() {
                'G'
            } else if path.contains(&cell) {
                '*'
            } else {
                '.'
            };
            out.push(mark);
            out.push(' ');
        }
        out.push('\n');
    }
    for x in 0..world.width() {
        write!(out, "{} ", world.wind(x).abs())?;
    }
    out.push('\n');
    Ok(out)
}
