//! Static Chart Renderer
//! Writes the report charts as PNG files with plotters.
//!
//! Charts:
//! 1. Net profit per trip: horizontal bars, losses in orange
//! 2. Expense breakdown: pie of category totals with percentages
//! 3. Route performance: horizontal bars of average profit per mile
//! 4. Monthly expenses: line of total spend per month

use super::ChartError;
use crate::report::{Aggregates, CategoryTotal, MonthTotal, ReportData, RouteStats, TripProfit};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

// Colors
const BLUE: RGBColor = RGBColor(91, 155, 213); // Profit
const ORANGE: RGBColor = RGBColor(237, 125, 49); // Loss
const GRID: RGBColor = RGBColor(200, 200, 200);

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(255, 87, 34),   // Deep Orange
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

pub const TRIP_PROFITABILITY_FILE: &str = "trip_profitability.png";
pub const EXPENSE_BREAKDOWN_FILE: &str = "expense_breakdown.png";
pub const ROUTE_PERFORMANCE_FILE: &str = "route_performance.png";
pub const MONTHLY_EXPENSES_FILE: &str = "monthly_expenses.png";

const FONT: &str = "sans-serif";

/// Horizontal bar data: one label and value per bar, drawn top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl BarSeries {
    pub fn trip_profit(trips: &[TripProfit]) -> Self {
        Self {
            labels: trips.iter().map(TripProfit::label).collect(),
            values: trips.iter().map(|t| t.net_profit).collect(),
        }
    }

    /// Routes without a profit-per-mile figure are left out.
    pub fn route_performance(routes: &[RouteStats]) -> Self {
        let (labels, values) = routes
            .iter()
            .filter_map(|r| r.avg_profit_per_mile.map(|v| (r.dropoff_location.clone(), v)))
            .unzip();
        Self { labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Value axis range including zero, padded so bars don't touch the frame.
pub fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if min == max {
        return (-1.0, 1.0);
    }
    let pad = (max - min) * 0.1;
    (
        if min < 0.0 { min - pad } else { 0.0 },
        if max > 0.0 { max + pad } else { 0.0 },
    )
}

/// Pie slices with a positive share; returns labels, sizes and colors.
pub fn pie_slices(totals: &[CategoryTotal]) -> (Vec<String>, Vec<f64>, Vec<RGBColor>) {
    let mut labels = Vec::new();
    let mut sizes = Vec::new();
    let mut colors = Vec::new();
    for (i, total) in totals.iter().filter(|t| t.total_spent > 0.0).enumerate() {
        labels.push(total.category.clone());
        sizes.push(total.total_spent);
        colors.push(PALETTE[i % PALETTE.len()]);
    }
    (labels, sizes, colors)
}

pub struct StaticChartRenderer {
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render every chart that has data into `output_dir`.
    pub fn render_all(
        &self,
        data: &ReportData,
        aggregates: &Aggregates,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ChartError> {
        let mut written = Vec::new();

        let trips = BarSeries::trip_profit(&data.trips);
        if self.render_step(&mut written, output_dir, TRIP_PROFITABILITY_FILE, !trips.is_empty(), |p| {
            self.draw_horizontal_bars(
                p,
                "Net Profit per Trip",
                "Net Profit ($)",
                "Trip",
                &trips,
                |_, v| if v < 0.0 { ORANGE } else { BLUE },
            )
        })? {
            log::info!("Rendered trip profitability chart");
        }

        let has_expenses = aggregates.category_totals.iter().any(|t| t.total_spent > 0.0);
        if self.render_step(&mut written, output_dir, EXPENSE_BREAKDOWN_FILE, has_expenses, |p| {
            self.draw_expense_pie(p, &aggregates.category_totals)
        })? {
            log::info!("Rendered expense breakdown chart");
        }

        let routes = BarSeries::route_performance(&aggregates.routes_by_profit);
        if self.render_step(&mut written, output_dir, ROUTE_PERFORMANCE_FILE, !routes.is_empty(), |p| {
            self.draw_horizontal_bars(
                p,
                "Average Profit per Mile by Route",
                "Avg Profit per Mile ($)",
                "Route",
                &routes,
                |i, _| PALETTE[i % PALETTE.len()],
            )
        })? {
            log::info!("Rendered route performance chart");
        }

        let months = &aggregates.month_totals;
        if self.render_step(&mut written, output_dir, MONTHLY_EXPENSES_FILE, !months.is_empty(), |p| {
            self.draw_monthly_line(p, months)
        })? {
            log::info!("Rendered monthly expense chart");
        }

        Ok(written)
    }

    fn render_step<F>(
        &self,
        written: &mut Vec<PathBuf>,
        output_dir: &Path,
        file: &str,
        has_data: bool,
        draw: F,
    ) -> Result<bool, ChartError>
    where
        F: FnOnce(&Path) -> Result<(), ChartError>,
    {
        if !has_data {
            log::warn!("No data for {}, chart skipped", file);
            return Ok(false);
        }
        let path = output_dir.join(file);
        draw(&path)?;
        written.push(path);
        Ok(true)
    }

    fn label_area_width(&self, labels: &[String]) -> u32 {
        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
        (longest * 9 + 30).min(self.width / 2)
    }

    pub fn draw_horizontal_bars<C>(
        &self,
        path: &Path,
        title: &str,
        x_desc: &str,
        y_desc: &str,
        bars: &BarSeries,
        color_for: C,
    ) -> Result<(), ChartError>
    where
        C: Fn(usize, f64) -> RGBColor,
    {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = bars.values.len();
        let (x_min, x_max) = value_range(&bars.values);

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 28).into_font().style(FontStyle::Bold))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(self.label_area_width(&bars.labels))
            .build_cartesian_2d(x_min..x_max, (0..n).into_segmented())?;

        // first bar at the top
        let label_at = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) if *i < n => bars.labels[n - 1 - *i].clone(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_y_mesh()
            .light_line_style(GRID.mix(0.3))
            .y_labels(n)
            .y_label_formatter(&label_at)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .axis_desc_style((FONT, 16))
            .draw()?;

        chart.draw_series(bars.values.iter().enumerate().map(|(k, &v)| {
            let slot = n - 1 - k;
            let mut bar = Rectangle::new(
                [(0.0, SegmentValue::Exact(slot)), (v, SegmentValue::Exact(slot + 1))],
                color_for(k, v).filled(),
            );
            bar.set_margin(4, 4, 0, 0);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    pub fn draw_expense_pie(&self, path: &Path, totals: &[CategoryTotal]) -> Result<(), ChartError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(
            "Total Expense Breakdown by Category",
            (FONT, 28).into_font().style(FontStyle::Bold),
        )?;

        let (labels, sizes, colors) = pie_slices(totals);
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.35;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(140.0);
        pie.label_style((FONT, 18).into_font().color(&BLACK));
        pie.percentages((FONT, radius * 0.08).into_font().color(&BLACK));
        area.draw(&pie)?;

        root.present()?;
        Ok(())
    }

    pub fn draw_monthly_line(&self, path: &Path, months: &[MonthTotal]) -> Result<(), ChartError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = months.len();
        let values: Vec<f64> = months.iter().map(|m| m.total_spent).collect();
        let (y_min, y_max) = value_range(&values);

        let mut chart = ChartBuilder::on(&root)
            .caption("Monthly Expenses", (FONT, 28).into_font().style(FontStyle::Bold))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), y_min..y_max)?;

        let label_at = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) if *i < n => months[*i].month.clone(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID.mix(0.3))
            .x_labels(n)
            .x_label_formatter(&label_at)
            .x_desc("Month")
            .y_desc("Total Spent ($)")
            .axis_desc_style((FONT, 16))
            .draw()?;

        chart.draw_series(
            LineSeries::new(
                months
                    .iter()
                    .enumerate()
                    .map(|(i, m)| (SegmentValue::CenterOf(i), m.total_spent)),
                BLUE.stroke_width(3),
            )
            .point_size(5),
        )?;

        root.present()?;
        Ok(())
    }
}
