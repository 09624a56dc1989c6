use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

use crate::data::dataset::Dataset;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::element::Element;

/// Pie charts are only chosen for at most this many slices.
pub const MAX_PIE_SLICES: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

impl ChartKind {
    /// Pie for a handful of shares of 100, bar otherwise.
    pub fn choose(dataset: &Dataset) -> Self {
        if dataset.len() <= MAX_PIE_SLICES && dataset.is_percentage_like() {
            Self::Pie
        } else {
            Self::Bar
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" | "bars" => Ok(Self::Bar),
            "pie" | "donut" => Ok(Self::Pie),
            other => Err(ReelError::validation(format!("unknown chart kind '{other}'"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Dark when the hint mentions a dark look, light otherwise.
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.to_ascii_lowercase();
        if ["dark", "night", "black"].iter().any(|w| hint.contains(w)) {
            Self::Dark
        } else {
            Self::Light
        }
    }

    fn background(self) -> &'static str {
        match self {
            Self::Light => "#ffffff",
            Self::Dark => "#12141c",
        }
    }

    fn foreground(self) -> &'static str {
        match self {
            Self::Light => "#1f2430",
            Self::Dark => "#e8eaf0",
        }
    }

    fn grid(self) -> &'static str {
        match self {
            Self::Light => "#d9dde5",
            Self::Dark => "#2e3240",
        }
    }
}

const PALETTE: [&str; 8] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
];

/// Chart rendering options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartStyle {
    pub kind: ChartKind,
    pub theme: Theme,
    pub width: u32,
    pub height: u32,
}

impl ChartStyle {
    pub fn for_dataset(dataset: &Dataset, theme: Theme) -> Self {
        Self {
            kind: ChartKind::choose(dataset),
            theme,
            width: 960,
            height: 540,
        }
    }
}

/// Render `dataset` as a standalone SVG document.
pub fn render_svg(dataset: &Dataset, style: &ChartStyle) -> ReelResult<String> {
    if dataset.is_empty() {
        return Err(ReelError::data("cannot chart an empty dataset"));
    }
    if style.width == 0 || style.height == 0 {
        return Err(ReelError::validation("chart width/height must be non-zero"));
    }

    let (w, h) = (f64::from(style.width), f64::from(style.height));
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#
    );
    let _ = write!(
        svg,
        r#"<rect width="{w}" height="{h}" fill="{}"/>"#,
        style.theme.background()
    );
    match style.kind {
        ChartKind::Bar => bar_body(&mut svg, dataset, style.theme, w, h),
        ChartKind::Pie => pie_body(&mut svg, dataset, style.theme, w, h),
    }
    svg.push_str("</svg>");
    Ok(svg)
}

/// Render `dataset` straight into a capturable element.
pub fn render_element(dataset: &Dataset, style: &ChartStyle) -> ReelResult<Element> {
    Element::from_svg_str(&render_svg(dataset, style)?)
}

fn bar_body(svg: &mut String, ds: &Dataset, theme: Theme, w: f64, h: f64) {
    let (left, right, top, bottom) = (0.08 * w, 0.04 * w, 0.1 * h, 0.16 * h);
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;
    let baseline = top + plot_h;
    let max = ds.max_value().max(f64::EPSILON);
    let slot = plot_w / ds.len() as f64;
    let bar_w = slot * 0.64;
    let font = (h * 0.035).clamp(8.0, 28.0);
    let fg = theme.foreground();

    let _ = write!(
        svg,
        r#"<line x1="{left}" y1="{baseline}" x2="{}" y2="{baseline}" stroke="{}" stroke-width="2"/>"#,
        left + plot_w,
        theme.grid()
    );
    for (i, p) in ds.entries.iter().enumerate() {
        let bar_h = plot_h * p.value / max;
        let x = left + slot * i as f64 + (slot - bar_w) / 2.0;
        let cx = x + bar_w / 2.0;
        let _ = write!(
            svg,
            r#"<rect x="{x:.2}" y="{:.2}" width="{bar_w:.2}" height="{bar_h:.2}" rx="4" fill="{}"/>"#,
            baseline - bar_h,
            PALETTE[i % PALETTE.len()]
        );
        let _ = write!(
            svg,
            r#"<text x="{cx:.2}" y="{:.2}" font-size="{font:.1}" text-anchor="middle" fill="{fg}">{}</text>"#,
            baseline - bar_h - font * 0.5,
            format_value(p.value, ds.is_percentage_like())
        );
        let _ = write!(
            svg,
            r#"<text x="{cx:.2}" y="{:.2}" font-size="{font:.1}" text-anchor="middle" fill="{fg}">{}</text>"#,
            baseline + font * 1.4,
            escape_xml(&p.name)
        );
    }
}

fn pie_body(svg: &mut String, ds: &Dataset, theme: Theme, w: f64, h: f64) {
    let (cx, cy) = (w / 2.0, h / 2.0);
    let r = w.min(h) * 0.4;
    let font = (h * 0.032).clamp(8.0, 26.0);
    let shares = ds.normalized();
    let fg = theme.foreground();

    let mut angle = -PI / 2.0;
    for (i, p) in shares.entries.iter().enumerate() {
        let sweep = TAU * p.value / 100.0;
        let color = PALETTE[i % PALETTE.len()];
        if sweep >= TAU - 1e-9 {
            let _ = write!(svg, r#"<circle cx="{cx}" cy="{cy}" r="{r:.2}" fill="{color}"/>"#);
        } else if sweep > 0.0 {
            let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x1, y1) = (cx + r * end.cos(), cy + r * end.sin());
            let large = u8::from(sweep > PI);
            let _ = write!(
                svg,
                r#"<path d="M{cx:.2},{cy:.2} L{x0:.2},{y0:.2} A{r:.2},{r:.2} 0 {large} 1 {x1:.2},{y1:.2} Z" fill="{color}" stroke="{}" stroke-width="2"/>"#,
                theme.background()
            );
        }

        let mid = angle + sweep / 2.0;
        let (lx, ly) = (cx + r * 0.62 * mid.cos(), cy + r * 0.62 * mid.sin());
        let _ = write!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" font-size="{font:.1}" text-anchor="middle" fill="{fg}">{} {}</text>"#,
            escape_xml(&p.name),
            format_value(p.value, true)
        );
        angle += sweep;
    }
}

fn format_value(v: f64, percent: bool) -> String {
    let mut s = format!("{v:.1}");
    if s.ends_with(".0") {
        s.truncate(s.len() - 2);
    }
    if percent {
        s.push('%');
    }
    s
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/data/chart.rs"]
mod tests;
