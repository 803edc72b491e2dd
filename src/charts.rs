use crate::model::{Analysis, GroupTotal, HistogramBucket, SongPlay};
use crate::page::format_number;
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use serde::Serialize;
use std::f64::consts::TAU;
use std::io::Cursor;
use tracing::{debug, instrument};

pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 600;

const MARGIN_LEFT: u32 = 70;
const MARGIN_RIGHT: u32 = 40;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 60;

const BACKGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const AXIS: Rgb<u8> = Rgb([0x53, 0x53, 0x53]);
const EDGE: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
const ACCENT: Rgb<u8> = Rgb([0x1D, 0xB9, 0x54]);
const PIE_PALETTE: [Rgb<u8>; 5] = [
    Rgb([0x1D, 0xB9, 0x54]),
    Rgb([0x19, 0x14, 0x14]),
    Rgb([0x53, 0x53, 0x53]),
    Rgb([0xB3, 0xB3, 0xB3]),
    Rgb([0xFF, 0xFF, 0xFF]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub value: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub png_base64: String,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub top_songs: Chart,
    pub top_artists: Chart,
    pub genres: Chart,
    pub play_distribution: Chart,
}

impl ChartSet {
    pub fn iter(&self) -> impl Iterator<Item = &Chart> {
        [
            &self.top_songs,
            &self.top_artists,
            &self.genres,
            &self.play_distribution,
        ]
        .into_iter()
    }
}

#[instrument(skip_all, level = "debug")]
pub fn render_charts(analysis: &Analysis) -> Result<ChartSet> {
    let charts = ChartSet {
        top_songs: top_songs_chart(&analysis.top_songs)?,
        top_artists: top_artists_chart(&analysis.top_artists)?,
        genres: genres_chart(&analysis.genres)?,
        play_distribution: play_distribution_chart(&analysis.histogram)?,
    };
    debug!(
        encoded_bytes = charts.iter().map(|chart| chart.png_base64.len()).sum::<usize>(),
        "charts rendered"
    );
    Ok(charts)
}

pub fn top_songs_chart(songs: &[SongPlay]) -> Result<Chart> {
    let values: Vec<u64> = songs.iter().map(|song| song.play_count).collect();
    let image = horizontal_bars(&values);
    Ok(Chart {
        title: "Your Top 10 Songs",
        x_label: "Play Count",
        y_label: "",
        png_base64: encode_png(&image).context("failed to encode top songs chart")?,
        legend: songs
            .iter()
            .map(|song| LegendEntry {
                label: song.label(),
                value: format_number(song.play_count),
                color: None,
            })
            .collect(),
    })
}

pub fn top_artists_chart(artists: &[GroupTotal]) -> Result<Chart> {
    let values: Vec<u64> = artists.iter().map(|artist| artist.play_count).collect();
    let image = pie(&values);
    let total = float_total(&values);
    Ok(Chart {
        title: "Your Top Artists",
        x_label: "",
        y_label: "",
        png_base64: encode_png(&image).context("failed to encode top artists chart")?,
        legend: artists
            .iter()
            .enumerate()
            .map(|(index, artist)| LegendEntry {
                label: artist.name.clone(),
                value: format!("{:.1}%", share_percent(artist.play_count as f64, total)),
                color: Some(hex(PIE_PALETTE[index % PIE_PALETTE.len()])),
            })
            .collect(),
    })
}

pub fn genres_chart(genres: &[GroupTotal]) -> Result<Chart> {
    let values: Vec<u64> = genres.iter().map(|genre| genre.play_count).collect();
    let image = vertical_bars(&values, 0.8, None);
    Ok(Chart {
        title: "Your Genre Distribution",
        x_label: "Genre",
        y_label: "Total Plays",
        png_base64: encode_png(&image).context("failed to encode genre chart")?,
        legend: genres
            .iter()
            .map(|genre| LegendEntry {
                label: genre.name.clone(),
                value: format_number(genre.play_count),
                color: None,
            })
            .collect(),
    })
}

pub fn play_distribution_chart(buckets: &[HistogramBucket]) -> Result<Chart> {
    let values: Vec<u64> = buckets.iter().map(|bucket| bucket.count).collect();
    let image = vertical_bars(&values, 1.0, Some(EDGE));
    Ok(Chart {
        title: "Your Play Count Distribution",
        x_label: "Play Count",
        y_label: "Number of Songs",
        png_base64: encode_png(&image).context("failed to encode play distribution chart")?,
        legend: buckets
            .iter()
            .map(|bucket| LegendEntry {
                label: format!("{:.1} to {:.1}", bucket.lower, bucket.upper),
                value: format_number(bucket.count),
                color: None,
            })
            .collect(),
    })
}

// totals near u64::MAX would overflow an integer sum, so shares work in f64
fn float_total(values: &[u64]) -> f64 {
    values.iter().map(|value| *value as f64).sum()
}

fn share_percent(value: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    value * 100.0 / total
}

fn hex(color: Rgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

fn encode_png(image: &RgbImage) -> Result<String> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .context("png encoding failed")?;
    Ok(STANDARD.encode(cursor.into_inner()))
}

fn blank_canvas() -> RgbImage {
    RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND)
}

fn plot_width() -> u32 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> u32 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn draw_axes(image: &mut RgbImage) {
    let bottom = CHART_HEIGHT - MARGIN_BOTTOM;
    fill_rect(image, MARGIN_LEFT - 2, MARGIN_TOP, MARGIN_LEFT, bottom, AXIS);
    fill_rect(
        image,
        MARGIN_LEFT - 2,
        bottom,
        CHART_WIDTH - MARGIN_RIGHT,
        bottom + 2,
        AXIS,
    );
}

/// One bar per value, first value on top, scaled to the largest value.
fn horizontal_bars(values: &[u64]) -> RgbImage {
    let mut image = blank_canvas();
    draw_axes(&mut image);
    let max = values.iter().copied().max().unwrap_or(0);
    if values.is_empty() || max == 0 {
        return image;
    }

    let slot = plot_height() as f64 / values.len() as f64;
    let thickness = (slot * 0.8).max(1.0);
    for (index, value) in values.iter().enumerate() {
        let length = scale(*value, max, plot_width());
        let top = MARGIN_TOP as f64 + slot * index as f64 + (slot - thickness) / 2.0;
        fill_rect(
            &mut image,
            MARGIN_LEFT,
            top as u32,
            MARGIN_LEFT + length,
            (top + thickness) as u32,
            ACCENT,
        );
    }
    image
}

/// Upright bars left to right. `fill` is the share of each slot the bar covers.
fn vertical_bars(values: &[u64], fill: f64, edge: Option<Rgb<u8>>) -> RgbImage {
    let mut image = blank_canvas();
    draw_axes(&mut image);
    let max = values.iter().copied().max().unwrap_or(0);
    if values.is_empty() || max == 0 {
        return image;
    }

    let bottom = CHART_HEIGHT - MARGIN_BOTTOM;
    let slot = plot_width() as f64 / values.len() as f64;
    let width = (slot * fill).max(1.0);
    for (index, value) in values.iter().enumerate() {
        let height = scale(*value, max, plot_height());
        if height == 0 {
            continue;
        }
        let left = (MARGIN_LEFT as f64 + slot * index as f64 + (slot - width) / 2.0) as u32;
        let right = (left as f64 + width) as u32;
        fill_rect(&mut image, left, bottom - height, right, bottom, ACCENT);
        if let Some(edge) = edge {
            stroke_rect(&mut image, left, bottom - height, right, bottom, edge);
        }
    }
    image
}

/// Slices run clockwise from twelve o'clock in input order.
fn pie(values: &[u64]) -> RgbImage {
    let mut image = blank_canvas();
    let total = float_total(values);
    let center_x = CHART_WIDTH as f64 / 2.0;
    let center_y = CHART_HEIGHT as f64 / 2.0;
    let radius = (plot_height() as f64 / 2.0).min(plot_width() as f64 / 2.0);

    let mut bounds = Vec::with_capacity(values.len());
    let mut running = 0.0_f64;
    for value in values {
        running += *value as f64;
        bounds.push(share_percent(running, total) / 100.0);
    }

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - center_x;
        let dy = y as f64 + 0.5 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > radius {
            continue;
        }
        if distance > radius - 1.5 {
            *pixel = AXIS;
            continue;
        }
        if total <= 0.0 {
            continue;
        }
        let angle = dx.atan2(-dy).rem_euclid(TAU) / TAU;
        let slice = bounds
            .iter()
            .position(|bound| angle < *bound)
            .unwrap_or(values.len() - 1);
        *pixel = PIE_PALETTE[slice % PIE_PALETTE.len()];
    }
    image
}

fn scale(value: u64, max: u64, span: u32) -> u32 {
    ((value as f64 / max as f64) * span as f64).round() as u32
}

fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let x1 = x1.min(image.width());
    let y1 = y1.min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

fn stroke_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    fill_rect(image, x0, y0, x1, y0.saturating_add(1), color);
    fill_rect(image, x0, y1.saturating_sub(1), x1, y1, color);
    fill_rect(image, x0, y0, x0.saturating_add(1), y1, color);
    fill_rect(image, x1.saturating_sub(1), y0, x1, y1, color);
}
