use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

use crate::grouping::GroupedCount;

/// Chart rendering failures.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to draw chart: {0}")]
    Render(String),
    #[error("failed to encode chart as PNG: {0}")]
    Encode(String),
}

fn render_err<E: std::fmt::Display>(err: E) -> GraphError {
    GraphError::Render(err.to_string())
}

/// Size and labels of a grouped-count bar chart.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    pub title: String,
    /// Caption under the bars; empty for none.
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Pipeline".to_string(),
            x_label: String::new(),
            y_label: "Candidates".to_string(),
            width: 800,
            height: 400,
        }
    }
}

impl GraphOptions {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }
}

/// Renders a grouped count as a vertical bar chart
///
/// Each bucket becomes one bar, in the order given, labelled with the bucket
/// name. The image is drawn into an in-memory RGB buffer and encoded as PNG.
/// When no usable system font is available the bars are drawn without any
/// text rather than failing.
///
/// # Examples
/// ```no_run
/// use candidate_dashboard::graph::{GraphOptions, render_bar_chart};
/// use candidate_dashboard::grouping::GroupedCount;
///
/// let data = vec![GroupedCount { name: "Completed".into(), value: 4 }];
/// let png = render_bar_chart(&data, &GraphOptions::titled("Status Mix")).unwrap();
/// assert!(!png.is_empty());
/// ```
pub fn render_bar_chart(
    data: &[GroupedCount],
    options: &GraphOptions,
) -> Result<Vec<u8>, GraphError> {
    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; (width as usize) * (height as usize) * 3];

    if let Err(err) = draw_bars(&mut pixels, data, options, true) {
        log::warn!("chart '{}' drawn without labels: {err}", options.title);
        pixels.iter_mut().for_each(|p| *p = 0);
        draw_bars(&mut pixels, data, options, false)?;
    }

    let image = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| GraphError::Encode("pixel buffer has the wrong size".to_string()))?;
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageOutputFormat::Png)
        .map_err(|e| GraphError::Encode(e.to_string()))?;
    Ok(png.into_inner())
}

fn draw_bars(
    pixels: &mut [u8],
    data: &[GroupedCount],
    options: &GraphOptions,
    with_text: bool,
) -> Result<(), GraphError> {
    let root = BitMapBackend::with_buffer(pixels, (options.width, options.height))
        .into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let buckets = data.len().max(1) as u32;
    let max_y = data.iter().map(|d| d.value).max().unwrap_or(0) as u32;
    let label_area = if with_text { 40 } else { 0 };

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(10)
        .x_label_area_size(label_area)
        .y_label_area_size(label_area);
    if with_text {
        builder.caption(&options.title, ("sans-serif", 24).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d((0u32..buckets).into_segmented(), 0u32..max_y + 1)
        .map_err(render_err)?;

    if with_text {
        let label_for = |value: &SegmentValue<u32>| match value {
            SegmentValue::CenterOf(idx) => data
                .get(*idx as usize)
                .map(|bucket| bucket.name.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_label_formatter(&label_for)
            .draw()
            .map_err(render_err)?;
    }

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(6)
                .data(
                    data.iter()
                        .enumerate()
                        .map(|(idx, bucket)| (idx as u32, bucket.value as u32)),
                ),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn bucket(name: &str, value: usize) -> GroupedCount {
        GroupedCount {
            name: name.to_string(),
            value,
        }
    }

    fn small() -> GraphOptions {
        GraphOptions {
            width: 320,
            height: 200,
            ..GraphOptions::titled("Status Mix")
        }
    }

    #[test]
    fn renders_png_for_buckets() {
        let data = vec![bucket("Completed", 4), bucket("Scheduled", 2), bucket("Rejected", 1)];
        let png = render_bar_chart(&data, &small()).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 200));
    }

    #[test]
    fn renders_png_for_no_buckets() {
        let png = render_bar_chart(&[], &small()).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn bars_render_without_text() {
        let data = vec![bucket("Completed", 3)];
        let options = small();
        let mut pixels = vec![0u8; 320 * 200 * 3];
        draw_bars(&mut pixels, &data, &options, false).unwrap();
        // White background with at least some blue bar pixels.
        assert!(pixels.chunks(3).any(|px| px == [255, 255, 255]));
        assert!(pixels.chunks(3).any(|px| px == [0, 0, 255]));
    }
}
