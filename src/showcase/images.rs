use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};

use crate::manual::{DemoRegistry, Manual};
use crate::model::{HorizontalAlignment, ImageBlock, ImageSource, RichParagraph};
use crate::richtext::Span;

pub(super) fn register(registry: &mut DemoRegistry) {
    registry
        .register("images", "plain_image", plain_image)
        .register("images", "scale_and_caption", scale_and_caption);
}

/// Renders a diagonal gradient between two colors as PNG bytes.
pub fn gradient_png(
    width: u32,
    height: u32,
    start: [u8; 3],
    end: [u8; 3],
) -> Result<Vec<u8>, image::ImageError> {
    let width_f = width.saturating_sub(1) as f32;
    let height_f = height.saturating_sub(1) as f32;
    let buffer = ImageBuffer::from_fn(width, height, |x, y| {
        let xf = if width_f > 0.0 { x as f32 / width_f } else { 0.0 };
        let yf = if height_f > 0.0 { y as f32 / height_f } else { 0.0 };
        let mix = (0.65 * xf + 0.35 * yf).clamp(0.0, 1.0);
        let mut channels = [0u8; 3];
        for (index, channel) in channels.iter_mut().enumerate() {
            let start = f32::from(start[index]);
            let end = f32::from(end[index]);
            *channel = (start + (end - start) * mix).round().clamp(0.0, 255.0) as u8;
        }
        Rgb(channels)
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

fn plain_image(manual: &mut Manual) -> anyhow::Result<()> {
    let png = gradient_png(240, 140, [78, 102, 148], [228, 188, 152])?;
    manual.image(ImageBlock::new(ImageSource::from_bytes(png)));
    Ok(())
}

fn scale_and_caption(manual: &mut Manual) -> anyhow::Result<()> {
    let png = gradient_png(240, 140, [60, 92, 180], [200, 220, 255])?;
    manual.image(
        ImageBlock::new(ImageSource::from_bytes(png))
            .with_width(300.0)
            .with_alignment(HorizontalAlignment::Center)
            .with_caption(RichParagraph::new(vec![
                Span::new("A gradient scaled to "),
                Span::new("300pt").bold(),
            ])),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_is_a_decodable_png() {
        let png = gradient_png(4, 3, [0, 0, 0], [255, 255, 255]).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(image::GenericImageView::dimensions(&decoded), (4, 3));
    }
}
