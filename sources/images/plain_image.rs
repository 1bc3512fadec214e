//! `image` places an image below the current content at its natural size (300 dpi).

let png = gradient_png(240, 140, [78, 102, 148], [228, 188, 152])?;
manual.image(ImageBlock::new(ImageSource::from_bytes(png)));
