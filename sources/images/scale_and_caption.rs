//! `with_width` scales the image while keeping its aspect ratio. Captions are rich text and
//! share the image's alignment.

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
