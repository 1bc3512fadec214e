//! `text` lays out a paragraph below the previous content. Inline markup supports bold,
//! italic, code and colored spans.

manual.text("Text supports **bold**, *italic* and `code` spans.");
manual.move_down(10.0);
manual.fill_color(Color::Rgb(0x1f, 0x5f, 0xa8));
manual.text("The fill color applies to text as well.");
manual.move_down(10.0);
manual.fill_color(Color::Rgb(0, 0, 0));
manual.text("Single words can be [color=#c0392b]{highlighted} inline.");
