//! `fill_color` sets the color of fills and text, `stroke_color` the color of lines.

manual.stroke_axis();

manual.fill_color(Color::Rgb(0xe7, 0x4c, 0x3c));
manual.fill_rectangle([50.0, 200.0], 100.0, 100.0);

manual.stroke_color(Color::Rgb(0x29, 0x80, 0xb9));
manual.set_line_width(3.0);
manual.stroke_circle([300.0, 150.0], 50.0);
