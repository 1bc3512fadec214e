//! Cap styles shape the ends of open lines and join styles the corners of paths. Both are
//! part of the settings reset after every example.

manual.stroke_axis();
manual.set_line_width(10.0);

manual.set_cap_style(CapStyle::Round);
manual.stroke_horizontal_line(50.0, 200.0, 200.0);

manual.set_join_style(JoinStyle::Bevel);
manual.stroke_polygon(&[[250.0, 50.0], [350.0, 50.0], [300.0, 150.0]]);
