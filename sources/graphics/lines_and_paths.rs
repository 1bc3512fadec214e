//! `stroke_horizontal_line` and `stroke_vertical_line` take the two ends of the line and the
//! coordinate it sits on. `stroke_line` connects any two points.

manual.stroke_axis();

manual.stroke_horizontal_line(0.0, 150.0, 100.0);
manual.stroke_vertical_line(0.0, 150.0, 200.0);
manual.stroke_line([250.0, 0.0], [400.0, 150.0]);
