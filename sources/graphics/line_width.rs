//! `set_line_width` changes the width of every stroke that follows. The default is 1 point.

manual.stroke_axis();

let mut y = 200.0;
for width in [0.5, 1.0, 2.0, 4.0, 8.0] {
    manual.set_line_width(width);
    manual.stroke_horizontal_line(50.0, 350.0, y);
    y -= 40.0;
}
