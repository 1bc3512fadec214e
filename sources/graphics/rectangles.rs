//! Rectangles are anchored at their **top-left** corner, followed by width and height.

manual.stroke_axis();

manual.stroke_rectangle([50.0, 200.0], 150.0, 100.0);
manual.fill_rectangle([250.0, 150.0], 100.0, 100.0);
