//! Circles take a center and a radius. `stroke_circle` outlines them in the stroke color,
//! `fill_circle` paints them in the fill color.

manual.stroke_axis();

manual.stroke_circle([100.0, 100.0], 75.0);
manual.fill_circle([300.0, 100.0], 50.0);
