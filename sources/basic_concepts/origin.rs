//! The origin of a drawing is the **bottom-left** corner of the space left on the page.
//! Coordinates grow to the right and upwards.

manual.stroke_axis();

manual.fill_circle([0.0, 0.0], 3.0);
manual.draw_text("(0, 0)", [8.0, 8.0], 10);

manual.fill_circle([200.0, 150.0], 3.0);
manual.draw_text("(200, 150)", [208.0, 158.0], 10);
