//! `dash` makes strokes dashed with gaps as long as the dashes. `dash_with` takes a full
//! pattern with its own gap and phase, and `undash` goes back to solid lines.

manual.stroke_axis();

manual.dash(5.0);
manual.stroke_horizontal_line(50.0, 350.0, 200.0);

manual.dash_with(Dash::new(10.0).with_space(3.0));
manual.stroke_horizontal_line(50.0, 350.0, 150.0);

manual.dash_with(Dash::new(10.0).with_space(3.0).with_phase(5.0));
manual.stroke_horizontal_line(50.0, 350.0, 100.0);

manual.undash();
manual.stroke_horizontal_line(50.0, 350.0, 50.0);
