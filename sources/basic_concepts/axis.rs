//! `stroke_axis` draws rulers with a tick every 100 points. By default they span the whole
//! drawing; `AxisSpec` limits their length.

manual.stroke_axis_with(AxisSpec::default().with_width(250.0).with_height(150.0));
manual.stroke_rectangle([50.0, 100.0], 150.0, 50.0);
