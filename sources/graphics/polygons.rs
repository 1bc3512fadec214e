//! `stroke_polygon` closes the path through the given points.

manual.stroke_axis();

manual.stroke_polygon(&[[50.0, 50.0], [150.0, 50.0], [100.0, 150.0]]);
manual.stroke_polygon(&[
    [250.0, 50.0],
    [350.0, 50.0],
    [380.0, 120.0],
    [300.0, 170.0],
    [220.0, 120.0],
]);
