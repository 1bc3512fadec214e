use crate::manual::{DemoRegistry, Manual};
use crate::style::{CapStyle, Dash, JoinStyle};
use crate::Color;

pub(super) fn register(registry: &mut DemoRegistry) {
    registry
        .register("graphics", "lines_and_paths", lines_and_paths)
        .register("graphics", "polygons", polygons)
        .register("graphics", "circles", circles)
        .register("graphics", "rectangles", rectangles)
        .register("graphics", "line_width", line_width)
        .register("graphics", "dash", dash)
        .register("graphics", "cap_and_join_style", cap_and_join_style)
        .register("graphics", "color", color);
}

fn lines_and_paths(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.stroke_horizontal_line(0.0, 150.0, 100.0);
    manual.stroke_vertical_line(0.0, 150.0, 200.0);
    manual.stroke_line([250.0, 0.0], [400.0, 150.0]);
    Ok(())
}

fn polygons(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.stroke_polygon(&[[50.0, 50.0], [150.0, 50.0], [100.0, 150.0]]);
    manual.stroke_polygon(&[
        [250.0, 50.0],
        [350.0, 50.0],
        [380.0, 120.0],
        [300.0, 170.0],
        [220.0, 120.0],
    ]);
    Ok(())
}

fn circles(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.stroke_circle([100.0, 100.0], 75.0);
    manual.fill_circle([300.0, 100.0], 50.0);
    Ok(())
}

fn rectangles(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.stroke_rectangle([50.0, 200.0], 150.0, 100.0);
    manual.fill_rectangle([250.0, 150.0], 100.0, 100.0);
    Ok(())
}

fn line_width(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    let mut y = 200.0;
    for width in [0.5, 1.0, 2.0, 4.0, 8.0] {
        manual.set_line_width(width);
        manual.stroke_horizontal_line(50.0, 350.0, y);
        y -= 40.0;
    }
    Ok(())
}

fn dash(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.dash(5.0);
    manual.stroke_horizontal_line(50.0, 350.0, 200.0);

    manual.dash_with(Dash::new(10.0).with_space(3.0));
    manual.stroke_horizontal_line(50.0, 350.0, 150.0);

    manual.dash_with(Dash::new(10.0).with_space(3.0).with_phase(5.0));
    manual.stroke_horizontal_line(50.0, 350.0, 100.0);

    manual.undash();
    manual.stroke_horizontal_line(50.0, 350.0, 50.0);
    Ok(())
}

fn cap_and_join_style(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();
    manual.set_line_width(10.0);

    manual.set_cap_style(CapStyle::Round);
    manual.stroke_horizontal_line(50.0, 200.0, 200.0);

    manual.set_join_style(JoinStyle::Bevel);
    manual.stroke_polygon(&[[250.0, 50.0], [350.0, 50.0], [300.0, 150.0]]);
    Ok(())
}

fn color(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.fill_color(Color::Rgb(0xe7, 0x4c, 0x3c));
    manual.fill_rectangle([50.0, 200.0], 100.0, 100.0);

    manual.stroke_color(Color::Rgb(0x29, 0x80, 0xb9));
    manual.set_line_width(3.0);
    manual.stroke_circle([300.0, 150.0], 50.0);
    Ok(())
}
