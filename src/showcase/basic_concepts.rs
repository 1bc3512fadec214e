use crate::manual::{DemoRegistry, Manual};
use crate::model::AxisSpec;
use crate::style::FontRole;
use crate::Color;

pub(super) fn register(registry: &mut DemoRegistry) {
    registry
        .register("basic_concepts", "origin", origin)
        .register("basic_concepts", "axis", axis)
        .register("basic_concepts", "text", text)
        .register("basic_concepts", "fonts", fonts);
}

fn origin(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis();

    manual.fill_circle([0.0, 0.0], 3.0);
    manual.draw_text("(0, 0)", [8.0, 8.0], 10);

    manual.fill_circle([200.0, 150.0], 3.0);
    manual.draw_text("(200, 150)", [208.0, 158.0], 10);
    Ok(())
}

fn axis(manual: &mut Manual) -> anyhow::Result<()> {
    manual.stroke_axis_with(AxisSpec::default().with_width(250.0).with_height(150.0));
    manual.stroke_rectangle([50.0, 100.0], 150.0, 50.0);
    Ok(())
}

fn text(manual: &mut Manual) -> anyhow::Result<()> {
    manual.text("Text supports **bold**, *italic* and `code` spans.");
    manual.move_down(10.0);
    manual.fill_color(Color::Rgb(0x1f, 0x5f, 0xa8));
    manual.text("The fill color applies to text as well.");
    manual.move_down(10.0);
    manual.fill_color(Color::Rgb(0, 0, 0));
    manual.text("Single words can be [color=#c0392b]{highlighted} inline.");
    Ok(())
}

fn fonts(manual: &mut Manual) -> anyhow::Result<()> {
    manual.font(FontRole::Body, 18);
    manual.text("Body text at 18 points.");
    manual.move_down(10.0);
    manual.font(FontRole::Monospace, 10);
    manual.text("Monospace text at 10 points.");
    Ok(())
}
