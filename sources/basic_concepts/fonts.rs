//! `font` selects the family and size used by the text that follows.

manual.font(FontRole::Body, 18);
manual.text("Body text at 18 points.");
manual.move_down(10.0);
manual.font(FontRole::Monospace, 10);
manual.text("Monospace text at 10 points.");
