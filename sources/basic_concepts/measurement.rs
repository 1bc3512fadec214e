//! All lengths are PostScript points: 72 points make an inch and about 2.83 points make a
//! millimeter. Page sizes and margins given in millimeters are converted for you.
//@ eval: false

let a4_width_in_points = 210.0 * 72.0 / 25.4;
assert!((a4_width_in_points - 595.28_f64).abs() < 0.01);
