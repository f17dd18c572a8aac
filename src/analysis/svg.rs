use crate::analysis::heatmap::DrawCommand;
use std::fmt::Write as _;

/// Serializes draw commands into a standalone SVG document, in command order.
pub fn render_svg(commands: &[DrawCommand], width: u32, height: u32) -> String {
    let mut out = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}' viewBox='0 0 {width} {height}'>\n"
    );

    for command in commands {
        // Writing into a String cannot fail.
        let _ = match command {
            DrawCommand::FillRoundRect { rect, radius, color } => writeln!(
                out,
                "  <rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' rx='{radius}' ry='{radius}' fill='{}'/>",
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                color.hex()
            ),
            DrawCommand::StrokeRoundRect {
                rect,
                radius,
                color,
                stroke_width,
            } => writeln!(
                out,
                "  <rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' rx='{radius}' ry='{radius}' fill='none' stroke='{}' stroke-width='{stroke_width}'/>",
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                color.hex()
            ),
        };
    }

    out.push_str("</svg>\n");
    out
}
