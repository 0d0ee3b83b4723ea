//! Scene → standalone SVG document

use std::fmt::Write;

use super::hex;
use super::scene::{Anchor, Prim, Scene};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
}

pub fn render(scene: &Scene) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{}' height='{}' font-family='Helvetica, Arial, sans-serif'>",
        scene.width.round(),
        scene.height.round()
    );
    svg.push_str("<rect width='100%' height='100%' fill='white'/>\n");

    for prim in &scene.prims {
        let _ = match prim {
            Prim::Line {
                from,
                to,
                color,
                width,
            } => writeln!(
                svg,
                "<line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='{:.1}'/>",
                from[0], from[1], to[0], to[1], hex(*color), width
            ),
            Prim::Rect {
                min,
                max,
                fill,
                stroke,
            } => writeln!(
                svg,
                "<rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' fill='{}' stroke='{}'/>",
                min[0].min(max[0]),
                min[1].min(max[1]),
                (max[0] - min[0]).abs(),
                (max[1] - min[1]).abs(),
                fill.map_or("none".to_string(), hex),
                stroke.map_or("none".to_string(), hex)
            ),
            Prim::Circle {
                center,
                radius,
                fill,
                alpha,
            } => writeln!(
                svg,
                "<circle cx='{:.1}' cy='{:.1}' r='{:.1}' fill='{}' fill-opacity='{:.2}'/>",
                center[0], center[1], radius, hex(*fill), alpha
            ),
            Prim::Text {
                pos,
                text,
                size,
                color,
                anchor,
                rotated,
            } => {
                let anchor = match anchor {
                    Anchor::Start => "start",
                    Anchor::Middle => "middle",
                    Anchor::End => "end",
                };
                if *rotated {
                    // rotate about the center point; baseline shifts by the font size
                    let (x, y) = (pos[0] + size * 0.35, pos[1]);
                    writeln!(
                        svg,
                        "<text x='{:.1}' y='{:.1}' font-size='{:.0}' fill='{}' text-anchor='middle' transform='rotate(-90 {:.1} {:.1})'>{}</text>",
                        x, y, size, hex(*color), x, y, escape(text)
                    )
                } else {
                    writeln!(
                        svg,
                        "<text x='{:.1}' y='{:.1}' font-size='{:.0}' fill='{}' text-anchor='{}'>{}</text>",
                        pos[0],
                        pos[1] + size * 0.85,
                        size,
                        hex(*color),
                        anchor,
                        escape(text)
                    )
                }
            }
        };
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_svg_document_shape() {
        let mut scene = Scene::new(100.0, 50.0);
        scene.prims.push(Prim::Circle {
            center: [10.0, 10.0],
            radius: 2.0,
            fill: [0x30, 0x8A, 0xAD],
            alpha: 0.5,
        });
        scene.prims.push(Prim::Text {
            pos: [50.0, 5.0],
            text: "A<B".into(),
            size: 10.0,
            color: [0, 0, 0],
            anchor: Anchor::Middle,
            rotated: false,
        });
        let svg = render(&scene);
        assert!(svg.starts_with("<svg xmlns='http://www.w3.org/2000/svg' width='100' height='50'"));
        assert!(svg.contains("fill='#308AAD' fill-opacity='0.50'"));
        assert!(svg.contains(">A&lt;B</text>"));
        assert_eq!(svg.lines().last(), Some("</svg>"));
    }
}
