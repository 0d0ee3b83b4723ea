//! Scene → RGB raster, used for PNG downloads and PDF pages

use std::io::Cursor;

use image::{Rgb as Pixel, RgbImage};

use super::scene::{Anchor, Prim, Scene};
use super::Rgb;
use crate::error::Result;

/// Render at `scale` pixels per scene unit
pub fn render(scene: &Scene, scale: f32) -> RgbImage {
    let scale = scale.max(0.1);
    let w = (scene.width * scale).round().max(1.0) as u32;
    let h = (scene.height * scale).round().max(1.0) as u32;
    let mut img = RgbImage::from_pixel(w, h, Pixel([255, 255, 255]));
    let s = |p: [f32; 2]| [p[0] * scale, p[1] * scale];

    for prim in &scene.prims {
        match prim {
            Prim::Line {
                from,
                to,
                color,
                width,
            } => {
                let (a, b) = (s(*from), s(*to));
                let thickness = (width * scale).round().max(1.0) as i32;
                for o in 0..thickness {
                    let off = (o - thickness / 2) as f32;
                    // offset perpendicular to the dominant direction
                    let (dx, dy) = if (b[0] - a[0]).abs() >= (b[1] - a[1]).abs() {
                        (0.0, off)
                    } else {
                        (off, 0.0)
                    };
                    draw_line(
                        &mut img,
                        (a[0] + dx).round() as i32,
                        (a[1] + dy).round() as i32,
                        (b[0] + dx).round() as i32,
                        (b[1] + dy).round() as i32,
                        Pixel(*color),
                    );
                }
            }
            Prim::Rect {
                min,
                max,
                fill,
                stroke,
            } => {
                let (a, b) = (s(*min), s(*max));
                if let Some(fill) = fill {
                    fill_rect(&mut img, a, b, *fill);
                }
                if let Some(stroke) = stroke {
                    let c = Pixel(*stroke);
                    let (x0, y0, x1, y1) = (
                        a[0].round() as i32,
                        a[1].round() as i32,
                        b[0].round() as i32,
                        b[1].round() as i32,
                    );
                    draw_line(&mut img, x0, y0, x1, y0, c);
                    draw_line(&mut img, x1, y0, x1, y1, c);
                    draw_line(&mut img, x1, y1, x0, y1, c);
                    draw_line(&mut img, x0, y1, x0, y0, c);
                }
            }
            Prim::Circle {
                center,
                radius,
                fill,
                alpha,
            } => fill_circle(&mut img, s(*center), (radius * scale).max(0.5), *fill, *alpha),
            Prim::Text {
                pos,
                text,
                size,
                color,
                anchor,
                rotated,
            } => {
                let text_scale = ((size * scale) / 5.0).round().max(1.0) as i32;
                let len = text_pixel_width(text, text_scale);
                let p = s(*pos);
                if *rotated {
                    let x = p[0].round() as i32 - 5 * text_scale / 2;
                    let bottom = p[1].round() as i32 + len / 2;
                    draw_text_vertical(&mut img, text, x, bottom, Pixel(*color), text_scale);
                } else {
                    let x = match anchor {
                        Anchor::Start => p[0].round() as i32,
                        Anchor::Middle => p[0].round() as i32 - len / 2,
                        Anchor::End => p[0].round() as i32 - len,
                    };
                    draw_simple_text(&mut img, text, x, p[1].round() as i32, Pixel(*color), text_scale);
                }
            }
        }
    }
    img
}

pub fn to_png_bytes(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

fn put(img: &mut RgbImage, x: i32, y: i32, color: Pixel<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, clipped to the image
fn draw_line(img: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Pixel<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut cx, mut cy) = (x0, y0);
    loop {
        put(img, cx, cy, color);
        if cx == x1 && cy == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            cx += sx;
        }
        if e2 <= dx {
            err += dx;
            cy += sy;
        }
    }
}

fn fill_rect(img: &mut RgbImage, min: [f32; 2], max: [f32; 2], color: Rgb) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let x0 = min[0].min(max[0]).clamp(0.0, w).floor() as u32;
    let x1 = min[0].max(max[0]).clamp(0.0, w).ceil() as u32;
    let y0 = min[1].min(max[1]).clamp(0.0, h).floor() as u32;
    let y1 = min[1].max(max[1]).clamp(0.0, h).ceil() as u32;
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, Pixel(color));
        }
    }
}

fn fill_circle(img: &mut RgbImage, center: [f32; 2], radius: f32, color: Rgb, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    let r2 = radius * radius;
    let y0 = (center[1] - radius).floor().max(0.0) as i32;
    let y1 = (center[1] + radius).ceil() as i32;
    let x0 = (center[0] - radius).floor().max(0.0) as i32;
    let x1 = (center[0] + radius).ceil() as i32;
    for y in y0..=y1.min(img.height() as i32 - 1) {
        for x in x0..=x1.min(img.width() as i32 - 1) {
            let (dx, dy) = (x as f32 + 0.5 - center[0], y as f32 + 0.5 - center[1]);
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let px = img.get_pixel_mut(x as u32, y as u32);
            for k in 0..3 {
                px.0[k] = (px.0[k] as f32 * (1.0 - alpha) + color[k] as f32 * alpha).round() as u8;
            }
        }
    }
}

/// 3×5 bitmap glyphs; letters are case-insensitive
fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '(' | '[' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' | ']' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        'A' | 'a' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' | 'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' | 'c' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' | 'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' | 'e' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' | 'f' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' | 'g' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' | 'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' | 'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' | 'j' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' | 'k' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' | 'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' | 'm' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' | 'n' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' | 'o' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' | 'p' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' | 'q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' | 'r' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' | 's' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' | 't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' | 'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' | 'v' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' | 'w' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' | 'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' | 'y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' | 'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

fn text_pixel_width(text: &str, scale: i32) -> i32 {
    (text.chars().count() as i32 * 4 - 1).max(0) * scale
}

fn draw_simple_text(img: &mut RgbImage, text: &str, x: i32, y: i32, color: Pixel<u8>, scale: i32) {
    let mut cx = x;
    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..3 {
                if (bits >> (2 - col)) & 1 == 1 {
                    for sy in 0..scale {
                        for sx in 0..scale {
                            put(img, cx + col * scale + sx, y + row as i32 * scale + sy, color);
                        }
                    }
                }
            }
        }
        cx += 4 * scale;
    }
}

/// Text turned 90° counter-clockwise, starting at `bottom` and running up
fn draw_text_vertical(img: &mut RgbImage, text: &str, x: i32, bottom: i32, color: Pixel<u8>, scale: i32) {
    let mut along = 0;
    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..3 {
                if (bits >> (2 - col)) & 1 == 1 {
                    for sy in 0..scale {
                        for sx in 0..scale {
                            put(
                                img,
                                x + row as i32 * scale + sy,
                                bottom - (along + col * scale + sx),
                                color,
                            );
                        }
                    }
                }
            }
        }
        along += 4 * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_draws_primitives() {
        let mut scene = Scene::new(40.0, 20.0);
        scene.prims.push(Prim::Rect {
            min: [0.0, 0.0],
            max: [10.0, 10.0],
            fill: Some([255, 0, 0]),
            stroke: None,
        });
        scene.prims.push(Prim::Line {
            from: [20.0, 15.0],
            to: [39.0, 15.0],
            color: [0, 0, 255],
            width: 1.0,
        });
        let img = render(&scene, 1.0);
        assert_eq!((img.width(), img.height()), (40, 20));
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(30, 15).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(30, 5).0, [255, 255, 255]);

        let big = render(&scene, 2.0);
        assert_eq!(big.width(), 80);
    }

    #[test]
    fn test_circle_alpha_blends() {
        let mut img = RgbImage::from_pixel(10, 10, Pixel([255, 255, 255]));
        fill_circle(&mut img, [5.0, 5.0], 3.0, [0, 0, 0], 0.5);
        let p = img.get_pixel(5, 5).0;
        assert!(p[0] > 100 && p[0] < 150);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_text_and_png_encoding() {
        let mut img = RgbImage::from_pixel(30, 10, Pixel([255, 255, 255]));
        draw_simple_text(&mut img, "1", 0, 0, Pixel([0, 0, 0]), 1);
        // top row of the '1' glyph is the middle column
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(text_pixel_width("ab", 2), 14);

        let png = to_png_bytes(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
