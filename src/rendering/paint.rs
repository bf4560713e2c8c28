/// Paint command list built from a layout

use crate::rendering::layout::{BoxKind, Layout};

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgb: Rgb,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        rgb: Rgb,
    },
}

/// Build the display list: canvas fill first, then boxes in document order.
pub fn build_display_list(layout: &Layout, background: Rgb) -> Vec<PaintCommand> {
    let mut cmds = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width: layout.width,
        height: layout.height,
        rgb: background,
    }];
    for node in &layout.nodes {
        match &node.kind {
            BoxKind::Block { background: Some(rgb) } => cmds.push(PaintCommand::SolidRect {
                x: node.lb.rect.x,
                y: node.lb.rect.y,
                width: node.lb.rect.width,
                height: node.lb.rect.height,
                rgb: *rgb,
            }),
            BoxKind::Block { background: None } => {}
            BoxKind::Text { lines, scale, color } => {
                let line_height = crate::rendering::layout::LINE_HEIGHT * scale;
                for (i, line) in lines.iter().enumerate() {
                    cmds.push(PaintCommand::Text {
                        x: node.lb.rect.x,
                        y: node.lb.rect.y.saturating_add(i as i32 * line_height as i32),
                        text: line.clone(),
                        scale: *scale,
                        rgb: *color,
                    });
                }
            }
        }
    }
    cmds
}

/// Parse a CSS color: `#rgb`, `#rrggbb`, `rgb(r, g, b)` or a handful of names.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<_>>>()?;
        return match digits.len() {
            3 => Some([digits[0] * 17, digits[1] * 17, digits[2] * 17]),
            6 => Some([
                digits[0] * 16 + digits[1],
                digits[2] * 16 + digits[3],
                digits[4] * 16 + digits[5],
            ]),
            _ => None,
        };
    }
    if let Some(args) = v.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        let parts: Vec<u8> = args
            .split(',')
            .map(|p| p.trim().parse::<u8>().ok())
            .collect::<Option<Vec<_>>>()?;
        return match parts.as_slice() {
            [r, g, b] => Some([*r, *g, *b]),
            _ => None,
        };
    }
    match v.as_str() {
        "white" => Some([255, 255, 255]),
        "black" => Some([0, 0, 0]),
        "red" => Some([255, 0, 0]),
        "green" => Some([0, 128, 0]),
        "blue" => Some([0, 0, 255]),
        "gray" | "grey" => Some([128, 128, 128]),
        _ => None,
    }
}
