// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Spark Admin

//! Captcha rendering.
//!
//! Challenges are rendered as inline SVG so no raster image stack is
//! needed; clients receive a data URI suitable for an `<img>` tag.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;

/// Challenge variant. Selected by configuration, not inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaKind {
    /// `a op b = ?`; the answer is the numeric result.
    Arithmetic,
    /// Random letters and digits.
    Alphanumeric,
    /// Random CJK characters.
    Chinese,
    /// Alphanumeric with animated glyphs.
    AnimatedAlphanumeric,
    /// Chinese with animated glyphs.
    AnimatedChinese,
}

impl CaptchaKind {
    /// Parse the configuration value (original wire names kept).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "arithmetic" => Some(Self::Arithmetic),
            "alphanumeric" | "spec" => Some(Self::Alphanumeric),
            "chinese" => Some(Self::Chinese),
            "gif" => Some(Self::AnimatedAlphanumeric),
            "chinese_gif" => Some(Self::AnimatedChinese),
            _ => None,
        }
    }

    fn animated(self) -> bool {
        matches!(self, Self::AnimatedAlphanumeric | Self::AnimatedChinese)
    }
}

/// A rendered challenge: the expected answer plus the image shown to the user.
#[derive(Debug, Clone)]
pub struct RenderedCaptcha {
    /// Expected answer, compared case-insensitively.
    pub answer: String,
    /// Data-URI encoded SVG.
    pub image: String,
}

/// Pool for the Chinese kinds.
const CHINESE_CHARS: &[char] = &[
    '天', '地', '人', '山', '水', '火', '木', '金', '土', '日', '月', '星', '风', '云', '雨',
    '雪', '春', '夏', '秋', '冬', '东', '南', '西', '北', '中', '大', '小', '长', '明', '安',
];

/// Captcha image generator.
pub struct CaptchaGenerator {
    kind: CaptchaKind,
    /// Answer length for text kinds; operand count for arithmetic.
    length: usize,
    width: u32,
    height: u32,
}

impl CaptchaGenerator {
    pub fn new(kind: CaptchaKind, length: usize) -> Self {
        Self {
            kind,
            length: length.max(2),
            width: 130,
            height: 48,
        }
    }

    /// Produce a fresh `(answer, image)` pair.
    pub fn render(&self) -> RenderedCaptcha {
        let (display, answer) = match self.kind {
            CaptchaKind::Arithmetic => self.arithmetic_challenge(),
            CaptchaKind::Alphanumeric | CaptchaKind::AnimatedAlphanumeric => {
                let text = random_text(self.length);
                (text.clone(), text)
            }
            CaptchaKind::Chinese | CaptchaKind::AnimatedChinese => {
                let text = random_chinese(self.length);
                (text.clone(), text)
            }
        };

        let svg = self.draw_svg(&display, self.kind.animated());
        let image = format!("data:image/svg+xml;base64,{}", STANDARD.encode(&svg));
        RenderedCaptcha { answer, image }
    }

    /// Build an arithmetic expression over `length` small operands.
    ///
    /// The stored answer evaluates the display with standard operator
    /// precedence (× before + and -), since that is what a solver will
    /// compute. A subtraction that would take the running total negative
    /// is flipped to addition, so the answer is never negative.
    fn arithmetic_challenge(&self) -> (String, String) {
        let mut rng = rand::rng();
        let count = self.length.clamp(2, 4);
        let operands: Vec<i64> = (0..count).map(|_| rng.random_range(1..=9)).collect();
        let mut ops: Vec<char> = (0..count - 1)
            .map(|_| match rng.random_range(0..3) {
                0 => '+',
                1 => '-',
                _ => '×',
            })
            .collect();

        // Fold × runs into product terms; each term remembers the index
        // of the +/- operator preceding it (None for the first term).
        let mut terms: Vec<(Option<usize>, i64)> = Vec::new();
        let mut product = operands[0];
        let mut sign_idx = None;
        for (i, &op) in ops.iter().enumerate() {
            if op == '×' {
                product *= operands[i + 1];
            } else {
                terms.push((sign_idx, product));
                sign_idx = Some(i);
                product = operands[i + 1];
            }
        }
        terms.push((sign_idx, product));

        let mut total: i64 = 0;
        for (idx, value) in terms {
            match idx {
                Some(i) if ops[i] == '-' && total >= value => total -= value,
                Some(i) if ops[i] == '-' => {
                    ops[i] = '+';
                    total += value;
                }
                _ => total += value,
            }
        }

        let mut display = operands[0].to_string();
        for (i, &op) in ops.iter().enumerate() {
            display.push(op);
            display.push_str(&operands[i + 1].to_string());
        }
        display.push_str("=?");
        (display, total.to_string())
    }

    /// Render the display text with noise lines and per-glyph jitter.
    fn draw_svg(&self, text: &str, animated: bool) -> String {
        let mut rng = rand::rng();
        let (width, height) = (self.width, self.height);

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
        );
        svg.push_str(r##"<rect width="100%" height="100%" fill="#f7f7f7"/>"##);

        // Noise lines
        for _ in 0..6 {
            let x1 = rng.random_range(0..width);
            let y1 = rng.random_range(0..height);
            let x2 = rng.random_range(0..width);
            let y2 = rng.random_range(0..height);
            svg.push_str(&format!(
                r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="rgba(0,0,0,0.2)" stroke-width="1"/>"#
            ));
        }

        // Glyphs with slight randomization
        let chars: Vec<char> = text.chars().collect();
        let char_width = width as f32 / (chars.len() as f32 + 1.0);
        for (i, c) in chars.iter().enumerate() {
            let x = char_width * (i as f32 + 0.7);
            let y = (height as i32 * 2 / 3) + rng.random_range(-6..6);
            let rotation = rng.random_range(-15..15);
            let color = format!(
                "rgb({},{},{})",
                rng.random_range(0..140),
                rng.random_range(0..140),
                rng.random_range(0..140)
            );
            svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" font-family="monospace" font-size="28" font-weight="bold" fill="{color}" transform="rotate({rotation} {x} {y})">{c}"#
            ));
            if animated {
                svg.push_str(&format!(
                    r#"<animate attributeName="y" values="{y};{};{y}" dur="1.2s" repeatCount="indefinite"/>"#,
                    y - 4
                ));
            }
            svg.push_str("</text>");
        }

        svg.push_str("</svg>");
        svg
    }
}

fn random_text(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'A' + idx - 10) as char
            }
        })
        .collect()
}

fn random_chinese(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CHINESE_CHARS[rng.random_range(0..CHINESE_CHARS.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_configuration_values() {
        assert_eq!(CaptchaKind::parse("arithmetic"), Some(CaptchaKind::Arithmetic));
        assert_eq!(CaptchaKind::parse("GIF"), Some(CaptchaKind::AnimatedAlphanumeric));
        assert_eq!(
            CaptchaKind::parse("chinese_gif"),
            Some(CaptchaKind::AnimatedChinese)
        );
        assert_eq!(CaptchaKind::parse("slider"), None);
    }

    #[test]
    fn alphanumeric_answer_has_configured_length() {
        let generator = CaptchaGenerator::new(CaptchaKind::Alphanumeric, 6);
        let rendered = generator.render();
        assert_eq!(rendered.answer.len(), 6);
        assert!(rendered
            .answer
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn image_is_an_svg_data_uri() {
        let generator = CaptchaGenerator::new(CaptchaKind::Alphanumeric, 4);
        let rendered = generator.render();
        assert!(rendered.image.starts_with("data:image/svg+xml;base64,"));
    }

    /// Evaluate `a op b op c ... =?` the way a solver would: × binds
    /// tighter than + and -. Operands are single digits.
    fn solve(display: &str) -> i64 {
        let tokens: Vec<char> = display.strip_suffix("=?").expect("trailing =?").chars().collect();
        let mut total = 0i64;
        let mut sign = 1i64;
        let mut term = tokens[0].to_digit(10).unwrap() as i64;
        let mut i = 1;
        while i < tokens.len() {
            let operand = tokens[i + 1].to_digit(10).unwrap() as i64;
            match tokens[i] {
                '×' => term *= operand,
                '+' => {
                    total += sign * term;
                    sign = 1;
                    term = operand;
                }
                '-' => {
                    total += sign * term;
                    sign = -1;
                    term = operand;
                }
                other => panic!("unexpected operator {other}"),
            }
            i += 2;
        }
        total + sign * term
    }

    #[test]
    fn arithmetic_answer_is_a_non_negative_number() {
        let generator = CaptchaGenerator::new(CaptchaKind::Arithmetic, 4);
        for _ in 0..50 {
            let rendered = generator.render();
            let value: i64 = rendered.answer.parse().expect("numeric answer");
            assert!(value >= 0);
        }
    }

    #[test]
    fn arithmetic_answer_matches_precedence_evaluation() {
        let generator = CaptchaGenerator::new(CaptchaKind::Arithmetic, 4);
        for _ in 0..500 {
            let (display, answer) = generator.arithmetic_challenge();
            let stored: i64 = answer.parse().expect("numeric answer");
            assert_eq!(stored, solve(&display), "display {display}");
            assert!(stored >= 0, "display {display}");
        }
    }

    #[test]
    fn animated_kind_embeds_an_animate_element() {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let generator = CaptchaGenerator::new(CaptchaKind::AnimatedAlphanumeric, 4);
        let rendered = generator.render();
        let b64 = rendered
            .image
            .strip_prefix("data:image/svg+xml;base64,")
            .unwrap();
        let svg = String::from_utf8(STANDARD.decode(b64).unwrap()).unwrap();
        assert!(svg.contains("<animate"));
    }
}
