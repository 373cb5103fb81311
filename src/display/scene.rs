use super::framebuffer::FrameBuffer;
use super::icons::Icon;
use crate::frame::FrameData;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Baseline, Text};

/// Colors shared by every screen
pub mod palette {
    use super::super::converter::DisplayConverter;
    use embedded_graphics::pixelcolor::Rgb565;

    pub const BACKGROUND: Rgb565 = DisplayConverter::rgb888_to_rgb565(20, 20, 40);
    pub const STATUS_BAR: Rgb565 = DisplayConverter::rgb888_to_rgb565(40, 40, 70);
    pub const TEXT: Rgb565 = DisplayConverter::rgb888_to_rgb565(255, 255, 255);
    pub const DIM_TEXT: Rgb565 = DisplayConverter::rgb888_to_rgb565(150, 150, 170);
    pub const CAMERA: Rgb565 = DisplayConverter::rgb888_to_rgb565(100, 200, 255);
    pub const SETTINGS: Rgb565 = DisplayConverter::rgb888_to_rgb565(255, 150, 50);
    pub const HIGHLIGHT: Rgb565 = DisplayConverter::rgb888_to_rgb565(255, 255, 255);
    pub const OK: Rgb565 = DisplayConverter::rgb888_to_rgb565(80, 220, 120);
    pub const WARNING: Rgb565 = DisplayConverter::rgb888_to_rgb565(255, 200, 0);
    pub const ERROR: Rgb565 = DisplayConverter::rgb888_to_rgb565(230, 60, 60);
    pub const OVERLAY: Rgb565 = DisplayConverter::rgb888_to_rgb565(0, 0, 0);
    pub const BLACK: Rgb565 = DisplayConverter::rgb888_to_rgb565(0, 0, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    /// 6x10 font
    Small,
    /// 9x15 font
    Large,
}

impl TextSize {
    pub fn char_width(self) -> u32 {
        match self {
            TextSize::Small => 6,
            TextSize::Large => 9,
        }
    }

    pub fn line_height(self) -> u32 {
        match self {
            TextSize::Small => 10,
            TextSize::Large => 15,
        }
    }
}

/// A single declarative drawing step issued by an app
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Clear(Rgb565),
    FillRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Rgb565,
    },
    StrokeRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        fill: Option<Rgb565>,
        stroke: Rgb565,
        stroke_width: u32,
    },
    Circle {
        x: i32,
        y: i32,
        diameter: u32,
        color: Rgb565,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        size: TextSize,
        color: Rgb565,
    },
    Icon {
        x: i32,
        y: i32,
        icon: Icon,
        color: Rgb565,
    },
    /// Camera frame stretched over the whole buffer
    Preview(FrameData),
}

impl DrawCommand {
    /// Draw this command into the buffer
    pub fn apply(&self, buffer: &mut FrameBuffer) {
        // FrameBuffer drawing is infallible
        let _ = match self {
            DrawCommand::Clear(color) => buffer.clear(*color),
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => Rectangle::new(Point::new(*x, *y), Size::new(*width, *height))
                .into_styled(PrimitiveStyle::with_fill(*color))
                .draw(buffer),
            DrawCommand::StrokeRect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
                stroke_width,
            } => {
                let mut style = PrimitiveStyleBuilder::new()
                    .stroke_color(*stroke)
                    .stroke_width(*stroke_width);
                if let Some(fill) = fill {
                    style = style.fill_color(*fill);
                }
                Rectangle::new(Point::new(*x, *y), Size::new(*width, *height))
                    .into_styled(style.build())
                    .draw(buffer)
            }
            DrawCommand::Circle {
                x,
                y,
                diameter,
                color,
            } => Circle::new(Point::new(*x, *y), *diameter)
                .into_styled(PrimitiveStyle::with_fill(*color))
                .draw(buffer),
            DrawCommand::Text {
                x,
                y,
                text,
                size,
                color,
            } => {
                let font = match size {
                    TextSize::Small => &FONT_6X10,
                    TextSize::Large => &FONT_9X15,
                };
                Text::with_baseline(
                    text,
                    Point::new(*x, *y),
                    MonoTextStyle::new(font, *color),
                    Baseline::Top,
                )
                .draw(buffer)
                .map(|_| ())
            }
            DrawCommand::Icon { x, y, icon, color } => {
                icon.draw(buffer, Point::new(*x, *y), *color)
            }
            DrawCommand::Preview(frame) => {
                buffer.blit_frame(frame);
                Ok(())
            }
        };
    }
}

/// Ordered list of draw commands describing one frame
#[derive(Debug, Clone, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: DrawCommand) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn clear(&mut self, color: Rgb565) -> &mut Self {
        self.push(DrawCommand::Clear(color))
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb565) -> &mut Self {
        self.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        })
    }

    pub fn stroke_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        fill: Option<Rgb565>,
        stroke: Rgb565,
    ) -> &mut Self {
        self.push(DrawCommand::StrokeRect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            stroke_width: 1,
        })
    }

    pub fn circle(&mut self, x: i32, y: i32, diameter: u32, color: Rgb565) -> &mut Self {
        self.push(DrawCommand::Circle {
            x,
            y,
            diameter,
            color,
        })
    }

    pub fn text<S: Into<String>>(
        &mut self,
        x: i32,
        y: i32,
        text: S,
        size: TextSize,
        color: Rgb565,
    ) -> &mut Self {
        self.push(DrawCommand::Text {
            x,
            y,
            text: text.into(),
            size,
            color,
        })
    }

    /// Text horizontally centred in a buffer `width` pixels wide
    pub fn centered_text<S: Into<String>>(
        &mut self,
        width: u32,
        y: i32,
        text: S,
        size: TextSize,
        color: Rgb565,
    ) -> &mut Self {
        let text = text.into();
        let text_width = text.chars().count() as i32 * size.char_width() as i32;
        let x = ((width as i32 - text_width) / 2).max(0);
        self.text(x, y, text, size, color)
    }

    pub fn icon(&mut self, x: i32, y: i32, icon: Icon, color: Rgb565) -> &mut Self {
        self.push(DrawCommand::Icon { x, y, icon, color })
    }

    pub fn preview(&mut self, frame: FrameData) -> &mut Self {
        self.push(DrawCommand::Preview(frame))
    }

    /// Compose every command into `buffer`, in order
    pub fn compose(&self, buffer: &mut FrameBuffer) {
        for command in &self.commands {
            command.apply(buffer);
        }
    }

    /// True when some text command contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.commands.iter().any(|command| {
            matches!(command, DrawCommand::Text { text, .. } if text.contains(needle))
        })
    }

    pub fn contains_icon(&self, icon: Icon) -> bool {
        self.commands
            .iter()
            .any(|command| matches!(command, DrawCommand::Icon { icon: i, .. } if *i == icon))
    }
}
