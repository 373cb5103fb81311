use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

pub const ICON_SIZE: u32 = 12;

/// Built-in 12x12 monochrome icons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Camera,
    Gear,
    Wifi,
    Warning,
    Folder,
    Hourglass,
}

// One u16 per row, bit 11 is the leftmost pixel
const CAMERA: [u16; 12] = [
    0b000000000000,
    0b000111100000,
    0b011111111110,
    0b010000000010,
    0b010011110010,
    0b010110011010,
    0b010100001010,
    0b010110011010,
    0b010011110010,
    0b010000000010,
    0b011111111110,
    0b000000000000,
];

const GEAR: [u16; 12] = [
    0b000011110000,
    0b011011110110,
    0b011111111110,
    0b001110011100,
    0b111100001111,
    0b111000000111,
    0b111000000111,
    0b111100001111,
    0b001110011100,
    0b011111111110,
    0b011011110110,
    0b000011110000,
];

const WIFI: [u16; 12] = [
    0b000000000000,
    0b000111111000,
    0b011000000110,
    0b100000000001,
    0b000111111000,
    0b001000000100,
    0b010000000010,
    0b000011110000,
    0b000100001000,
    0b000000000000,
    0b000001100000,
    0b000001100000,
];

const WARNING: [u16; 12] = [
    0b000001100000,
    0b000001100000,
    0b000011110000,
    0b000010010000,
    0b000110011000,
    0b000110011000,
    0b001100001100,
    0b001100001100,
    0b011000000110,
    0b011001100110,
    0b110000000011,
    0b111111111111,
];

const FOLDER: [u16; 12] = [
    0b000000000000,
    0b011110000000,
    0b100001000000,
    0b100000111110,
    0b111111111111,
    0b100000000001,
    0b100000000001,
    0b100000000001,
    0b100000000001,
    0b100000000001,
    0b111111111111,
    0b000000000000,
];

const HOURGLASS: [u16; 12] = [
    0b111111111111,
    0b010000000010,
    0b001000000100,
    0b000111111000,
    0b000011110000,
    0b000001100000,
    0b000001100000,
    0b000010010000,
    0b000100001000,
    0b001001100100,
    0b010111111010,
    0b111111111111,
];

impl Icon {
    pub fn rows(self) -> &'static [u16; 12] {
        match self {
            Icon::Camera => &CAMERA,
            Icon::Gear => &GEAR,
            Icon::Wifi => &WIFI,
            Icon::Warning => &WARNING,
            Icon::Folder => &FOLDER,
            Icon::Hourglass => &HOURGLASS,
        }
    }

    /// Set pixels of the icon with its top-left corner at `origin`
    pub fn pixels(self, origin: Point, color: Rgb565) -> impl Iterator<Item = Pixel<Rgb565>> {
        self.rows().iter().enumerate().flat_map(move |(y, row)| {
            (0..ICON_SIZE as i32).filter_map(move |x| {
                (row & (1 << (ICON_SIZE as i32 - 1 - x)) != 0)
                    .then(|| Pixel(origin + Point::new(x, y as i32), color))
            })
        })
    }

    pub fn draw<D>(self, target: &mut D, origin: Point, color: Rgb565) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.draw_iter(self.pixels(origin, color))
    }
}
