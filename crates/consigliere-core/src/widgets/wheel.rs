use rand::Rng;

/// European single-zero wheel, clockwise from the pointer.
pub const POCKETS: [u8; 37] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

const RED: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocketColor {
    Green,
    Red,
    Black,
}

impl PocketColor {
    pub fn as_str(self) -> &'static str {
        match self {
            PocketColor::Green => "ZERO",
            PocketColor::Red => "RED",
            PocketColor::Black => "BLACK",
        }
    }
}

pub fn color_of(number: u8) -> PocketColor {
    if number == 0 {
        PocketColor::Green
    } else if RED.contains(&number) {
        PocketColor::Red
    } else {
        PocketColor::Black
    }
}

/// Pocket under the pointer after the wheel turned back by `degrees`.
pub fn pocket_at(degrees: f64) -> u8 {
    let segment = 360.0 / POCKETS.len() as f64;
    let normalized = degrees.rem_euclid(360.0);
    let index = (normalized / segment).floor() as usize % POCKETS.len();
    POCKETS[index]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub rotation: f64,
    pub number: u8,
    pub color: PocketColor,
}

/// Five full turns plus a random offset.
pub fn spin<R: Rng + ?Sized>(rng: &mut R) -> Spin {
    let rotation = 5.0 * 360.0 + rng.gen_range(0.0..360.0);
    let number = pocket_at(rotation);
    Spin {
        rotation,
        number,
        color: color_of(number),
    }
}
