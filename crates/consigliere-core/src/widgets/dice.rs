use rand::Rng;

pub const FACES: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roll {
    pub dice: [u8; 2],
}

impl Roll {
    pub fn total(&self) -> u8 {
        self.dice[0] + self.dice[1]
    }
}

/// Two six-sided dice.
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Roll {
    Roll {
        dice: [rng.gen_range(1..=FACES), rng.gen_range(1..=FACES)],
    }
}

/// Pip layout for a die face as three rows of three cells.
pub fn pips(value: u8) -> [&'static str; 3] {
    match value {
        1 => ["   ", " o ", "   "],
        2 => ["o  ", "   ", "  o"],
        3 => ["o  ", " o ", "  o"],
        4 => ["o o", "   ", "o o"],
        5 => ["o o", " o ", "o o"],
        _ => ["o o", "o o", "o o"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rolls_stay_on_the_die() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let roll = roll(&mut rng);
            assert!(roll.dice.iter().all(|d| (1..=FACES).contains(d)));
            assert!((2..=12).contains(&roll.total()));
        }
    }
}
