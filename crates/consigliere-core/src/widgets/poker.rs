use std::fmt;

use anyhow::anyhow;
use rand::Rng;
use rand::seq::SliceRandom;

const RANKS: [&str; 13] = [
    "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSuit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl CardSuit {
    const ALL: [CardSuit; 4] = [
        CardSuit::Hearts,
        CardSuit::Diamonds,
        CardSuit::Clubs,
        CardSuit::Spades,
    ];

    pub fn symbol(self) -> char {
        match self {
            CardSuit::Hearts => '♥',
            CardSuit::Diamonds => '♦',
            CardSuit::Clubs => '♣',
            CardSuit::Spades => '♠',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub suit: CardSuit,
    /// 2 through 14 (ace high).
    pub value: u8,
}

impl Card {
    pub fn rank(&self) -> &'static str {
        RANKS[usize::from(self.value - 2)]
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit.symbol())
    }
}

pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    let mut deck: Vec<Card> = CardSuit::ALL
        .iter()
        .flat_map(|&suit| (2..=14).map(move |value| Card { suit, value }))
        .collect();
    deck.shuffle(rng);
    deck
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Player,
    House,
    Push,
}

impl Winner {
    pub fn banner(self) -> &'static str {
        match self {
            Winner::Player => "YOU WIN",
            Winner::House => "HOUSE WINS",
            Winner::Push => "PUSH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Showdown {
    pub player: [Card; 2],
    pub house: [Card; 2],
    pub community: [Card; 5],
    pub winner: Winner,
}

/// High hole card wins; the community cards are dealt for show.
pub fn judge(player: &[Card; 2], house: &[Card; 2]) -> Winner {
    let high = |hand: &[Card; 2]| hand.iter().map(|c| c.value).max().unwrap_or(0);
    match high(player).cmp(&high(house)) {
        std::cmp::Ordering::Greater => Winner::Player,
        std::cmp::Ordering::Less => Winner::House,
        std::cmp::Ordering::Equal => Winner::Push,
    }
}

pub fn deal<R: Rng + ?Sized>(rng: &mut R) -> anyhow::Result<Showdown> {
    let mut deck = shuffled_deck(rng);
    let mut draw = || deck.pop().ok_or_else(|| anyhow!("deck ran out of cards"));

    let player = [draw()?, draw()?];
    let house = [draw()?, draw()?];
    let community = [draw()?, draw()?, draw()?, draw()?, draw()?];
    let winner = judge(&player, &house);
    Ok(Showdown {
        player,
        house,
        community,
        winner,
    })
}
