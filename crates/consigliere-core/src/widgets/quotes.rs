use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

const fn q(text: &'static str, author: &'static str) -> Quote {
    Quote { text, author }
}

pub const MASTER_LIST: [Quote; 20] = [
    q("Never hate your enemies. It affects your judgment.", "Michael Corleone"),
    q("The loudest one in the room is the weakest one in the room.", "Frank Lucas"),
    q("A man who doesn't spend time with his family can never be a real man.", "Don Corleone"),
    q("It is not the man who has too little, but the man who craves more, that is poor.", "Seneca"),
    q("He who fears death will never do anything worth of a man who is alive.", "Seneca"),
    q("The best revenge is not to be like your enemy.", "Marcus Aurelius"),
    q("Finance is a gun. Politics is knowing when to pull the trigger.", "Don Lucchesi"),
    q("I'm not upset that you lied to me, I'm upset that from now on I can't believe you.", "Nietzsche"),
    q("Appear weak when you are strong, and strong when you are weak.", "Sun Tzu"),
    q("The supreme art of war is to subdue the enemy without fighting.", "Sun Tzu"),
    q("Just when I thought I was out, they pull me back in.", "Michael Corleone"),
    q("Power wears out those who do not have it.", "Giulio Andreotti"),
    q("Revenge is a dish best served cold.", "Old Klingon Proverb"),
    q("Keep your friends close, but your enemies closer.", "Michael Corleone"),
    q("I'm gonna make him an offer he can't refuse.", "Don Corleone"),
    q("Waste no more time arguing about what a good man should be. Be one.", "Marcus Aurelius"),
    q("Difficulties strengthen the mind, as labor does the body.", "Seneca"),
    q("We suffer more often in imagination than in reality.", "Seneca"),
    q("Silence is a true friend who never betrays.", "Confucius"),
    q("Real power can't be given. It must be taken.", "The Godfather"),
];

/// Draws without repeats until every quote has been shown, then reshuffles.
#[derive(Debug, Clone, Default)]
pub struct QuoteDeck {
    remaining: Vec<Quote>,
}

impl QuoteDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Quote {
        if self.remaining.is_empty() {
            debug!("quote deck exhausted; reshuffling");
            self.remaining = MASTER_LIST.to_vec();
            self.remaining.shuffle(rng);
        }
        self.remaining.pop().unwrap_or(MASTER_LIST[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    #[test]
    fn each_cycle_shows_every_quote_once() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut deck = QuoteDeck::new();

        for _ in 0..2 {
            let seen: BTreeSet<&str> = (0..MASTER_LIST.len())
                .map(|_| deck.next(&mut rng).text)
                .collect();
            assert_eq!(seen.len(), MASTER_LIST.len());
            assert_eq!(deck.remaining(), 0);
        }
    }
}
