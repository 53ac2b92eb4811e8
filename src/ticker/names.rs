//! Anonymous display names for ticker items
//!
//! An adjective and an animal drawn independently and uniformly. Names are
//! cosmetic: never tied to a participant, never stored.

use rand::Rng;

pub const ADJECTIVES: &[&str] = &[
    "Cerdik",
    "Cepat",
    "Kuat",
    "Bijak",
    "Unik",
    "Gesit",
    "Tangguh",
    "Jenaka",
    "Misterius",
    "Elegan",
    "Sederhana",
    "Juara",
];

pub const ANIMALS: &[&str] = &[
    "Panda",
    "Elang",
    "Harimau",
    "Kancil",
    "Serigala",
    "Naga",
    "Kuda",
    "Merpati",
    "Rajawali",
    "Macan",
    "Penyu",
    "Lumba-lumba",
];

/// Draw a display name using the thread-local generator
pub fn random_display_name() -> String {
    display_name_with(&mut rand::rng())
}

/// Draw a display name from the given generator
pub fn display_name_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let animal = ANIMALS[rng.random_range(0..ANIMALS.len())];
    format!("{} {}", adjective, animal)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_name_is_drawn_from_lists() {
        for _ in 0..50 {
            let name = random_display_name();
            let (adjective, animal) = name.split_once(' ').unwrap();
            assert!(ADJECTIVES.contains(&adjective));
            assert!(ANIMALS.contains(&animal));
        }
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let a = display_name_with(&mut StdRng::seed_from_u64(7));
        let b = display_name_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}
