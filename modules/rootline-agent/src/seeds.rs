//! Expansion seeds: famous, well-connected figures across eras and
//! mythologies. Worked through in order whenever the queue runs dry, then
//! the cycle restarts.

use rootline_common::PersonKind;

pub const EXPANSION_SEEDS: &[(&str, PersonKind)] = &[
    ("Noah", PersonKind::Human),
    ("Isaac", PersonKind::Human),
    ("Jacob", PersonKind::Human),
    ("Moses", PersonKind::Human),
    ("King David", PersonKind::Human),
    ("Solomon", PersonKind::Human),
    ("Cronus", PersonKind::Mythological),
    ("Uranus", PersonKind::Mythological),
    ("Heracles", PersonKind::Mythological),
    ("Apollo", PersonKind::Mythological),
    ("Achilles", PersonKind::Human),
    ("Odysseus", PersonKind::Human),
    ("Thor", PersonKind::Mythological),
    ("Loki", PersonKind::Mythological),
    ("Ra", PersonKind::Mythological),
    ("Horus", PersonKind::Mythological),
    ("Cyrus the Great", PersonKind::Human),
    ("Darius I", PersonKind::Human),
    ("Tutankhamun", PersonKind::Human),
    ("Cleopatra", PersonKind::Human),
    ("Ashoka", PersonKind::Human),
    ("Chandragupta Maurya", PersonKind::Human),
    ("Attila the Hun", PersonKind::Human),
    ("Saladin", PersonKind::Human),
    ("Suleiman the Magnificent", PersonKind::Human),
    ("Akbar", PersonKind::Human),
    ("William the Conqueror", PersonKind::Human),
    ("Henry VIII", PersonKind::Human),
    ("Louis XIV", PersonKind::Human),
    ("Napoleon Bonaparte", PersonKind::Human),
    ("Peter the Great", PersonKind::Human),
    ("Qin Shi Huang", PersonKind::Human),
    ("Kublai Khan", PersonKind::Human),
    ("Krishna", PersonKind::Mythological),
    ("Rama", PersonKind::Mythological),
    ("Vishnu", PersonKind::Mythological),
    ("Romulus", PersonKind::Human),
    ("Aeneas", PersonKind::Human),
    ("Henry II of England", PersonKind::Human),
    ("Edward I of England", PersonKind::Human),
    ("Vlad the Impaler", PersonKind::Human),
    ("Ivan the Terrible", PersonKind::Human),
    ("Moctezuma II", PersonKind::Human),
    ("Pachacuti", PersonKind::Human),
    ("Emperor Meiji", PersonKind::Human),
    ("Babur", PersonKind::Human),
    ("Timur", PersonKind::Human),
    ("Hammurabi", PersonKind::Human),
];
