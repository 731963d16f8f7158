//! Keyword-driven category tagging.

/// Category name -> lowercase keywords that imply it. Scanned over
/// occupation labels, article text, and topic tags.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Greek Gods", &["greek god", "olympian", "greek deity", "greek mytholog"]),
    ("Norse Gods", &["norse god", "asgard", "norse mytholog"]),
    ("Hindu Deities", &["hindu god", "hinduism", "vedic god"]),
    ("Egyptian Gods", &["egyptian god", "egyptian deity"]),
    ("Roman Gods", &["roman god", "roman mytholog"]),
    ("Mesopotamian Gods", &["sumerian god", "babylonian god", "akkadian"]),
    ("Celtic Gods", &["celtic god", "celtic deity"]),
    ("Aztec Gods", &["aztec god", "aztec deity", "mesoamerican"]),
    ("Egyptian Pharaohs", &["pharaoh", "king of egypt"]),
    ("Roman Emperors", &["roman emperor", "emperor of rome"]),
    ("Greek Kings", &["king of macedon", "king of sparta", "king of greece"]),
    ("Sumerian Kings", &["king of sumer", "king of ur"]),
    ("Persian Kings", &["king of persia", "achaemenid", "sassanid"]),
    ("Biblical Figures", &["biblical", "old testament", "new testament", "patriarch"]),
    ("Quranic Figures", &["quran", "islamic prophet"]),
    ("Vedic Figures", &["vedic", "rigveda"]),
    ("British Royals", &["king of england", "queen of england", "house of windsor"]),
    ("Mughal Dynasty", &["mughal emperor", "mughal dynasty"]),
    ("Mongol Khans", &["mongol khan", "golden horde"]),
    ("Ottoman Dynasty", &["ottoman sultan"]),
    ("Americans", &["american president", "united states president"]),
    ("South Asians", &["prime minister of india", "maharaja"]),
];

/// Curated categories for figures whose source descriptions rarely state
/// the obvious. Keys are matched as lowercase substrings of the name.
pub const KNOWN_FIGURES: &[(&str, &[&str])] = &[
    ("zeus", &["Greek Gods", "Mythological"]),
    ("hera", &["Greek Gods", "Mythological"]),
    ("poseidon", &["Greek Gods", "Mythological"]),
    ("athena", &["Greek Gods", "Mythological"]),
    ("apollo", &["Greek Gods", "Mythological"]),
    ("artemis", &["Greek Gods", "Mythological"]),
    ("ares", &["Greek Gods", "Mythological"]),
    ("aphrodite", &["Greek Gods", "Mythological"]),
    ("hermes", &["Greek Gods", "Mythological"]),
    ("hephaestus", &["Greek Gods", "Mythological"]),
    ("demeter", &["Greek Gods", "Mythological"]),
    ("dionysus", &["Greek Gods", "Mythological"]),
    ("heracles", &["Greek Gods", "Mythological"]),
    ("achilles", &["Greek Kings", "Mythological"]),
    ("odysseus", &["Greek Kings", "Mythological"]),
    ("cronus", &["Greek Gods", "Mythological"]),
    ("uranus", &["Greek Gods", "Mythological"]),
    ("gaia", &["Greek Gods", "Mythological"]),
    ("prometheus", &["Greek Gods", "Mythological"]),
    ("perseus", &["Greek Gods", "Mythological"]),
    ("theseus", &["Greek Gods", "Mythological"]),
    ("aeneas", &["Greek Gods", "Mythological"]),
    ("odin", &["Norse Gods", "Mythological"]),
    ("thor", &["Norse Gods", "Mythological"]),
    ("loki", &["Norse Gods", "Mythological"]),
    ("freyr", &["Norse Gods", "Mythological"]),
    ("freyja", &["Norse Gods", "Mythological"]),
    ("baldr", &["Norse Gods", "Mythological"]),
    ("tyr", &["Norse Gods", "Mythological"]),
    ("heimdall", &["Norse Gods", "Mythological"]),
    ("brahma", &["Hindu Deities", "Mythological"]),
    ("vishnu", &["Hindu Deities", "Mythological"]),
    ("shiva", &["Hindu Deities", "Mythological"]),
    ("krishna", &["Hindu Deities", "Mythological"]),
    ("rama", &["Hindu Deities", "Mythological"]),
    ("ganesha", &["Hindu Deities", "Mythological"]),
    ("hanuman", &["Hindu Deities", "Mythological"]),
    ("lakshmi", &["Hindu Deities", "Mythological"]),
    ("saraswati", &["Hindu Deities", "Mythological"]),
    ("osiris", &["Egyptian Gods", "Mythological"]),
    ("isis", &["Egyptian Gods", "Mythological"]),
    ("ra", &["Egyptian Gods", "Mythological"]),
    ("horus", &["Egyptian Gods", "Mythological"]),
    ("set", &["Egyptian Gods", "Mythological"]),
    ("anubis", &["Egyptian Gods", "Mythological"]),
    ("thoth", &["Egyptian Gods", "Mythological"]),
    ("hathor", &["Egyptian Gods", "Mythological"]),
    ("adam", &["Biblical Figures", "Religion & Scripture"]),
    ("eve", &["Biblical Figures", "Religion & Scripture"]),
    ("noah", &["Biblical Figures", "Religion & Scripture"]),
    ("abraham", &["Biblical Figures", "Religion & Scripture"]),
    ("isaac", &["Biblical Figures", "Religion & Scripture"]),
    ("jacob", &["Biblical Figures", "Religion & Scripture"]),
    ("moses", &["Biblical Figures", "Religion & Scripture"]),
    ("david", &["Biblical Figures", "Religion & Scripture"]),
    ("solomon", &["Biblical Figures", "Religion & Scripture"]),
    ("joseph", &["Biblical Figures", "Religion & Scripture"]),
    ("jesus", &["Biblical Figures", "Religion & Scripture"]),
    ("muhammad", &["Quranic Figures", "Religion & Scripture"]),
    ("ali", &["Quranic Figures", "Religion & Scripture"]),
    ("ramesses", &["Egyptian Pharaohs", "Ancient"]),
    ("tutankhamun", &["Egyptian Pharaohs", "Ancient"]),
    ("cleopatra", &["Egyptian Pharaohs", "Ancient"]),
    ("akhenaten", &["Egyptian Pharaohs", "Ancient"]),
    ("julius caesar", &["Roman Emperors", "Ancient"]),
    ("augustus", &["Roman Emperors", "Ancient"]),
    ("nero", &["Roman Emperors", "Ancient"]),
    ("marcus aurelius", &["Roman Emperors", "Ancient"]),
    ("charlemagne", &["Medieval", "Royalty & Dynasties"]),
    ("genghis khan", &["Mongol Khans", "Royalty & Dynasties"]),
    ("kublai khan", &["Mongol Khans", "Royalty & Dynasties"]),
    ("timur", &["Royalty & Dynasties", "Medieval"]),
    ("akbar", &["Mughal Dynasty", "Royalty & Dynasties"]),
    ("babur", &["Mughal Dynasty", "Royalty & Dynasties"]),
    ("alexander the great", &["Greek Kings", "Ancient"]),
    ("ashoka", &["South Asians", "Ancient"]),
    ("napoleon", &["Europeans", "Modern"]),
];

/// Scan text for category keywords, case-insensitively.
pub fn detect(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(cat, _)| cat.to_string())
        .collect()
}

/// Curated categories for a person name, if it matches a known figure.
pub fn known_figure(name: &str) -> Option<Vec<String>> {
    let lowered = name.to_lowercase();
    KNOWN_FIGURES
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map(|(_, cats)| cats.iter().map(|c| c.to_string()).collect())
}
