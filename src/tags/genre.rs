//! The ID3v1 genre table and ID3v2 genre normalization

use std::collections::HashMap;
use std::sync::OnceLock;

/// ID3v1 genre names, indexed by the genre byte (0..=191).
pub const GENRES: [&str; 192] = [
    "Blues",
    "Classic Rock",
    "Country",
    "Dance",
    "Disco",
    "Funk",
    "Grunge",
    "Hip-Hop",
    "Jazz",
    "Metal",
    "New Age",
    "Oldies",
    "Other",
    "Pop",
    "Rhythm and Blues",
    "Rap",
    "Reggae",
    "Rock",
    "Techno",
    "Industrial",
    "Alternative",
    "Ska",
    "Death Metal",
    "Pranks",
    "Soundtrack",
    "Euro-Techno",
    "Ambient",
    "Trip-Hop",
    "Vocal",
    "Jazz+Funk",
    "Fusion",
    "Trance",
    "Classical",
    "Instrumental",
    "Acid",
    "House",
    "Game",
    "Sound Clip",
    "Gospel",
    "Noise",
    "Alternative Rock",
    "Bass",
    "Soul",
    "Punk",
    "Space",
    "Meditative",
    "Instrumental Pop",
    "Instrumental Rock",
    "Ethnic",
    "Gothic",
    "Darkwave",
    "Techno-Industrial",
    "Electronic",
    "Pop-Folk",
    "Eurodance",
    "Dream",
    "Southern Rock",
    "Comedy",
    "Cult",
    "Gangsta",
    "Top 40",
    "Christian Rap",
    "Pop/Funk",
    "Jungle",
    "Native American",
    "Cabaret",
    "New Wave",
    "Psychedelic",
    "Rave",
    "Showtunes",
    "Trailer",
    "Lo-Fi",
    "Tribal",
    "Acid Punk",
    "Acid Jazz",
    "Polka",
    "Retro",
    "Musical",
    "Rock & Roll",
    "Hard Rock",
    "Folk",
    "Folk-Rock",
    "National Folk",
    "Swing",
    "Fast Fusion",
    "Bebop",
    "Latin",
    "Revival",
    "Celtic",
    "Bluegrass",
    "Avantgarde",
    "Gothic Rock",
    "Progressive Rock",
    "Psychedelic Rock",
    "Symphonic Rock",
    "Slow Rock",
    "Big Band",
    "Chorus",
    "Easy Listening",
    "Acoustic",
    "Humour",
    "Speech",
    "Chanson",
    "Opera",
    "Chamber Music",
    "Sonata",
    "Symphony",
    "Booty Bass",
    "Primus",
    "Porn Groove",
    "Satire",
    "Slow Jam",
    "Club",
    "Tango",
    "Samba",
    "Folklore",
    "Ballad",
    "Power Ballad",
    "Rhythmic Soul",
    "Freestyle",
    "Duet",
    "Punk Rock",
    "Drum Solo",
    "A capella",
    "Euro-House",
    "Dance Hall",
    "Goa",
    "Drum & Bass",
    "Club-House",
    "Hardcore",
    "Terror",
    "Indie",
    "BritPop",
    "Afro-Punk",
    "Polsk Punk",
    "Beat",
    "Christian Gangsta Rap",
    "Heavy Metal",
    "Black Metal",
    "Crossover",
    "Contemporary Christian",
    "Christian Rock",
    "Merengue",
    "Salsa",
    "Thrash Metal",
    "Anime",
    "JPop",
    "Synthpop",
    "Abstract",
    "Art Rock",
    "Baroque",
    "Bhangra",
    "Big Beat",
    "Breakbeat",
    "Chillout",
    "Downtempo",
    "Dub",
    "EBM",
    "Eclectic",
    "Electro",
    "Electroclash",
    "Emo",
    "Experimental",
    "Garage",
    "Global",
    "IDM",
    "Illbient",
    "Industro-Goth",
    "Jam Band",
    "Krautrock",
    "Leftfield",
    "Lounge",
    "Math Rock",
    "New Romantic",
    "Nu-Breakz",
    "Post-Punk",
    "Post-Rock",
    "Psytrance",
    "Shoegaze",
    "Space Rock",
    "Trop Rock",
    "World Music",
    "Neoclassical",
    "Audiobook",
    "Audio Theatre",
    "Neue Deutsche Welle",
    "Podcast",
    "Indie Rock",
    "G-Funk",
    "Dubstep",
    "Garage Rock",
    "Psybient",
];

/// Index of the catch-all "Other" genre
pub const OTHER_GENRE: u8 = 12;

const RHYTHM_AND_BLUES: u8 = 14;

/// Genre name for a v1 genre byte, if the byte is in the table
pub fn genre_name(index: u8) -> Option<&'static str> {
    GENRES.get(index as usize).copied()
}

/// Case-insensitive reverse lookup: genre name to v1 genre byte
pub fn genre_index(name: &str) -> Option<u8> {
    static REVERSE: OnceLock<HashMap<String, u8>> = OnceLock::new();
    let reverse = REVERSE.get_or_init(|| {
        GENRES
            .iter()
            .enumerate()
            .map(|(i, g)| (g.to_lowercase(), i as u8))
            .collect()
    });
    reverse.get(&name.to_lowercase()).copied()
}

/// Canonicalize an ID3v2 `TCON` body.
///
/// `(N)value` where `N` is a table index and `value` is that entry becomes
/// the entry itself; anything else is returned unchanged.
pub fn normalize_v2_genre(body: &str) -> String {
    if let Some(canonical) = parse_indexed_genre(body) {
        return canonical.to_string();
    }
    body.to_string()
}

fn parse_indexed_genre(body: &str) -> Option<&'static str> {
    let rest = body.strip_prefix('(')?;
    let close = rest.find(')')?;
    let index: u8 = rest[..close].parse().ok()?;
    let value = &rest[close + 1..];
    let name = genre_name(index)?;
    if value == name || (index == RHYTHM_AND_BLUES && value == "R&B") {
        Some(name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_anchors() {
        assert_eq!(GENRES.len(), 192);
        assert_eq!(genre_name(0), Some("Blues"));
        assert_eq!(genre_name(12), Some("Other"));
        assert_eq!(genre_name(191), Some("Psybient"));
        assert_eq!(genre_name(192), None);
        assert_eq!(genre_name(255), None);
    }

    #[test]
    fn test_reverse_lookup_is_case_insensitive() {
        assert_eq!(genre_index("rock"), Some(17));
        assert_eq!(genre_index("ROCK & ROLL"), Some(78));
        assert_eq!(genre_index("Polka Punk Fusion"), None);
    }

    #[test]
    fn test_table_names_are_unique() {
        for (i, name) in GENRES.iter().enumerate() {
            assert_eq!(genre_index(name), Some(i as u8), "duplicate entry {}", name);
        }
    }

    #[test]
    fn test_normalize_indexed_genre() {
        assert_eq!(normalize_v2_genre("(17)Rock"), "Rock");
        assert_eq!(normalize_v2_genre("(14)R&B"), "Rhythm and Blues");
        assert_eq!(normalize_v2_genre("(14)Rhythm and Blues"), "Rhythm and Blues");
    }

    #[test]
    fn test_normalize_leaves_other_forms_alone() {
        assert_eq!(normalize_v2_genre("(17)Pop"), "(17)Pop");
        assert_eq!(normalize_v2_genre("(300)Rock"), "(300)Rock");
        assert_eq!(normalize_v2_genre("(17)"), "(17)");
        assert_eq!(normalize_v2_genre("Progressive Trance"), "Progressive Trance");
        assert_eq!(normalize_v2_genre(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for body in ["(17)Rock", "(14)R&B", "(3)Pop", "Folk", "(x)y", "((1)Classic Rock"] {
            let once = normalize_v2_genre(body);
            assert_eq!(normalize_v2_genre(&once), once, "not idempotent for {}", body);
        }
    }
}
