use std::fmt;

use uuid::Uuid;

/// A user UUID in its canonical dashed (long) form, e.g.
/// `069a79f4-44e9-4726-a5be-fca90e38aaf5`.
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LongUuid(pub Uuid);

/// The same identity with dashes stripped — the form Mojang-style profile
/// APIs use in URL paths.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShortUuid(pub String);

impl LongUuid {
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        // Accept both dashed and undashed input; normalize to dashed.
        let normalized = if s.len() == 32 && !s.contains('-') {
            format!(
                "{}-{}-{}-{}-{}",
                &s[0..8],
                &s[8..12],
                &s[12..16],
                &s[16..20],
                &s[20..32]
            )
        } else {
            s.to_string()
        };
        Ok(Self(Uuid::parse_str(&normalized)?))
    }

    pub fn to_short(&self) -> ShortUuid {
        ShortUuid(self.0.simple().to_string())
    }
}

impl fmt::Display for LongUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl fmt::Debug for LongUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LongUuid({})", self.0.hyphenated())
    }
}

impl fmt::Display for ShortUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
