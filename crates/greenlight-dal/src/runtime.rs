use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize, de};

const UNIT_SUFFIX: &str = " mins";

/// Movie runtime in minutes, represented in JSON as `"<n> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Runtime(pub i32);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

impl Runtime {
    pub fn minutes(&self) -> i32 {
        self.0
    }
}

impl From<i32> for Runtime {
    fn from(value: i32) -> Self {
        Runtime(value)
    }
}

impl Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.0, UNIT_SUFFIX)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s.strip_suffix(UNIT_SUFFIX).ok_or(InvalidRuntimeFormat)?;
        if minutes.is_empty() || minutes.starts_with('+') {
            return Err(InvalidRuntimeFormat);
        }
        minutes
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| InvalidRuntimeFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RuntimeVisitor;

        impl de::Visitor<'_> for RuntimeVisitor {
            type Value = Runtime;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string in the form \"<minutes> mins\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(RuntimeVisitor)
    }
}
