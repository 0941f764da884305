use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ценовая категория места.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gold,
    Silver,
    Standard,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gold => "gold",
            Category::Silver => "silver",
            Category::Standard => "standard",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gold" => Ok(Category::Gold),
            "silver" => Ok(Category::Silver),
            "standard" => Ok(Category::Standard),
            other => Err(format!("unknown seat category `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub seat_id: String,
    pub row: char,
    pub column: u32,
    pub category: Category,
    pub base_price: f64,
}

impl Seat {
    pub fn new(row: char, column: u32, category: Category, base_price: f64) -> Self {
        Seat {
            seat_id: Self::id_for(row, column),
            row,
            column,
            category,
            base_price,
        }
    }

    /// Stable identifier: row letter followed by the column, e.g. `A1`.
    pub fn id_for(row: char, column: u32) -> String {
        format!("{row}{column}")
    }

    /// Row-major ordering key; `A2` sorts before `A10`.
    pub fn position(&self) -> (char, u32) {
        (self.row, self.column)
    }
}

/// Sorts seats row-major, column ascending.
pub fn sort_seats(seats: &mut [Seat]) {
    seats.sort_by_key(Seat::position);
}
