use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::BookingError;
use crate::models::seat::{sort_seats, Category, Seat};

/// Highest column number a layout may use.
pub const MAX_COLUMN: u32 = 999;

/// Rows listed in a rule get that rule's category; unlisted rows are `standard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub rows: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prices {
    pub gold: f64,
    pub silver: f64,
    pub standard: f64,
}

impl Default for Prices {
    fn default() -> Self {
        Prices { gold: 15.0, silver: 10.0, standard: 8.0 }
    }
}

impl Prices {
    pub fn for_category(&self, category: Category) -> f64 {
        match category {
            Category::Gold => self.gold,
            Category::Silver => self.silver,
            Category::Standard => self.standard,
        }
    }
}

/// Описание зала: ряды, диапазон мест в ряду, категории и цены.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub rows: String,
    pub first_column: u32,
    pub last_column: u32,
    pub categories: Vec<CategoryRule>,
    pub prices: Prices,
}

impl Default for LayoutConfig {
    // Зал A-J по 6 мест: A-E gold ($15), F-J silver ($10)
    fn default() -> Self {
        LayoutConfig {
            rows: "ABCDEFGHIJ".to_string(),
            first_column: 1,
            last_column: 6,
            categories: vec![
                CategoryRule { category: Category::Gold, rows: "ABCDE".to_string() },
                CategoryRule { category: Category::Silver, rows: "FGHIJ".to_string() },
            ],
            prices: Prices::default(),
        }
    }
}

impl LayoutConfig {
    /// A single row of `columns` seats, all in one category.
    pub fn single_row(row: char, columns: u32, category: Category, price: f64) -> Self {
        let mut prices = Prices { gold: 0.0, silver: 0.0, standard: 0.0 };
        match category {
            Category::Gold => prices.gold = price,
            Category::Silver => prices.silver = price,
            Category::Standard => prices.standard = price,
        }
        LayoutConfig {
            rows: row.to_string(),
            first_column: 1,
            last_column: columns,
            categories: vec![CategoryRule { category, rows: row.to_string() }],
            prices,
        }
    }

    pub fn row_labels(&self) -> impl Iterator<Item = char> + '_ {
        self.rows.chars().filter(|c| !c.is_whitespace() && *c != ',')
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        let mut seen = HashSet::new();
        for row in self.row_labels() {
            if !row.is_ascii_uppercase() {
                return Err(BookingError::Validation(format!("row `{row}` must be a letter A-Z")));
            }
            if !seen.insert(row) {
                return Err(BookingError::Validation(format!("row `{row}` is listed twice")));
            }
        }
        if seen.is_empty() {
            return Err(BookingError::Validation("layout has no rows".to_string()));
        }
        if self.first_column == 0 || self.first_column > self.last_column {
            return Err(BookingError::Validation(format!(
                "column range {}..={} is empty or starts below 1",
                self.first_column, self.last_column
            )));
        }
        if self.last_column > MAX_COLUMN {
            return Err(BookingError::Validation(format!(
                "last column {} exceeds the maximum of {MAX_COLUMN}",
                self.last_column
            )));
        }

        let mut assigned = HashSet::new();
        for rule in &self.categories {
            for row in rule.rows.chars().filter(|c| !c.is_whitespace() && *c != ',') {
                if !assigned.insert(row) {
                    return Err(BookingError::Validation(format!(
                        "row `{row}` is assigned to more than one category"
                    )));
                }
            }
        }

        for row in &seen {
            let price = self.prices.for_category(self.category_for(*row));
            if !price.is_finite() || price < 0.0 {
                return Err(BookingError::Validation(format!(
                    "price for {} must be a non-negative number",
                    self.category_for(*row)
                )));
            }
        }
        Ok(())
    }

    pub fn category_for(&self, row: char) -> Category {
        self.categories
            .iter()
            .find(|rule| rule.rows.contains(row))
            .map(|rule| rule.category)
            .unwrap_or(Category::Standard)
    }

    pub fn seat_count(&self) -> usize {
        let columns = self.last_column.saturating_sub(self.first_column) as usize + 1;
        self.row_labels().count() * columns
    }

    /// Expands the layout into one seat per (row, column), row-major.
    pub fn seats(&self) -> Result<Vec<Seat>, BookingError> {
        self.validate()?;
        let mut seats = Vec::with_capacity(self.seat_count());
        for row in self.row_labels() {
            let category = self.category_for(row);
            let price = self.prices.for_category(category);
            for column in self.first_column..=self.last_column {
                seats.push(Seat::new(row, column, category, price));
            }
        }
        sort_seats(&mut seats);
        Ok(seats)
    }
}
