use std::fmt;

use crate::api::BookPatch;

pub const COVER_TYPES: &[&str] = &["Hard Cover", "Flexible Cover"];

pub const GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Business",
    "Cookbooks",
    "Drama",
    "Detective",
    "Fantasy",
    "Fiction",
    "History",
    "Horror",
    "Romance",
    "Psychology",
    "Science Fiction",
    "Short Stories",
    "Thriller",
];

pub const CATEGORIES: &[&str] = &["Best Seller", "New Releases", "Best Offers"];

pub const TITLE_MAX_CHARS: usize = 255;
pub const AUTHOR_MAX_CHARS: usize = 64;
pub const SUMMARY_MAX_CHARS: usize = 512;
pub const QUANTITY_MIN: i32 = 1;
pub const QUANTITY_MAX: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Price,
    Summary,
    CoverType,
    Genre,
    Quantity,
    Category,
    CoverId,
}

impl BookField {
    pub fn as_str(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Price => "price",
            BookField::Summary => "summary",
            BookField::CoverType => "cover_type",
            BookField::Genre => "genre",
            BookField::Quantity => "quantity",
            BookField::Category => "category",
            BookField::CoverId => "cover_id",
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: BookField,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// One or more field-level violations, rendered as a single message naming
/// every offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every field must be present and valid (create).
    Full,
    /// Only present fields are checked (updates).
    Partial,
}

/// One row of the rule table. `check` is only consulted for present fields;
/// patches are expected to be normalized first, so "present" already excludes
/// empty and zero values.
struct FieldRule {
    field: BookField,
    is_present: fn(&BookPatch) -> bool,
    check: fn(&BookPatch) -> Option<String>,
}

const RULES: &[FieldRule] = &[
    FieldRule {
        field: BookField::Title,
        is_present: |p| p.title.is_some(),
        check: |p| p.title.as_deref().and_then(|v| too_long(v, TITLE_MAX_CHARS)),
    },
    FieldRule {
        field: BookField::Author,
        is_present: |p| p.author.is_some(),
        check: |p| p.author.as_deref().and_then(|v| too_long(v, AUTHOR_MAX_CHARS)),
    },
    FieldRule {
        field: BookField::Price,
        is_present: |p| p.price.is_some(),
        check: |p| {
            p.price
                .and_then(|v| (v <= 0.0).then(|| "must be greater than 0".to_string()))
        },
    },
    FieldRule {
        field: BookField::Summary,
        is_present: |p| p.summary.is_some(),
        check: |p| p.summary.as_deref().and_then(|v| too_long(v, SUMMARY_MAX_CHARS)),
    },
    FieldRule {
        field: BookField::CoverType,
        is_present: |p| p.cover_type.is_some(),
        check: |p| p.cover_type.as_deref().and_then(|v| outside(v, COVER_TYPES)),
    },
    FieldRule {
        field: BookField::Genre,
        is_present: |p| p.genre.is_some(),
        check: |p| p.genre.as_deref().and_then(|v| outside(v, GENRES)),
    },
    FieldRule {
        field: BookField::Quantity,
        is_present: |p| p.quantity.is_some(),
        check: |p| {
            p.quantity.and_then(|v| {
                (!(QUANTITY_MIN..=QUANTITY_MAX).contains(&v))
                    .then(|| format!("must be between {} and {}", QUANTITY_MIN, QUANTITY_MAX))
            })
        },
    },
    FieldRule {
        field: BookField::Category,
        is_present: |p| p.category.is_some(),
        check: |p| p.category.as_deref().and_then(|v| outside(v, CATEGORIES)),
    },
    FieldRule {
        field: BookField::CoverId,
        // A non-zero cover_id is the whole constraint.
        is_present: |p| p.cover_id.is_some(),
        check: |_| None,
    },
];

fn too_long(value: &str, max: usize) -> Option<String> {
    (value.chars().count() > max).then(|| format!("must be at most {} characters", max))
}

fn outside(value: &str, allowed: &[&str]) -> Option<String> {
    (!allowed.contains(&value)).then(|| format!("must be one of: {}", allowed.join(", ")))
}

/// Walks the rule table over a normalized patch. In `Full` mode an absent
/// field is a violation; in `Partial` mode it is skipped.
pub fn validate(patch: &BookPatch, mode: Mode) -> Result<(), ValidationErrors> {
    collect(patch, |_| mode == Mode::Full)
}

/// Checks a single field against its rule; the field must be present.
pub fn validate_field(patch: &BookPatch, field: BookField) -> Result<(), ValidationErrors> {
    collect(patch, |rule_field| rule_field == field)
}

fn collect(
    patch: &BookPatch,
    required: impl Fn(BookField) -> bool,
) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();
    for rule in RULES {
        if (rule.is_present)(patch) {
            if let Some(message) = (rule.check)(patch) {
                violations.push(Violation {
                    field: rule.field,
                    message,
                });
            }
        } else if required(rule.field) {
            violations.push(Violation {
                field: rule.field,
                message: "is required".to_string(),
            });
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { violations })
    }
}

/// Narrows a patch to a single field, dropping everything else. Used by the
/// per-field update endpoints so only the path-named field reaches storage.
pub fn project(patch: BookPatch, field: BookField) -> BookPatch {
    let mut single = BookPatch::default();
    match field {
        BookField::Title => single.title = patch.title,
        BookField::Author => single.author = patch.author,
        BookField::Price => single.price = patch.price,
        BookField::Summary => single.summary = patch.summary,
        BookField::CoverType => single.cover_type = patch.cover_type,
        BookField::Genre => single.genre = patch.genre,
        BookField::Quantity => single.quantity = patch.quantity,
        BookField::Category => single.category = patch.category,
        BookField::CoverId => single.cover_id = patch.cover_id,
    }
    single
}
