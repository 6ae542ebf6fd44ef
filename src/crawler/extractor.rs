//! Profile page extraction
//!
//! This module turns a profile page into a `ProfessorRecord`:
//! - Locating page markers by class-name substring (the generated class
//!   suffixes change between site deploys, the prefixes do not)
//! - Collecting visible text for each marker
//! - Cleaning the spacing of the name/title and rating-count fields
//!
//! The site-specific rules sit behind the `Extractor` trait so the crawl
//! pipeline can be driven with other extractors in tests.

use crate::record::{ProfessorRecord, RatingEntry};
use scraper::{ElementRef, Html, Selector};

/// Turns a fetched page into a record
pub trait Extractor: Send + Sync {
    /// Extracts a record, or `None` when the page is not a real profile
    fn extract(&self, professor_id: u64, html: &str) -> Option<ProfessorRecord>;
}

/// Extractor for the professor profile markup
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileExtractor;

impl ProfileExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ProfileExtractor {
    /// Parses a profile page
    ///
    /// # Markers
    ///
    /// | Field | Class substring |
    /// |-------|-----------------|
    /// | name_title | `NameTitle` |
    /// | department | `TeacherDepartment` |
    /// | main_rating | `RatingValue__Numerator` |
    /// | num_ratings | `NumRatings` |
    /// | tags | spans in `TeacherTags` |
    /// | would_take_again, level_of_difficulty | 1st, 2nd `FeedbackNumber` |
    /// | ratings | each `Rating__RatingBody` |
    ///
    /// Returns `None` if neither name_title nor department is present.
    fn extract(&self, professor_id: u64, html: &str) -> Option<ProfessorRecord> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let name_title = first_text(root, "NameTitle").map(|s| clean_display_text(&s));
        let department = first_text(root, "TeacherDepartment");

        let mut feedback = positional_texts(root, "FeedbackNumber").into_iter();

        let record = ProfessorRecord {
            professor_id,
            name_title,
            department,
            main_rating: first_text(root, "RatingValue__Numerator"),
            num_ratings: first_text(root, "NumRatings").map(|s| clean_display_text(&s)),
            tags: span_texts(root, "TeacherTags"),
            would_take_again: feedback.next().flatten(),
            level_of_difficulty: feedback.next().flatten(),
            ratings: extract_ratings(root),
        };

        record.has_identity().then_some(record)
    }
}

/// Fixes spacing lost when nested text nodes are concatenated
///
/// Inserts a space at lowercase→uppercase transitions, between letters and
/// digits in either direction, and before a glued `department`; then
/// collapses whitespace runs and trims.
///
/// ```
/// use rating_harvester::crawler::clean_display_text;
///
/// assert_eq!(
///     clean_display_text("JaneDoeProfessor in theMathdepartment"),
///     "Jane Doe Professor in the Math department"
/// );
/// assert_eq!(clean_display_text("Based on12ratings"), "Based on 12 ratings");
/// ```
pub fn clean_display_text(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 8);
    let mut prev: Option<char> = None;

    for c in raw.chars() {
        if let Some(p) = prev {
            let case_break = p.is_lowercase() && c.is_uppercase();
            let letter_digit = p.is_alphabetic() && c.is_ascii_digit();
            let digit_letter = p.is_ascii_digit() && c.is_alphabetic();
            if case_break || letter_digit || digit_letter {
                spaced.push(' ');
            }
        }
        spaced.push(c);
        prev = Some(c);
    }

    spaced
        .replace("department", " department")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_ratings(root: ElementRef<'_>) -> Vec<RatingEntry> {
    let Some(body_selector) = class_selector("Rating__RatingBody") else {
        return Vec::new();
    };

    root.select(&body_selector)
        .map(|body| {
            let mut scores =
                positional_texts(body, "CardNumRating__CardNumRatingNumber").into_iter();
            let (for_credit, attendance) = meta_items(body);

            RatingEntry {
                quality: scores.next().flatten(),
                difficulty: scores.next().flatten(),
                for_credit,
                attendance,
                comment: first_text(body, "Comments__StyledComments"),
                tags: span_texts(body, "RatingTags__StyledTags"),
            }
        })
        .collect()
}

/// Reads the "For Credit" and "Attendance" meta items of one rating
///
/// The value is the first span inside the item; the label is the item's
/// leading text.
fn meta_items(body: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let (Some(item_selector), Ok(span_selector)) = (
        class_selector("MetaItem__StyledMetaItem"),
        Selector::parse("span"),
    ) else {
        return (None, None);
    };

    let mut for_credit = None;
    let mut attendance = None;

    for item in body.select(&item_selector) {
        let Some(label) = visible_text(item) else {
            continue;
        };
        let value = item.select(&span_selector).next().and_then(visible_text);

        if label.starts_with("For Credit") {
            for_credit = value;
        } else if label.starts_with("Attendance") {
            attendance = value;
        }
    }

    (for_credit, attendance)
}

/// Selector matching any element whose class attribute contains `fragment`
fn class_selector(fragment: &str) -> Option<Selector> {
    Selector::parse(&format!("[class*=\"{}\"]", fragment)).ok()
}

fn first_text(scope: ElementRef<'_>, fragment: &str) -> Option<String> {
    let selector = class_selector(fragment)?;
    scope.select(&selector).next().and_then(visible_text)
}

/// Text of every element matching `fragment`, one slot per element
///
/// Empty elements keep their slot as `None` so later values stay in place.
fn positional_texts(scope: ElementRef<'_>, fragment: &str) -> Vec<Option<String>> {
    let Some(selector) = class_selector(fragment) else {
        return Vec::new();
    };
    scope.select(&selector).map(visible_text).collect()
}

/// Texts of the spans inside the first element matching `fragment`
fn span_texts(scope: ElementRef<'_>, fragment: &str) -> Vec<String> {
    let (Some(container_selector), Ok(span_selector)) =
        (class_selector(fragment), Selector::parse("span"))
    else {
        return Vec::new();
    };

    scope
        .select(&container_selector)
        .next()
        .map(|container| {
            container
                .select(&span_selector)
                .filter_map(visible_text)
                .collect()
        })
        .unwrap_or_default()
}

/// Visible text of an element: every text node trimmed, then concatenated
///
/// Empty text counts as absent.
fn visible_text(element: ElementRef<'_>) -> Option<String> {
    let text: String = element.text().map(str::trim).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
