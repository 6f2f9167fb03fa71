// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Built-in exercise catalog used for name suggestions when building a workout.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Exercise;

/// Maximum number of suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 5;

/// Image used when an exercise has none.
pub const DEFAULT_IMAGE_URL: &str = "/images/default-workout.webp";

const DEFAULT_NOTES: &str = "Follow the standard technique.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub category: &'static str,
    pub instructions: &'static str,
    pub image_url: &'static str,
    pub muscle_url: &'static str,
}

/// Suggestion returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Suggestion {
    pub slug: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub entry: CatalogEntry,
}

macro_rules! entry {
    ($name:expr, $category:expr, $instructions:expr, $image:expr, $muscle:expr) => {
        CatalogEntry {
            name: $name,
            category: $category,
            instructions: $instructions,
            image_url: $image,
            muscle_url: $muscle,
        }
    };
}

static CATALOG: &[CatalogEntry] = &[
    // Chest
    entry!(
        "Flat Bench Press",
        "Chest",
        "Hold a two second isometric squeeze at full contraction.",
        "/images/flat-bench-press.jpg",
        "/images/flat-bench-press-muscles.webp"
    ),
    entry!(
        "Incline Bench Press",
        "Chest",
        "Focus on the upper chest. Do not clash the dumbbells at the top.",
        "/images/incline-bench-press.png",
        "/images/incline-bench-press.gif"
    ),
    entry!(
        "Pec Deck",
        "Chest",
        "Keep the elbows slightly bent and feel the stretch.",
        "/images/pec-deck.avif",
        "/images/pec-deck-muscles.avif"
    ),
    entry!(
        "Machine Chest Press",
        "Chest",
        "Adjust the seat so the handles line up with mid chest.",
        "/images/machine-chest-press.jpg",
        "/images/machine-chest-press-muscles.webp"
    ),
    // Back
    entry!(
        "Wide Grip Lat Pulldown",
        "Back",
        "Pull towards the chest while squeezing the shoulder blades.",
        "/images/lat-pulldown.jpeg",
        "/images/lat-pulldown-muscles.webp"
    ),
    entry!(
        "Seated Cable Row",
        "Back",
        "Keep the spine straight and pull the handle towards the navel.",
        "/images/seated-cable-row.webp",
        "/images/seated-cable-row-muscles.webp"
    ),
    entry!(
        "Barbell Bent Over Row",
        "Back",
        "Keep the torso inclined and the core braced.",
        "/images/bent-over-row.jpeg",
        "/images/bent-over-row.webp"
    ),
    // Legs
    entry!(
        "Back Squat",
        "Legs",
        "Keep the heels planted and the spine neutral.",
        "/images/back-squat.webp",
        "/images/back-squat-muscles.avif"
    ),
    entry!(
        "Leg Press",
        "Legs",
        "Do not lock the knees at the top of the movement.",
        "/images/leg-press.webp",
        "/images/leg-press-muscles.webp"
    ),
    entry!(
        "Leg Extension",
        "Legs",
        "Pause briefly at the top and lower under control.",
        "/images/leg-extension.jpg",
        "/images/leg-extension-muscles.webp"
    ),
    entry!(
        "Lying Leg Curl",
        "Legs",
        "Keep the hips pressed into the pad.",
        "/images/leg-curl.jpg",
        "/images/leg-curl-muscles.webp"
    ),
    entry!(
        "Standing Calf Raise",
        "Legs",
        "Use the full range of motion and pause at the bottom.",
        "/images/calf-raise.jpg",
        "/images/calf-raise-muscles.webp"
    ),
    // Shoulders
    entry!(
        "Dumbbell Shoulder Press",
        "Shoulders",
        "Do not arch the lower back while pressing.",
        "/images/shoulder-press.jpg",
        "/images/shoulder-press-muscles.webp"
    ),
    entry!(
        "Barbell Overhead Press",
        "Shoulders",
        "Squeeze the glutes and press in a straight line.",
        "/images/overhead-press.jpg",
        "/images/overhead-press-muscles.webp"
    ),
    entry!(
        "Lateral Raise",
        "Shoulders",
        "Lead with the elbows and stop at shoulder height.",
        "/images/lateral-raise.jpg",
        "/images/lateral-raise-muscles.webp"
    ),
    // Arms
    entry!(
        "Barbell Curl",
        "Biceps",
        "Keep the elbows fixed at your sides.",
        "/images/barbell-curl.jpg",
        "/images/barbell-curl-muscles.webp"
    ),
    entry!(
        "Triceps Pushdown",
        "Triceps",
        "Fully extend the elbows and control the return.",
        "/images/triceps-pushdown.jpg",
        "/images/triceps-pushdown-muscles.webp"
    ),
    entry!(
        "Hammer Curl",
        "Biceps",
        "Neutral grip, no swinging.",
        "/images/hammer-curl.jpg",
        "/images/hammer-curl-muscles.webp"
    ),
];

/// The whole catalog.
pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Catalog entries whose name contains `query`, ignoring case.
///
/// Queries shorter than two characters produce no suggestions.
pub fn suggest(query: &str) -> Vec<Suggestion> {
    let query = query.trim().to_lowercase();
    if query.chars().count() <= 1 {
        return Vec::new();
    }

    CATALOG
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&query))
        .take(MAX_SUGGESTIONS)
        .map(|&entry| Suggestion {
            slug: slugify(entry.name),
            entry,
        })
        .collect()
}

/// Exact (case-insensitive) catalog lookup by name.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    let name = name.trim();
    CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

/// Fill missing media and notes from the catalog, or the defaults.
pub fn enrich(exercise: &mut Exercise) {
    let entry = lookup(&exercise.name);

    if exercise.image_url.is_none() {
        exercise.image_url = Some(
            entry
                .map(|e| e.image_url)
                .unwrap_or(DEFAULT_IMAGE_URL)
                .to_string(),
        );
    }
    if exercise.muscle_url.is_none() {
        exercise.muscle_url = entry.map(|e| e.muscle_url.to_string());
    }
    if exercise.notes.is_none() {
        exercise.notes = Some(
            entry
                .map(|e| e.instructions)
                .unwrap_or(DEFAULT_NOTES)
                .to_string(),
        );
    }
}

/// URL-safe slug: lowercase, accents stripped, anything but letters,
/// digits, whitespace and hyphens removed, whitespace runs turned into `-`.
pub fn slugify(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
