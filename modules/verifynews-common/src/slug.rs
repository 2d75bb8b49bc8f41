use uuid::Uuid;

/// Upper bound on the readable part of a slug, before the random suffix.
pub const MAX_SLUG_STEM: usize = 60;

const FALLBACK_STEM: &str = "verification";

/// Lower-case, hyphen-separated ASCII form of `text`.
///
/// Runs of anything that is not an ASCII letter or digit collapse into one
/// hyphen. The result is cut at a word boundary when longer than
/// [`MAX_SLUG_STEM`]. Text with no usable characters yields `verification`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_STEM));
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_STEM {
        let cut = slug[..=MAX_SLUG_STEM]
            .rfind('-')
            .filter(|&i| i > 0)
            .unwrap_or(MAX_SLUG_STEM);
        slug.truncate(cut);
    }

    if slug.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        slug
    }
}

/// Slug for a new record: `slugify(text)` plus eight random hex characters,
/// so two submissions of the same claim get distinct shareable links.
pub fn unique_slug(text: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", slugify(text), &suffix[..8])
}

/// True when `slug` only contains characters [`slugify`] can produce.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
