//! Output naming: slugs and the `NNN-slug.ext` filename convention.
//!
//! Output filenames end up hard-coded in hand-written markup, so naming must be
//! a pure function of the source filename and its position in the sorted
//! source listing. Nothing here looks at the clock or the filesystem.
//!
//! ## Slugs
//!
//! - `"Mesa   Comedor!!"` → `"mesa-comedor"`
//! - `"050-escritorio_gamer"` → `"050-escritorio-gamer"`
//! - `"--Á--"` → `"image"` (fallback token)
//!
//! ## Filenames
//!
//! `{index:03}-{slug}.{ext}`, with a 1-based index from the enumeration order:
//! `001-mesa-comedor.webp`.

/// Token used when a stem normalizes to nothing.
pub const DEFAULT_SLUG: &str = "image";

/// Normalize a filename stem into a lowercase, hyphen-separated ASCII slug.
///
/// Every maximal run of characters outside `[a-z0-9]` (after lowercasing)
/// becomes a single hyphen; leading and trailing hyphens are dropped. Returns
/// `fallback` when nothing survives.
pub fn slugify_with_fallback(stem: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    let mut pending_hyphen = false;

    for c in stem.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// [`slugify_with_fallback`] with the stock [`DEFAULT_SLUG`].
pub fn slugify(stem: &str) -> String {
    slugify_with_fallback(stem, DEFAULT_SLUG)
}

/// Whether `value` is already in slug form (non-empty, `[a-z0-9]` tokens
/// joined by single hyphens).
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|token| {
            !token.is_empty()
                && token
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

/// Build the output filename for the `index`-th source (1-based).
pub fn output_file_name(index: usize, slug: &str, extension: &str) -> String {
    format!("{:03}-{}.{}", index, slug, extension)
}
