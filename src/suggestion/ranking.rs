use crate::types::catalog::RecipeRecord;

pub(crate) const TOP_RECIPE_LIMIT: usize = 15;
pub(crate) const MAX_BODY_CHARS: usize = 180;
pub(crate) const FALLBACK_SUGGESTION: &str = "How about revisiting one of your favorites tonight?";

const ELLIPSIS: &str = "...";

/// Highly rated or favourited recipes, favourites first, then by rating.
///
/// The sort is stable, so ties keep catalog order.
pub(crate) fn top_recipes(recipes: &[RecipeRecord]) -> Vec<&RecipeRecord> {
    let mut top: Vec<&RecipeRecord> = recipes
        .iter()
        .filter(|recipe| recipe.rating.unwrap_or(0.0) >= 4.0 || recipe.favorite)
        .collect();
    top.sort_by(|a, b| {
        b.favorite
            .cmp(&a.favorite)
            .then_with(|| b.rating.unwrap_or(0.0).total_cmp(&a.rating.unwrap_or(0.0)))
    });
    top.truncate(TOP_RECIPE_LIMIT);
    top
}

fn summary_line(recipe: &RecipeRecord) -> String {
    // zero stars reads as unrated
    let stars = match recipe.rating {
        Some(rating) if rating != 0.0 => rating.to_string(),
        _ => "?".to_string(),
    };
    let favorite = if recipe.favorite { ", fav" } else { "" };
    format!(
        "- {} (★{stars}{favorite}, tags: {})",
        recipe.title,
        recipe.tags.join(", ")
    )
}

pub(crate) fn catalog_summary(top: &[&RecipeRecord]) -> String {
    if top.is_empty() {
        return "(none yet)".to_string();
    }
    top.iter()
        .map(|recipe| summary_line(recipe))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn all_titles(recipes: &[RecipeRecord]) -> String {
    let titles = recipes
        .iter()
        .map(|recipe| recipe.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if titles.is_empty() {
        "(none)".to_string()
    } else {
        titles
    }
}

pub(crate) fn system_prompt(household: &str) -> String {
    format!(
        "You are a dinner suggestion assistant for {household}'s private recipe catalog.\n\
         Suggest one specific dinner for tonight. Either revisit a recipe they love or propose something new that fits their taste.\n\
         Keep it very short: one sentence for the suggestion name and one sentence explaining why it fits tonight.\n\
         Do not include JSON or recipe tags. Be warm and direct."
    )
}

pub(crate) fn user_message(summary: &str, titles: &str) -> String {
    format!(
        "Their top-rated and favorite recipes:\n{summary}\n\n\
         All recipe titles (for context — don't just repeat these):\n{titles}\n\n\
         What should they make for dinner tonight?"
    )
}

/// Trimmed model output, or the fallback sentence when there is none.
pub(crate) fn suggestion_text(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => FALLBACK_SUGGESTION.to_string(),
    }
}

pub(crate) fn notification_body(suggestion: &str) -> String {
    if suggestion.chars().count() <= MAX_BODY_CHARS {
        return suggestion.to_string();
    }
    let mut body: String = suggestion
        .chars()
        .take(MAX_BODY_CHARS - ELLIPSIS.len())
        .collect();
    body.push_str(ELLIPSIS);
    body
}
