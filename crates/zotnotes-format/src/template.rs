//! Template substitution for note metadata.
//!
//! Templates carry `{{field}}` placeholders in three forms: plain,
//! wiki-linked `[[{{field}}]]`, and quoted `"{{field}}"`. Creator lists and
//! keyword lists get dedicated handling; every remaining scalar field of
//! the entry is substituted literally. Placeholders that stay unresolved
//! are handled by the configured missing-field policy.

use crate::creators::{self, AuthorKeys};
use lazy_static::lazy_static;
use regex::Regex;
use zotnotes_core::{CreatorRole, ImportConfig, MissingFieldPolicy, ReferenceEntry};

lazy_static! {
    /// Any unresolved `{{field}}` placeholder
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{[^}]+\}\}").unwrap();
    /// An unresolved placeholder inside a wiki link
    static ref PLACEHOLDER_WIKI: Regex = Regex::new(r"\[\[\{\{[^}]+\}\}\]\]").unwrap();
    static ref UPPERCASE: Regex = Regex::new(r"([A-Z])").unwrap();
    /// Characters that cannot appear in a note file name
    static ref UNSAFE_TITLE: Regex = Regex::new(r#"[/\\?%*:|"<>]"#).unwrap();
}

/// `journalArticle` → `Journal Article`.
pub fn camel_to_normal_case(value: &str) -> String {
    let spaced = UPPERCASE.replace_all(value, " $1");
    let spaced = spaced.trim_start();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Percent-encode a filesystem path for a `file://` link, keeping path
/// separators and drive colons readable.
pub fn encode_uri(path: &str) -> String {
    urlencoding::encode(path)
        .replace("%2F", "/")
        .replace("%3A", ":")
        .replace("%5C", "\\")
}

/// `[title](file:///path)` links for every file attachment of the entry.
pub fn local_file_link(entry: &ReferenceEntry) -> String {
    if entry.attachments.is_empty() {
        return "{{localFile}}".to_string();
    }
    let links: Vec<String> = entry
        .attachments
        .iter()
        .filter(|a| a.item_type == "attachment")
        .map(|a| format!("[{}](file:///{})", a.title, encode_uri(&a.path)))
        .collect();
    links.join("; ")
}

/// Scalar substitution table for one entry: exported fields plus the
/// display fields computed at note-generation time.
pub fn build_field_map(entry: &ReferenceEntry, keys: &AuthorKeys) -> Vec<(String, String)> {
    let mut fields = entry.scalar_fields();
    let year = entry.year();

    let in_line = |author: &str| format!("{} ({})", author, year).replace("()", "");
    let citation_in_line = in_line(&keys.surname);
    let citation_in_line_initials = in_line(&keys.initials);
    let citation_in_line_full = in_line(&keys.full_name);

    // the raw camelCase item type is already in the table; display form wins
    if let Some(item_type) = fields.iter_mut().find(|(name, _)| name == "itemType") {
        item_type.1 = camel_to_normal_case(&entry.item_type);
    }

    fields.push(("citeKey".to_string(), entry.citation_key.clone()));
    fields.push(("year".to_string(), year.clone()));
    fields.push(("authorKey".to_string(), keys.surname.clone()));
    fields.push(("authorKeyInitials".to_string(), keys.initials.clone()));
    fields.push(("authorKeyFullName".to_string(), keys.full_name.clone()));
    fields.push(("citationInLine".to_string(), citation_in_line.clone()));
    fields.push((
        "citationInLineInitials".to_string(),
        citation_in_line_initials,
    ));
    fields.push(("citationInLineFullName".to_string(), citation_in_line_full));
    fields.push(("file".to_string(), local_file_link(entry)));

    if !entry.select.is_empty() {
        fields.push((
            "localLibrary".to_string(),
            format!("[Zotero]({})", entry.select),
        ));
        fields.push(("localLibraryLink".to_string(), entry.select.clone()));
    }

    // short and full citations only exist for journal articles
    if entry.item_type == "journalArticle" {
        let citation_short = format!("{} '{}'", citation_in_line, entry.title).replace("** ", "");
        let citation_full = format!(
            "{}, *{}*, {}({}), pp. {}.",
            citation_short, entry.publication_title, entry.volume, entry.issue, entry.pages
        )
        .replace("() ", "")
        .replace("** ", "");
        fields.push(("citationShort".to_string(), citation_short));
        fields.push(("citationFull".to_string(), citation_full));
    }

    fields
}

/// Substitute every `(name, value)` pair into its `{{name}}` placeholders.
/// The wiki and quoted forms fall out naturally, since the inner
/// placeholder is replaced in place.
pub fn replace_field_placeholders(note: &str, fields: &[(String, String)]) -> String {
    let mut rendered = note.to_string();
    for (name, value) in fields {
        rendered = rendered.replace(&format!("{{{{{}}}}}", name), value);
    }
    rendered
}

/// Apply the configured missing-field policy to the placeholders no field
/// resolved, then prune template sections left empty.
pub fn replace_missing_fields(
    note: &str,
    policy: MissingFieldPolicy,
    replacement: &str,
) -> String {
    let mut rendered = note.to_string();

    match policy {
        MissingFieldPolicy::LeavePlaceholder => {}
        MissingFieldPolicy::ReplaceWithCustomText => {
            rendered = PLACEHOLDER_WIKI
                .replace_all(&rendered, replacement)
                .trim()
                .to_string();
            rendered = PLACEHOLDER
                .replace_all(&rendered, replacement)
                .trim()
                .to_string();
        }
        MissingFieldPolicy::RemoveRow => {
            rendered = rendered
                .lines()
                .filter(|line| !PLACEHOLDER.is_match(line))
                .collect::<Vec<_>>()
                .join("\n");
        }
    }

    // sections of the stock template that ended up empty
    rendered = rendered.replace(
        "## Abstract\n\n## Files and Links\n",
        "## Files and Links\n",
    );
    rendered = rendered.replace(
        "## Files and Links\n\n## Zotero Tags\n",
        "## Zotero Tags\n",
    );
    rendered = rendered.replace("## Zotero Tags\n\n", "\n");

    rendered
}

/// Replace single backticks with quotes while keeping fenced code blocks
/// intact.
pub fn normalize_template_backticks(note: &str) -> String {
    const FENCE: &str = "\u{1}FENCE\u{1}";
    note.replace("```", FENCE)
        .replace('`', "'")
        .replace(FENCE, "```")
}

fn ensure_trailing_space(divider: &str) -> String {
    if divider.ends_with(' ') {
        divider.to_string()
    } else {
        format!("{} ", divider)
    }
}

fn substitute_keyword_forms(note: &str, placeholder: &str, tags: &[String], divider: &str) -> String {
    if tags.is_empty() {
        return note.to_string();
    }
    let divider = ensure_trailing_space(divider);
    let wiki: Vec<String> = tags.iter().map(|t| format!("[[{}]]", t)).collect();
    let quoted: Vec<String> = tags.iter().map(|t| format!("\"{}\"", t)).collect();
    let hashed: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();

    note.replace(
        &format!("[[{{{{{}}}}}]]", placeholder),
        &wiki.join(&divider),
    )
    .replace(
        &format!("\"{{{{{}}}}}\"", placeholder),
        &quoted.join(&divider),
    )
    .replace(
        &format!("#{{{{{}}}}}", placeholder),
        &hashed.join(&divider),
    )
    .replace(&format!("{{{{{}}}}}", placeholder), &tags.join(&divider))
}

/// Substitute the keyword-list placeholders: `{{keywordsZotero}}` (library
/// tags), `{{keywordsPDF}}` (keywords extracted from annotations), and
/// `{{keywords}}`/`{{keywordsAll}}` (their union), each in plain, wiki,
/// quoted and hash-tag forms.
pub fn insert_keyword_lists(
    note: &str,
    library_tags: &[String],
    extracted_keywords: &[String],
    divider: &str,
) -> String {
    let mut zotero: Vec<String> = library_tags.to_vec();
    zotero.sort();
    let mut pdf: Vec<String> = extracted_keywords.to_vec();
    pdf.sort();
    let mut combined: Vec<String> = zotero.iter().chain(pdf.iter()).cloned().collect();
    combined.sort();

    let mut rendered = substitute_keyword_forms(note, "keywordsZotero", &zotero, divider);
    rendered = substitute_keyword_forms(&rendered, "keywordsPDF", &pdf, divider);
    rendered = substitute_keyword_forms(&rendered, "keywordsAll", &combined, divider);
    rendered = substitute_keyword_forms(&rendered, "keywords", &combined, divider);

    if zotero.is_empty() {
        rendered = rendered
            .replace("# Tags\n", "")
            .replace("## Tags\n", "")
            .replace("### Tags\n", "");
    }
    rendered
}

/// Render the generated note's file title from the configured pattern.
pub fn note_title(entry: &ReferenceEntry, keys: &AuthorKeys, pattern: &str) -> String {
    let rendered = pattern
        .replace("{{citeKey}}", &entry.citation_key)
        .replace("{{citationKey}}", &entry.citation_key)
        .replace("{{title}}", &entry.title)
        .replace("{{author}}", &keys.surname)
        .replace("{{authors}}", &keys.surname)
        .replace("{{authorInitials}}", &keys.initials)
        .replace("{{authorsInitials}}", &keys.initials)
        .replace("{{authorFullName}}", &keys.full_name)
        .replace("{{authorsFullName}}", &keys.full_name)
        .replace("{{year}}", &entry.year())
        .replace("{{date}}", &entry.year());
    UNSAFE_TITLE.replace_all(&rendered, "").into_owned()
}

/// Render the metadata part of a note: creators, all scalar fields, then
/// backtick cleanup. Missing-field handling and keyword lists run later,
/// once the annotation placeholders are filled in.
pub fn render_metadata(entry: &ReferenceEntry, config: &ImportConfig, template: &str) -> String {
    let keys = AuthorKeys::from_creators(&entry.creators);

    let mut note = creators::render_creator_list(
        &entry.creators,
        CreatorRole::Author,
        template,
        &config.fields_divider,
        &config.name_format,
    );
    note = creators::render_creator_list(
        &entry.creators,
        CreatorRole::Editor,
        &note,
        &config.fields_divider,
        &config.name_format,
    );
    note = creators::render_all_creators(
        &entry.creators,
        &note,
        &config.fields_divider,
        &config.name_format,
    );

    let fields = build_field_map(entry, &keys);
    note = replace_field_placeholders(&note, &fields);

    normalize_template_backticks(&note)
}
