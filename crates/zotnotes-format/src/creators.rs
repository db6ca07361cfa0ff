//! Creator formatting.
//!
//! Author/editor lists are rendered in three modes sharing one joining
//! rule: one name stands alone, two are joined with "and", three with a
//! comma and "and", and anything longer collapses to "first et al.".
//! When an entry has no authors (edited volumes), the editors stand in.

use zotnotes_core::{Creator, CreatorRole};

/// Per-creator rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMode {
    /// Surname only: `Collier`
    Surname,
    /// `Collier, David`, reversed to `David Collier` after the first name
    FullName,
    /// `Collier, D.`
    Initials,
}

/// The three author-key variants computed for one entry.
#[derive(Debug, Clone, Default)]
pub struct AuthorKeys {
    pub surname: String,
    pub initials: String,
    pub full_name: String,
}

impl AuthorKeys {
    /// Compute all three variants for an entry's creators.
    pub fn from_creators(creators: &[Creator]) -> Self {
        Self {
            surname: creator_key(creators, NameMode::Surname).unwrap_or_default(),
            initials: creator_key(creators, NameMode::Initials).unwrap_or_default(),
            full_name: creator_key(creators, NameMode::FullName).unwrap_or_default(),
        }
    }
}

/// Render one creator in the given mode. Returns the primary form and the
/// reversed form used for second and later positions in full-name lists.
/// Creators with no name parts at all render as nothing.
fn render_creator(creator: &Creator, mode: NameMode) -> Option<(String, String)> {
    if let Some(name) = &creator.name {
        let name = name.trim().to_string();
        return Some((name.clone(), name));
    }

    let first = creator.first_name.as_deref().unwrap_or("");
    let last = creator.last_name.as_deref().unwrap_or("");

    match (last.is_empty(), first.is_empty()) {
        (true, true) => None,
        (false, true) => Some((last.to_string(), last.to_string())),
        (true, false) => Some((first.to_string(), first.to_string())),
        (false, false) => {
            let rendered = match mode {
                NameMode::Surname => (last.to_string(), last.to_string()),
                NameMode::FullName => {
                    (format!("{}, {}", last, first), format!("{} {}", first, last))
                }
                NameMode::Initials => {
                    let initial: String = first.chars().take(1).collect();
                    let form = format!("{}, {}.", last, initial);
                    (form.clone(), form)
                }
            };
            Some(rendered)
        }
    }
}

/// Join rendered creators: 1 → `A`; 2 → `A and B`; 3 → `A, B and C`;
/// more → `A et al.`.
fn join_creators(rendered: &[(String, String)]) -> Option<String> {
    let primary = |i: usize| rendered[i].0.as_str();
    let reversed = |i: usize| rendered[i].1.as_str();

    match rendered.len() {
        0 => None,
        1 => Some(primary(0).to_string()),
        2 => Some(format!("{} and {}", primary(0), reversed(1))),
        3 => Some(format!(
            "{}, {} and {}",
            primary(0),
            reversed(1),
            reversed(2)
        )),
        _ => Some(format!("{} et al.", primary(0))),
    }
}

/// Display key for the entry's creators in the given mode: authors when any
/// exist, editors otherwise.
pub fn creator_key(creators: &[Creator], mode: NameMode) -> Option<String> {
    let select = |role: CreatorRole| -> Vec<(String, String)> {
        creators
            .iter()
            .filter(|c| c.creator_type == role)
            .filter_map(|c| render_creator(c, mode))
            .collect()
    };

    let authors = select(CreatorRole::Author);
    join_creators(&authors).or_else(|| join_creators(&select(CreatorRole::Editor)))
}

/// Render one creator through the configured name template
/// (`{{firstName}}`, `{{lastName}}`, `{{firstNameInitials}}`). Absent name
/// parts are removed together with their separators.
pub fn format_creator_name(creator: &Creator, name_format: &str) -> String {
    if let Some(name) = &creator.name {
        return name.trim().to_string();
    }

    let first = creator.first_name.as_deref().unwrap_or("");
    let last = creator.last_name.as_deref().unwrap_or("");
    let mut rendered = name_format.to_string();

    if last.is_empty() {
        rendered = rendered
            .replace("; {{lastName}}", "")
            .replace(", {{lastName}}", "")
            .replace("{{lastName}}", "");
    } else {
        rendered = rendered.replace("{{lastName}}", last);
    }

    if first.is_empty() {
        rendered = rendered
            .replace("; {{firstName}}", "")
            .replace(", {{firstName}}", "")
            .replace("{{firstName}}", "")
            .replace("{{firstNameInitials}}", "");
    } else {
        rendered = rendered
            .replace("{{firstName}}", first)
            .replace("{{firstNameInitials}}", &initials_of(first));
    }

    rendered.trim().to_string()
}

/// `"Jean Michel"` → `"J.M."`: first word initial plus last word initial.
fn initials_of(first_name: &str) -> String {
    let words: Vec<&str> = first_name.split(' ').filter(|w| !w.is_empty()).collect();
    let mut initials = String::new();
    if let Some(first) = words.first() {
        if let Some(c) = first.chars().next() {
            initials.push(c.to_ascii_uppercase());
            initials.push('.');
        }
    }
    if words.len() > 1 {
        if let Some(c) = words[words.len() - 1].chars().next() {
            initials.push(c.to_ascii_uppercase());
            initials.push('.');
        }
    }
    initials
}

fn ensure_trailing_space(divider: &str) -> String {
    if divider.ends_with(' ') {
        divider.to_string()
    } else {
        format!("{} ", divider)
    }
}

/// Replace the `[[{{author}}]]`, `"{{author}}"` and `{{author}}` placeholder
/// forms for one creator role in a template.
pub fn render_creator_list(
    creators: &[Creator],
    role: CreatorRole,
    note: &str,
    divider: &str,
    name_format: &str,
) -> String {
    let rendered: Vec<String> = creators
        .iter()
        .filter(|c| c.creator_type == role)
        .map(|c| format_creator_name(c, name_format))
        .collect();
    if rendered.is_empty() {
        return note.to_string();
    }

    let placeholder = match role {
        CreatorRole::Author => "author",
        CreatorRole::Editor => "editor",
        CreatorRole::Translator => "translator",
        CreatorRole::Other => "contributor",
    };
    substitute_list(note, placeholder, &rendered, divider)
}

/// Replace the `{{creator}}` placeholder forms with every creator,
/// regardless of role.
pub fn render_all_creators(
    creators: &[Creator],
    note: &str,
    divider: &str,
    name_format: &str,
) -> String {
    let rendered: Vec<String> = creators
        .iter()
        .map(|c| format_creator_name(c, name_format))
        .collect();
    if rendered.is_empty() {
        return note.to_string();
    }
    let note = substitute_list(note, "creator", &rendered, divider);
    note.replace("{{Creator}}", &rendered.join(&ensure_trailing_space(divider)))
}

fn substitute_list(note: &str, placeholder: &str, rendered: &[String], divider: &str) -> String {
    let divider = ensure_trailing_space(divider);
    let wiki: Vec<String> = rendered.iter().map(|n| format!("[[{}]]", n)).collect();
    let quoted: Vec<String> = rendered.iter().map(|n| format!("\"{}\"", n)).collect();

    note.replace(
        &format!("[[{{{{{}}}}}]]", placeholder),
        &wiki.join(&divider),
    )
    .replace(
        &format!("\"{{{{{}}}}}\"", placeholder),
        &quoted.join(&divider),
    )
    .replace(&format!("{{{{{}}}}}", placeholder), &rendered.join(&divider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(role: CreatorRole, first: &str, last: &str) -> Creator {
        Creator::person(role, first, last)
    }

    #[test]
    fn test_single_author() {
        let creators = vec![person(CreatorRole::Author, "David", "Collier")];
        assert_eq!(
            creator_key(&creators, NameMode::Surname).unwrap(),
            "Collier"
        );
        assert_eq!(
            creator_key(&creators, NameMode::Initials).unwrap(),
            "Collier, D."
        );
        assert_eq!(
            creator_key(&creators, NameMode::FullName).unwrap(),
            "Collier, David"
        );
    }

    #[test]
    fn test_two_authors() {
        let creators = vec![
            person(CreatorRole::Author, "David", "Collier"),
            person(CreatorRole::Author, "Jody", "Laporte"),
        ];
        assert_eq!(
            creator_key(&creators, NameMode::Surname).unwrap(),
            "Collier and Laporte"
        );
        // the second author reads first-name-first in full-name mode
        assert_eq!(
            creator_key(&creators, NameMode::FullName).unwrap(),
            "Collier, David and Jody Laporte"
        );
    }

    #[test]
    fn test_three_authors() {
        let creators = vec![
            person(CreatorRole::Author, "David", "Collier"),
            person(CreatorRole::Author, "Jody", "Laporte"),
            person(CreatorRole::Author, "Jason", "Seawright"),
        ];
        assert_eq!(
            creator_key(&creators, NameMode::Surname).unwrap(),
            "Collier, Laporte and Seawright"
        );
    }

    #[test]
    fn test_four_authors_et_al() {
        let creators = vec![
            person(CreatorRole::Author, "A", "First"),
            person(CreatorRole::Author, "B", "Second"),
            person(CreatorRole::Author, "C", "Third"),
            person(CreatorRole::Author, "D", "Fourth"),
        ];
        for mode in [NameMode::Surname, NameMode::FullName, NameMode::Initials] {
            assert_eq!(creator_key(&creators, mode).unwrap(), "First et al.");
        }
    }

    #[test]
    fn test_editors_stand_in_for_missing_authors() {
        let creators = vec![
            person(CreatorRole::Editor, "Robert", "Goodin"),
            person(CreatorRole::Editor, "Charles", "Tilly"),
        ];
        assert_eq!(
            creator_key(&creators, NameMode::Surname).unwrap(),
            "Goodin and Tilly"
        );
    }

    #[test]
    fn test_single_display_name() {
        let creators = vec![Creator::named(CreatorRole::Author, "OECD")];
        assert_eq!(creator_key(&creators, NameMode::FullName).unwrap(), "OECD");
    }

    #[test]
    fn test_missing_name_parts_never_panic() {
        let partial = Creator {
            creator_type: CreatorRole::Author,
            name: None,
            first_name: None,
            last_name: Some("Mononym".to_string()),
        };
        assert_eq!(
            creator_key(&[partial], NameMode::Initials).unwrap(),
            "Mononym"
        );
        assert_eq!(creator_key(&[], NameMode::Surname), None);
    }

    #[test]
    fn test_format_creator_name_template() {
        let creator = person(CreatorRole::Author, "Jean Michel", "Basquiat");
        assert_eq!(
            format_creator_name(&creator, "{{firstName}} {{lastName}}"),
            "Jean Michel Basquiat"
        );
        assert_eq!(
            format_creator_name(&creator, "{{lastName}}, {{firstNameInitials}}"),
            "Basquiat, J.M."
        );
    }

    #[test]
    fn test_format_creator_name_missing_first() {
        let creator = Creator {
            creator_type: CreatorRole::Author,
            name: None,
            first_name: None,
            last_name: Some("Plato".to_string()),
        };
        assert_eq!(
            format_creator_name(&creator, "{{lastName}}, {{firstName}}"),
            "Plato"
        );
    }

    #[test]
    fn test_render_creator_list_placeholder_forms() {
        let creators = vec![
            person(CreatorRole::Author, "Ada", "Lovelace"),
            person(CreatorRole::Author, "Alan", "Turing"),
        ];
        let note = "author:: [[{{author}}]]\nplain:: {{author}}";
        let rendered = render_creator_list(
            &creators,
            CreatorRole::Author,
            note,
            ";",
            "{{firstName}} {{lastName}}",
        );
        assert!(rendered.contains("[[Ada Lovelace]]; [[Alan Turing]]"));
        assert!(rendered.contains("plain:: Ada Lovelace; Alan Turing"));
    }

    #[test]
    fn test_list_untouched_without_matching_role() {
        let creators = vec![person(CreatorRole::Author, "Ada", "Lovelace")];
        let note = "editor:: {{editor}}";
        let rendered = render_creator_list(
            &creators,
            CreatorRole::Editor,
            note,
            ",",
            "{{firstName}} {{lastName}}",
        );
        assert_eq!(rendered, note);
    }
}
