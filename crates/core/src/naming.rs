//! Operation identifier derivation.
//!
//! Friendly names are what users see; operation identifiers are what other
//! operations (and generated clients) reference. The identifier is derived
//! from the friendly name so both stay in sync.

/// Derive an operation identifier from a friendly name.
///
/// - A name without whitespace is used verbatim: `"Ping"` -> `"Ping"`
/// - Otherwise every word is title-cased and the words are joined:
///   `"Get All Invoices"` -> `"GetAllInvoices"`, `"list Items"` -> `"ListItems"`
/// - Words written entirely in uppercase are treated as acronyms and kept:
///   `"Get HTTP status"` -> `"GetHTTPStatus"`
pub fn operation_id(friendly_name: &str) -> String {
    if !friendly_name.chars().any(char::is_whitespace) {
        return friendly_name.to_string();
    }

    friendly_name
        .split_whitespace()
        .map(title_case_word)
        .collect()
}

fn title_case_word(word: &str) -> String {
    if is_acronym(word) {
        return word.to_string();
    }
    let mut chars = word.chars();
    let mut result = String::with_capacity(word.len());
    if let Some(first) = chars.next() {
        result.extend(first.to_uppercase());
        result.extend(chars.flat_map(char::to_lowercase));
    }
    result
}

fn is_acronym(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && word
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_is_verbatim() {
        assert_eq!(operation_id("Ping"), "Ping");
        assert_eq!(operation_id("listItems"), "listItems");
    }

    #[test]
    fn test_words_are_title_cased_and_joined() {
        assert_eq!(operation_id("Get All Invoices"), "GetAllInvoices");
        assert_eq!(operation_id("list Items"), "ListItems");
        assert_eq!(operation_id("get aLL invoices"), "GetAllInvoices");
    }

    #[test]
    fn test_any_whitespace_separates_words() {
        assert_eq!(operation_id("new\titem  created"), "NewItemCreated");
        assert_eq!(operation_id(" leading space"), "LeadingSpace");
    }

    #[test]
    fn test_acronyms_are_kept() {
        assert_eq!(operation_id("Get HTTP status"), "GetHTTPStatus");
        assert_eq!(operation_id("read v2 API"), "ReadV2API");
    }
}
