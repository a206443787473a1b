//! Token case translation between wire names and accessor names.
//!
//! The API returns camelCase / PascalCase field names (`itemName`,
//! `ShopOfTheYearFlag`); accessors and query options use snake_case.

use heck::ToSnakeCase;

/// Convert a camelCase or PascalCase token to lower_snake_case.
///
/// A token without ASCII uppercase letters is returned unchanged, so snake
/// input and malformed input (`item-name`, `_id`, `item__name`) pass through.
pub fn to_snake(token: &str) -> String {
    if !token.bytes().any(|b| b.is_ascii_uppercase()) {
        return token.to_string();
    }
    token.to_snake_case()
}

/// Convert a snake_case token to camelCase.
///
/// Each `_` followed by an ASCII letter is dropped and the letter is
/// uppercased. Everything else passes through untouched, so camelCase input
/// is returned as is.
pub fn to_camel(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
                chars.next();
                out.push(next.to_ascii_uppercase());
                continue;
            }
        }
        out.push(c);
    }

    out
}
