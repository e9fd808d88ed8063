//! Allow-list string sanitisation.
//!
//! [`sanitise_string`] deletes every character outside a configured
//! allow-set, then applies a fixed pipeline of optional transforms:
//! quote normalisation, case folding, reversal, and finally length
//! truncation. There are no error conditions; input that is empty or
//! entirely filtered out yields the empty string.

/// Quote variants collapsed to an ASCII apostrophe.
///
/// Covers the right single quotation mark, the prime, and the
/// backtick. The multiplication and division signs sitting inside the
/// Latin-1 letter block are deliberately not part of any allowed
/// range.
const QUOTE_VARIANTS: [char; 3] = ['\u{2019}', '\u{2032}', '`'];

/// One member of an allow-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowItem {
    /// A single allowed character.
    Char(char),
    /// An inclusive range of allowed characters.
    Range(char, char),
}

impl AllowItem {
    /// Whether `c` is covered by this item.
    pub fn contains(&self, c: char) -> bool {
        match *self {
            Self::Char(allowed) => c == allowed,
            Self::Range(start, end) => (start..=end).contains(&c),
        }
    }
}

/// The set of characters a sanitiser run keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowSet {
    items: Vec<AllowItem>,
}

impl AllowSet {
    /// Build a set from explicit items.
    pub fn new(items: Vec<AllowItem>) -> Self {
        Self { items }
    }

    /// Whether `c` is allowed.
    pub fn contains(&self, c: char) -> bool {
        self.items.iter().any(|item| item.contains(c))
    }

    /// The items making up this set.
    pub fn items(&self) -> &[AllowItem] {
        &self.items
    }
}

/// Configuration for [`sanitise_string`].
///
/// The `allow_*` flags select the character classes that survive
/// filtering; the `perform_*` flags and the remaining fields drive the
/// transform pipeline. When several case transforms are set, each one
/// overwrites the previous, so the last one in pipeline order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitiseOptions {
    /// Keep ASCII digits.
    pub allow_numbers: bool,
    /// Keep letters; the three flags below choose which ones.
    pub allow_letters: bool,
    /// With letters, keep `a-z`.
    pub allow_lower: bool,
    /// With letters, keep `A-Z`.
    pub allow_upper: bool,
    /// Keep the space character.
    pub allow_space: bool,
    /// With letters, keep the Latin-1 letter ranges.
    ///
    /// Also re-admits `A-Z`, so accented text keeps its capitals even
    /// when [`allow_upper`](Self::allow_upper) is off.
    pub allow_accented: bool,
    /// Keep the apostrophe and the quote variants it absorbs.
    pub allow_single_quotes: bool,
    /// Keep `-`.
    pub allow_hyphen: bool,
    /// Keep `_`.
    pub allow_underscore: bool,
    /// Keep `@`.
    pub allow_at_symbol: bool,
    /// Extra characters kept verbatim.
    pub additional: Vec<char>,
    /// Replace quote variants with an ASCII apostrophe.
    pub normalise_single_quotes: bool,
    /// Lowercase the filtered string.
    pub perform_lower: bool,
    /// Uppercase the filtered string.
    pub perform_upper: bool,
    /// Title-case the filtered string.
    pub perform_title: bool,
    /// Reverse the character order.
    pub reverse: bool,
    /// Maximum output length in characters; truncation keeps the
    /// prefix and always runs last.
    pub max_length: usize,
}

impl Default for SanitiseOptions {
    fn default() -> Self {
        Self {
            allow_numbers: true,
            allow_letters: true,
            allow_lower: true,
            allow_upper: true,
            allow_space: true,
            allow_accented: true,
            allow_single_quotes: true,
            allow_hyphen: true,
            allow_underscore: false,
            allow_at_symbol: false,
            additional: Vec::new(),
            normalise_single_quotes: true,
            perform_lower: false,
            perform_upper: false,
            perform_title: false,
            reverse: false,
            max_length: 200,
        }
    }
}

impl SanitiseOptions {
    /// Build the allow-set these options describe.
    pub fn allow_set(&self) -> AllowSet {
        let mut items = Vec::new();
        if self.allow_numbers {
            items.push(AllowItem::Range('0', '9'));
        }
        if self.allow_letters {
            if self.allow_lower {
                items.push(AllowItem::Range('a', 'z'));
            }
            if self.allow_upper {
                items.push(AllowItem::Range('A', 'Z'));
            }
            if self.allow_accented {
                items.push(AllowItem::Range('A', 'Z'));
                items.push(AllowItem::Range('\u{C0}', '\u{D6}'));
                items.push(AllowItem::Range('\u{D8}', '\u{F6}'));
                items.push(AllowItem::Range('\u{F8}', '\u{FF}'));
            }
        }
        if self.allow_single_quotes {
            items.push(AllowItem::Char('\''));
            for quote in QUOTE_VARIANTS {
                items.push(AllowItem::Char(quote));
            }
        }
        if self.allow_space {
            items.push(AllowItem::Char(' '));
        }
        if self.allow_hyphen {
            items.push(AllowItem::Char('-'));
        }
        if self.allow_underscore {
            items.push(AllowItem::Char('_'));
        }
        if self.allow_at_symbol {
            items.push(AllowItem::Char('@'));
        }
        items.extend(self.additional.iter().copied().map(AllowItem::Char));
        AllowSet::new(items)
    }
}

/// Filter `input` down to the allowed characters and apply the
/// configured transforms.
pub fn sanitise_string(input: &str, options: &SanitiseOptions) -> String {
    let allow = options.allow_set();
    let mut out: String = input.chars().filter(|&c| allow.contains(c)).collect();

    if options.normalise_single_quotes {
        out = out
            .chars()
            .map(|c| if QUOTE_VARIANTS.contains(&c) { '\'' } else { c })
            .collect();
    }
    if options.perform_lower {
        out = out.to_lowercase();
    }
    if options.perform_upper {
        out = out.to_uppercase();
    }
    if options.perform_title {
        out = title_case(&out);
    }
    if options.reverse {
        out = out.chars().rev().collect();
    }
    if let Some((idx, _)) = out.char_indices().nth(options.max_length) {
        out.truncate(idx);
    }
    out
}

/// Uppercase the first letter of every cased run and lowercase the
/// rest, treating any uncased character as a word boundary.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_cased = false;
    for c in input.chars() {
        let cased = c.is_lowercase() || c.is_uppercase();
        if cased && !prev_cased {
            out.extend(c.to_uppercase());
        } else if cased {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }
    out
}
