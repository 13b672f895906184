// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize free text before segmentation.
///
/// Lower-cases, applies canonical decomposition (NFD) and drops combining marks,
/// then collapses whitespace runs to a single space and trims both ends.
/// The result is a fixed point: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(stripped.len());
    for word in stripped.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Café  ", "cafe")]
    #[case("  He   is\tNOT\nbreathing ", "he is not breathing")]
    #[case("Ñandú", "nandu")]
    #[case("ÉTOUFFEMENT", "etouffement")]
    #[case("", "")]
    #[case(" \t\n ", "")]
    #[case("crème\u{00A0}brûlée", "creme brulee")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_case_and_accent_insensitive() {
        assert_eq!(normalize("Café  "), normalize("cafe"));
        assert_eq!(normalize("SEIZURE"), normalize("seizure"));
    }

    #[rstest]
    #[case("Café  au   LAIT")]
    #[case("İstanbul")]
    #[case("Ǆemal Ω ﬁ")]
    #[case("a\u{0301}\u{0301} b")]
    fn test_idempotent(#[case] input: &str) {
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }
}
