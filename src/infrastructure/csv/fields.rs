// ============================================================
// FIELD NORMALIZER
// ============================================================
// Canonical "1. ...\n2. ..." shape for Steps and Preconditions cells

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static STEP_MARKER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\s").unwrap());

static LEADING_BULLET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•·])?\s*").unwrap());

static LEADING_NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Steps,
    /// Also splits on `;` and drops repeated items.
    Preconditions,
}

/// Idempotent: `normalize_field(k, &normalize_field(k, x)) == normalize_field(k, x)`.
pub fn normalize_field(kind: FieldKind, value: &str) -> String {
    let text = value.replace("\\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let mut items: Vec<String> = Vec::new();
    for line in text.lines() {
        let pieces: Vec<&str> = match kind {
            FieldKind::Steps => vec![line],
            FieldKind::Preconditions => line.split(';').collect(),
        };

        for piece in pieces {
            for fragment in split_at_step_markers(piece.trim()) {
                let cleaned = strip_marker(fragment);
                if !cleaned.is_empty() {
                    items.push(cleaned.to_string());
                }
            }
        }
    }

    if kind == FieldKind::Preconditions {
        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.clone()));
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("{}. {}", idx + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn normalize_steps(value: &str) -> String {
    normalize_field(FieldKind::Steps, value)
}

pub fn normalize_preconditions(value: &str) -> String {
    normalize_field(FieldKind::Preconditions, value)
}

/// Splits before every "N. " marker so steps crammed on one line come apart.
fn split_at_step_markers(line: &str) -> Vec<&str> {
    let mut cuts: Vec<usize> = STEP_MARKER_PATTERN
        .find_iter(line)
        .map(|m| m.start())
        .filter(|&start| start > 0)
        .collect();
    if cuts.is_empty() {
        return vec![line];
    }
    cuts.push(line.len());

    let mut fragments = Vec::with_capacity(cuts.len());
    let mut begin = 0;
    for cut in cuts {
        fragments.push(&line[begin..cut]);
        begin = cut;
    }
    fragments
}

fn strip_marker(fragment: &str) -> &str {
    let fragment = fragment.trim();
    let without_bullet = match LEADING_BULLET_PATTERN.find(fragment) {
        Some(m) => &fragment[m.end()..],
        None => fragment,
    };
    let without_number = match LEADING_NUMBER_PATTERN.find(without_bullet) {
        Some(m) => &without_bullet[m.end()..],
        None => without_bullet,
    };
    without_number.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_crammed_on_one_line() {
        assert_eq!(
            normalize_steps("1. Open app 2. Click login\n3. Submit"),
            "1. Open app\n2. Click login\n3. Submit"
        );
    }

    #[test]
    fn test_escaped_newlines_and_bullets() {
        assert_eq!(
            normalize_steps(r"- Open app\n* Type user\n• Submit"),
            "1. Open app\n2. Type user\n3. Submit"
        );
    }

    #[test]
    fn test_renumbers_out_of_order_steps() {
        assert_eq!(normalize_steps("3. A\n7. B"), "1. A\n2. B");
    }

    #[test]
    fn test_multi_digit_marker_is_one_cut() {
        assert_eq!(normalize_steps("10. Open 11. Close"), "1. Open\n2. Close");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_steps("   "), "");
        assert_eq!(normalize_preconditions(r"\n"), "");
    }

    #[test]
    fn test_preconditions_dedup_keeps_first_seen_order() {
        assert_eq!(normalize_preconditions("A\nB\nA\nC"), "1. A\n2. B\n3. C");
        assert_eq!(normalize_preconditions("A; B; A; C"), "1. A\n2. B\n3. C");
    }

    #[test]
    fn test_steps_keep_duplicates() {
        assert_eq!(normalize_steps("Click\nClick"), "1. Click\n2. Click");
    }

    #[test]
    fn test_idempotent_on_samples() {
        let samples = [
            "1. Open app 2. Click login\n3. Submit",
            "Enter value 3. Then click",
            "- 3. foo",
            "1.  2. x",
            "Saldo mayor a 5. Cliente activo; Sesión iniciada",
            "• Paso uno\\n• Paso dos",
            "A; B; A",
            "12. Twelve 13. Thirteen",
            "Versión 2.0. Desplegada",
        ];
        for sample in samples {
            for kind in [FieldKind::Steps, FieldKind::Preconditions] {
                let once = normalize_field(kind, sample);
                let twice = normalize_field(kind, &once);
                assert_eq!(once, twice, "not idempotent for {:?} on {:?}", kind, sample);
            }
        }
    }
}
